// ============================================================================
// Domain Models Module
// Contains all core domain entities and value objects
// ============================================================================

pub mod allocation;
pub mod config;
pub mod keys;
#[cfg(feature = "serde")]
pub mod migration;
pub mod period;
pub mod shareholding;
pub mod units;

pub use allocation::{
    AllocationKind, AllocationRecord, BankingAllocationRecord, BankingUsage, LapseAllocationRecord,
};
pub use config::{ConsumerSelection, ManualOverride, PeriodPairingKind, SettlementConfig};
pub use keys::{CompanyId, CompositeKey, MonthKey, SiteId};
pub use period::{Period, PeriodQuantities};
pub use shareholding::{apply_share, ShareMap, ShareholdingRecord, ShareholdingTable};
pub use units::{BankedBalance, BankingScope, ConsumptionUnit, ProducerGroup, ProducerKind, ProductionUnit};
