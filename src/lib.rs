// ============================================================================
// Energy Settlement Library
// Monthly allocation of renewable production to captive consumers, with
// banking, lapse and edit reconciliation
// ============================================================================

//! # Energy Settlement
//!
//! Settles a month of metered renewable production against the demand of
//! consuming sites, five time-of-day periods at a time.
//!
//! ## Features
//!
//! - **Deterministic greedy matching**: peak periods first, solar before
//!   wind before bankable wind, consumers in configured priority order
//! - **Shareholding scaling** of every credited quantity
//! - **Banking and lapse** of producer leftovers, draws from banked balances
//! - **Edit reconciliation**: FIFO unbanking of hand-edited allocations
//! - **Pluggable period pairing** and event handlers
//!
//! ## Example
//!
//! ```rust
//! use energy_settlement::prelude::*;
//! use std::sync::Arc;
//!
//! let month: MonthKey = "042024".parse().unwrap();
//! let engine = SettlementEngineBuilder::new("tn-captive")
//!     .build(Arc::new(NoOpEventHandler))
//!     .unwrap();
//!
//! let input = SettlementInput::new(month)
//!     .with_production(ProductionUnit::new(
//!         "GEN-A", "GCO", month, ProducerKind::Solar, false, [100, 50, 50, 100, 100],
//!     ))
//!     .with_consumption(ConsumptionUnit::new("CON-X", "Spinning mill", "CCO", month, [60, 60, 0, 0, 0]));
//!
//! let outcome = engine.settle(&input).unwrap();
//! let credited = outcome.allocation("GEN-A", "CON-X").unwrap();
//! assert_eq!(credited.allocated[Period::P1], 60);
//! assert_eq!(credited.allocated[Period::P2], 50);
//! assert_eq!(outcome.residual.unmatched_demand(Period::P2), 10);
//! ```

pub mod domain;
pub mod engine;
pub mod error;
pub mod interfaces;
pub mod numeric;
#[cfg(feature = "logging")]
pub mod telemetry;
pub mod validation;

// Re-exports for convenience
pub mod prelude {
    pub use crate::domain::{
        AllocationKind, AllocationRecord, BankedBalance, BankingAllocationRecord, BankingScope,
        BankingUsage, CompanyId, CompositeKey, ConsumerSelection, ConsumptionUnit,
        LapseAllocationRecord, ManualOverride, MonthKey, Period, PeriodPairingKind,
        PeriodQuantities, ProducerKind, ProductionUnit, SettlementConfig, ShareholdingRecord,
        SiteId,
    };
    pub use crate::engine::{
        create_from_config, AllocationBook, AllocationEdit, BankKey, DepositLedger, EditOutcome,
        Reconciliation, SettlementEngine, SettlementEngineBuilder, SettlementInput,
        SettlementOutcome, SharedDepositLedger,
    };
    pub use crate::error::{InvalidInput, SettlementError, SettlementResult};
    pub use crate::interfaces::{
        LoggingEventHandler, NoOpEventHandler, PeriodPairing, RecordingEventHandler,
        SettlementEvent, SettlementEventHandler,
    };
    pub use crate::numeric::{Percentage, Quantity};
}
