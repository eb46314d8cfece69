// ============================================================================
// Engine Module
// Settlement runs, edit reconciliation and the deposit ledger
// ============================================================================

mod deposit_ledger;
mod edit_book;
mod pairing;
mod reconciliation;
mod remaining;
mod settlement_engine;

pub mod factory;

pub use deposit_ledger::{BankKey, Deposit, DepositLedger, Drain, DrainedPiece, SharedDepositLedger};
pub use edit_book::{AllocationBook, AllocationEdit, EditOutcome};
pub use factory::{create_from_config, SettlementEngineBuilder};
pub use pairing::{create_pairing, PeakSubstitution, SamePeriod};
pub use reconciliation::{reconcile, reconcile_quantities, Adjustment, Reconciliation};
pub use remaining::{
    has_remaining, HasRemaining, RemainingBank, RemainingCapacityView, RemainingConsumption,
    RemainingProduction,
};
pub use settlement_engine::{SettlementEngine, SettlementInput, SettlementOutcome};
