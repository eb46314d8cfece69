// ============================================================================
// Interfaces Module
// Contains all trait definitions and contracts
// ============================================================================

mod event_handler;
mod period_pairing;

pub use event_handler::{
    LoggingEventHandler, NoOpEventHandler, RecordingEventHandler, SettlementEvent,
    SettlementEventHandler,
};
pub use period_pairing::{DemandPeriods, PeriodPairing};
