// ============================================================================
// Event Handler Interface
// Defines the contract for handling settlement and edit events
// ============================================================================

use crate::domain::{MonthKey, Period, SiteId};
use crate::numeric::Quantity;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Events emitted by the settlement and reconciliation engines
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SettlementEvent {
    /// Settlement run started
    RunStarted {
        run_id: Uuid,
        month: MonthKey,
        timestamp: DateTime<Utc>,
    },

    /// Production matched to a consumer
    Matched {
        run_id: Uuid,
        production_site: SiteId,
        consumption_site: SiteId,
        supply_period: Period,
        demand_period: Period,
        matched: Quantity,
        credited: Quantity,
    },

    /// Manual override could not be honoured in full
    OverrideClamped {
        run_id: Uuid,
        production_site: SiteId,
        consumption_site: SiteId,
        period: Period,
        requested: Quantity,
        applied: Quantity,
    },

    /// Producer leftover deferred to the bank
    Banked {
        run_id: Uuid,
        production_site: SiteId,
        period: Period,
        quantity: Quantity,
    },

    /// Producer leftover forfeited
    Lapsed {
        run_id: Uuid,
        production_site: SiteId,
        period: Period,
        quantity: Quantity,
    },

    /// Consumer drew from a banked balance
    BankDrawn {
        run_id: Uuid,
        banked_site: SiteId,
        consumption_site: SiteId,
        period: Period,
        drawn: Quantity,
        credited: Quantity,
    },

    /// Consumer demand left unmatched at run end
    DemandUnmatched {
        run_id: Uuid,
        consumption_site: SiteId,
        period: Period,
        remaining: Quantity,
    },

    /// Settlement run finished
    RunCompleted {
        run_id: Uuid,
        month: MonthKey,
        allocations: usize,
        timestamp: DateTime<Utc>,
    },

    /// Allocation edit accepted and reconciled
    EditAccepted {
        production_site: SiteId,
        consumption_site: SiteId,
        month: MonthKey,
        version: u32,
        timestamp: DateTime<Utc>,
    },

    /// Allocation edit rejected, prior state unchanged
    EditRejected {
        production_site: SiteId,
        consumption_site: SiteId,
        month: MonthKey,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// Event handler trait for processing settlement events
/// Implementations can handle logging, auditing, notifications, etc.
pub trait SettlementEventHandler: Send + Sync {
    /// Handle a settlement event
    fn on_event(&self, event: SettlementEvent);

    /// Batch event handler (optional optimization)
    fn on_events(&self, events: Vec<SettlementEvent>) {
        for event in events {
            self.on_event(event);
        }
    }
}

/// No-op event handler for testing
pub struct NoOpEventHandler;

impl SettlementEventHandler for NoOpEventHandler {
    fn on_event(&self, _event: SettlementEvent) {
        // Do nothing
    }
}

/// Logging event handler
pub struct LoggingEventHandler;

impl SettlementEventHandler for LoggingEventHandler {
    fn on_event(&self, event: SettlementEvent) {
        tracing::debug!("Settlement event: {:?}", event);
    }
}

/// Keeps every event in memory, in arrival order
#[derive(Default)]
pub struct RecordingEventHandler {
    events: Mutex<Vec<SettlementEvent>>,
}

impl RecordingEventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SettlementEvent> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl SettlementEventHandler for RecordingEventHandler {
    fn on_event(&self, event: SettlementEvent) {
        self.events.lock().push(event);
    }

    fn on_events(&self, events: Vec<SettlementEvent>) {
        self.events.lock().extend(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_handler() {
        let handler = NoOpEventHandler;
        handler.on_event(SettlementEvent::RunStarted {
            run_id: Uuid::new_v4(),
            month: "042024".parse().unwrap(),
            timestamp: Utc::now(),
        });
        // Should not panic
    }

    #[test]
    fn test_recording_handler_keeps_order() {
        let handler = RecordingEventHandler::new();
        let run_id = Uuid::new_v4();
        handler.on_events(vec![
            SettlementEvent::Lapsed {
                run_id,
                production_site: SiteId::from("A"),
                period: Period::P1,
                quantity: 40,
            },
            SettlementEvent::Banked {
                run_id,
                production_site: SiteId::from("B"),
                period: Period::P1,
                quantity: 10,
            },
        ]);

        let events = handler.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SettlementEvent::Lapsed { .. }));
        assert!(matches!(events[1], SettlementEvent::Banked { .. }));

        handler.clear();
        assert!(handler.is_empty());
    }
}
