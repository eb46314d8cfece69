// ============================================================================
// Reconciliation Engine
// Banking and lapse adjustments for a hand-edited allocation
// ============================================================================

use super::deposit_ledger::{BankKey, DepositLedger};
use crate::domain::{AllocationRecord, MonthKey, Period, PeriodQuantities};
use crate::numeric::Quantity;
use smallvec::SmallVec;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One banking/lapse movement caused by an edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Adjustment {
    /// Positive delta banked as a new deposit
    Deposit {
        period: Period,
        quantity: Quantity,
        deposit_id: Uuid,
    },

    /// Part of an earlier deposit returned
    Unbank {
        period: Period,
        quantity: Quantity,
        deposit_id: Uuid,
        deposit_period: Period,
    },

    /// Return no deposit could cover, lapsed in the edited period
    Lapse { period: Period, quantity: Quantity },
}

impl Adjustment {
    pub fn period(&self) -> Period {
        match self {
            Adjustment::Deposit { period, .. }
            | Adjustment::Unbank { period, .. }
            | Adjustment::Lapse { period, .. } => *period,
        }
    }
}

/// All adjustments of one edit
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reconciliation {
    pub key: BankKey,
    pub month: MonthKey,
    pub adjustments: SmallVec<[Adjustment; 8]>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.adjustments.is_empty()
    }

    pub fn deposited(&self) -> Quantity {
        self.adjustments
            .iter()
            .map(|a| match a {
                Adjustment::Deposit { quantity, .. } => *quantity,
                _ => 0,
            })
            .sum()
    }

    pub fn unbanked(&self) -> Quantity {
        self.adjustments
            .iter()
            .map(|a| match a {
                Adjustment::Unbank { quantity, .. } => *quantity,
                _ => 0,
            })
            .sum()
    }

    pub fn lapsed(&self) -> PeriodQuantities {
        let mut out = PeriodQuantities::ZERO;
        for adjustment in &self.adjustments {
            if let Adjustment::Lapse { period, quantity } = adjustment {
                out[*period] += *quantity;
            }
        }
        out
    }
}

/// Reconcile an edited record against its previous version.
///
/// Never fails: a return larger than what was ever banked lapses the rest.
pub fn reconcile(
    previous: &AllocationRecord,
    edited: &AllocationRecord,
    ledger: &mut DepositLedger,
) -> Reconciliation {
    reconcile_quantities(
        BankKey::for_record(edited),
        edited.month,
        &previous.allocated,
        &edited.allocated,
        ledger,
    )
}

/// Per-period `delta = new - old`.
///
/// Negative deltas drain the pool oldest deposit first, splitting the last
/// one touched; any shortfall lapses in the edited period. Positive deltas
/// become deposits. Returns are settled against deposits that existed before
/// the edit, so one period of an edit never funds another.
pub fn reconcile_quantities(
    key: BankKey,
    month: MonthKey,
    old: &PeriodQuantities,
    new: &PeriodQuantities,
    ledger: &mut DepositLedger,
) -> Reconciliation {
    let delta = new.delta_from(old);
    let mut adjustments: SmallVec<[Adjustment; 8]> = SmallVec::new();

    for (period, change) in delta.iter().filter(|(_, d)| *d < 0) {
        let drain = ledger.drain_fifo(&key, -change);
        for piece in &drain.pieces {
            adjustments.push(Adjustment::Unbank {
                period,
                quantity: piece.quantity,
                deposit_id: piece.deposit_id,
                deposit_period: piece.deposit_period,
            });
        }
        if drain.shortfall > 0 {
            tracing::debug!(
                %key,
                %period,
                shortfall = drain.shortfall,
                "return exceeds banked deposits, lapsing remainder"
            );
            adjustments.push(Adjustment::Lapse {
                period,
                quantity: drain.shortfall,
            });
        }
    }

    for (period, change) in delta.iter().filter(|(_, d)| *d > 0) {
        if let Some(deposit_id) = ledger.deposit(&key, month, period, change) {
            adjustments.push(Adjustment::Deposit {
                period,
                quantity: change,
                deposit_id,
            });
        }
    }

    tracing::debug!(%key, %month, adjustments = adjustments.len(), "edit reconciled");

    Reconciliation {
        key,
        month,
        adjustments,
    }
}
