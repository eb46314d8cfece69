// ============================================================================
// Deposit Ledger
// FIFO pools of banked deposits created by allocation edits
// ============================================================================

use crate::domain::{AllocationRecord, CompanyId, MonthKey, Period, SiteId};
use crate::numeric::Quantity;
use parking_lot::{Mutex, MutexGuard};
use smallvec::SmallVec;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pool identity: (company, production site, consumption site)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BankKey {
    pub company: CompanyId,
    pub production_site: SiteId,
    pub consumption_site: SiteId,
}

impl BankKey {
    pub fn new(
        company: impl Into<CompanyId>,
        production_site: impl Into<SiteId>,
        consumption_site: impl Into<SiteId>,
    ) -> Self {
        Self {
            company: company.into(),
            production_site: production_site.into(),
            consumption_site: consumption_site.into(),
        }
    }

    pub fn for_record(record: &AllocationRecord) -> Self {
        Self {
            company: record.consumption_company.clone(),
            production_site: record.production_site.clone(),
            consumption_site: record.consumption_site.clone(),
        }
    }
}

impl fmt::Display for BankKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.company, self.production_site, self.consumption_site)
    }
}

/// One banked deposit, possibly partly drained
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Deposit {
    pub id: Uuid,
    /// Ledger-wide arrival order
    pub sequence: u64,
    pub month: MonthKey,
    pub period: Period,
    /// Still banked
    pub quantity: Quantity,
}

/// Part of a deposit taken by a drain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrainedPiece {
    pub deposit_id: Uuid,
    pub deposit_period: Period,
    pub quantity: Quantity,
}

/// Result of draining a pool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drain {
    pub pieces: SmallVec<[DrainedPiece; 4]>,
    /// Requested quantity no deposit could cover
    pub shortfall: Quantity,
}

impl Drain {
    pub fn drained(&self) -> Quantity {
        self.pieces.iter().map(|p| p.quantity).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DepositLedger {
    pools: BTreeMap<BankKey, VecDeque<Deposit>>,
    next_sequence: u64,
}

impl DepositLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a deposit to the back of its pool. Non-positive quantities are
    /// ignored and return `None`.
    pub fn deposit(
        &mut self,
        key: &BankKey,
        month: MonthKey,
        period: Period,
        quantity: Quantity,
    ) -> Option<Uuid> {
        if quantity <= 0 {
            return None;
        }
        let id = Uuid::new_v4();
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        self.pools.entry(key.clone()).or_default().push_back(Deposit {
            id,
            sequence,
            month,
            period,
            quantity,
        });
        Some(id)
    }

    /// Take up to `quantity` from the pool, oldest deposit first.
    ///
    /// The last deposit touched is split when only part of it is needed.
    pub fn drain_fifo(&mut self, key: &BankKey, quantity: Quantity) -> Drain {
        let mut drain = Drain::default();
        let mut outstanding = quantity.max(0);

        if let Some(pool) = self.pools.get_mut(key) {
            while outstanding > 0 {
                let Some(front) = pool.front_mut() else {
                    break;
                };
                let take = front.quantity.min(outstanding);
                front.quantity -= take;
                outstanding -= take;
                drain.pieces.push(DrainedPiece {
                    deposit_id: front.id,
                    deposit_period: front.period,
                    quantity: take,
                });
                if front.quantity == 0 {
                    pool.pop_front();
                }
            }
            if pool.is_empty() {
                self.pools.remove(key);
            }
        }

        drain.shortfall = outstanding;
        drain
    }

    /// Total still banked for a key
    pub fn balance(&self, key: &BankKey) -> Quantity {
        self.deposits(key).map(|d| d.quantity).sum()
    }

    pub fn deposits(&self, key: &BankKey) -> impl Iterator<Item = &Deposit> {
        self.pools.get(key).into_iter().flatten()
    }

    pub fn keys(&self) -> impl Iterator<Item = &BankKey> {
        self.pools.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

/// Deposit ledger shared between callers.
///
/// Every edit goes through the lock, so edits touching the same production
/// site never interleave.
#[derive(Debug, Clone, Default)]
pub struct SharedDepositLedger {
    inner: Arc<Mutex<DepositLedger>>,
}

impl SharedDepositLedger {
    pub fn new(ledger: DepositLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, DepositLedger> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the ledger
    pub fn with<R>(&self, f: impl FnOnce(&mut DepositLedger) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn snapshot(&self) -> DepositLedger {
        self.inner.lock().clone()
    }
}
