// ============================================================================
// Allocation Domain Model
// Settlement output records: allocations, banking, lapse and bank usage
// ============================================================================

use super::keys::{CompanyId, MonthKey, SiteId};
use super::period::{Period, PeriodQuantities};
use crate::numeric::Quantity;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the adjustment of an allocation record applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AllocationKind {
    #[default]
    Normal,
    /// Adjustment is added on top of the allocation
    Injection,
    /// Adjustment is taken off the allocation
    Reduction,
}

/// Energy credited from one production site to one consumption site for a month
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AllocationRecord {
    pub production_site: SiteId,
    pub production_company: CompanyId,
    pub consumption_site: SiteId,
    pub consumption_company: CompanyId,
    pub month: MonthKey,

    /// Scaled quantity credited per period
    pub allocated: PeriodQuantities,

    /// At most one record per (production site, month) holds the charge
    pub charge: bool,

    pub kind: AllocationKind,

    /// Free-form per-period correction, interpreted through `kind`
    pub adjustment: Option<PeriodQuantities>,

    /// Incremented by every superseding edit
    pub version: u32,
}

impl AllocationRecord {
    pub fn new(
        production_site: SiteId,
        production_company: CompanyId,
        consumption_site: SiteId,
        consumption_company: CompanyId,
        month: MonthKey,
    ) -> Self {
        Self {
            production_site,
            production_company,
            consumption_site,
            consumption_company,
            month,
            allocated: PeriodQuantities::ZERO,
            charge: false,
            kind: AllocationKind::Normal,
            adjustment: None,
            version: 1,
        }
    }

    /// (production site, consumption site) identity within a month
    pub fn pair(&self) -> (&SiteId, &SiteId) {
        (&self.production_site, &self.consumption_site)
    }

    pub fn is_same_pair(&self, other: &AllocationRecord) -> bool {
        self.production_site == other.production_site
            && self.consumption_site == other.consumption_site
            && self.month == other.month
    }

    /// Allocation after the injection/reduction adjustment.
    ///
    /// Reductions never drive a period below zero.
    pub fn effective(&self) -> PeriodQuantities {
        let mut out = self.allocated;
        if let Some(adjustment) = &self.adjustment {
            for (period, value) in adjustment.iter() {
                match self.kind {
                    AllocationKind::Normal => {}
                    AllocationKind::Injection => out[period] += value,
                    AllocationKind::Reduction => out[period] = (out[period] - value).max(0),
                }
            }
        }
        out
    }

    /// New version of this record carrying different values.
    ///
    /// The previous version is left untouched.
    pub fn supersede(&self, allocated: PeriodQuantities, charge: bool) -> AllocationRecord {
        AllocationRecord {
            allocated,
            charge,
            version: self.version + 1,
            ..self.clone()
        }
    }

    /// Composite persistence key: `companyId_productionSiteId_consumptionSiteId`
    pub fn composite_key(&self) -> super::keys::CompositeKey {
        super::keys::CompositeKey::pair(
            self.consumption_company.clone(),
            self.production_site.clone(),
            self.consumption_site.clone(),
        )
    }
}

macro_rules! leftover_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name {
            pub production_site: SiteId,
            pub production_company: CompanyId,
            pub month: MonthKey,
            pub quantities: PeriodQuantities,
        }

        impl $name {
            pub fn new(production_site: SiteId, production_company: CompanyId, month: MonthKey) -> Self {
                Self {
                    production_site,
                    production_company,
                    month,
                    quantities: PeriodQuantities::ZERO,
                }
            }
        }
    };
}

leftover_record!(
    /// Unmatched production of a banking-enabled producer, deferred for later draw
    BankingAllocationRecord
);

leftover_record!(
    /// Unmatched production of a producer without banking, forfeited
    LapseAllocationRecord
);

/// One draw from a banked balance by a consumer.
///
/// `quantity` is negative: the entry reduces the bank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BankingUsage {
    pub banked_site: SiteId,
    pub consumption_site: SiteId,
    /// Period the banked energy was drawn from
    pub supply_period: Period,
    /// Period of demand it covered
    pub demand_period: Period,
    /// Scaled amount credited, negated
    pub quantity: Quantity,
    /// Physical amount removed from the bank
    pub drawn: Quantity,
}
