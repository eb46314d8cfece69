// ============================================================================
// Remaining-Capacity View
// Per-run scratch copy of production, demand and banked quantities
// ============================================================================

use crate::domain::{
    BankedBalance, BankingScope, CompanyId, ConsumptionUnit, MonthKey, Period, PeriodQuantities,
    ProducerGroup, ProducerKind, ProductionUnit, SiteId,
};
use crate::numeric::Quantity;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Anything carrying a per-period remaining quantity
pub trait HasRemaining {
    fn remaining(&self) -> &PeriodQuantities;

    /// True if any period still has a positive remaining quantity
    fn has_remaining(&self) -> bool {
        self.remaining().any_positive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RemainingProduction {
    pub site_id: SiteId,
    pub company_id: CompanyId,
    pub month: MonthKey,
    pub kind: ProducerKind,
    pub banking_enabled: bool,
    pub remaining: PeriodQuantities,
}

impl RemainingProduction {
    pub fn group(&self) -> ProducerGroup {
        ProducerGroup::of(self.kind, self.banking_enabled)
    }
}

impl From<&ProductionUnit> for RemainingProduction {
    fn from(unit: &ProductionUnit) -> Self {
        Self {
            site_id: unit.site_id.clone(),
            company_id: unit.company_id.clone(),
            month: unit.month,
            kind: unit.kind,
            banking_enabled: unit.banking_enabled,
            remaining: unit.quantities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RemainingConsumption {
    pub site_id: SiteId,
    pub site_name: String,
    pub company_id: CompanyId,
    pub month: MonthKey,
    pub remaining: PeriodQuantities,
}

impl From<&ConsumptionUnit> for RemainingConsumption {
    fn from(unit: &ConsumptionUnit) -> Self {
        Self {
            site_id: unit.site_id.clone(),
            site_name: unit.site_name.clone(),
            company_id: unit.company_id.clone(),
            month: unit.month,
            remaining: unit.quantities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RemainingBank {
    pub site_id: SiteId,
    pub company_id: CompanyId,
    pub scope: BankingScope,
    /// Whether the balance may be drawn in this run's month
    pub drawable: bool,
    pub remaining: PeriodQuantities,
}

impl RemainingBank {
    pub fn from_balance(balance: &BankedBalance, month: MonthKey) -> Self {
        Self {
            site_id: balance.site_id.clone(),
            company_id: balance.company_id.clone(),
            scope: balance.scope,
            drawable: balance.scope.covers(month),
            remaining: balance.quantities,
        }
    }
}

impl HasRemaining for RemainingProduction {
    fn remaining(&self) -> &PeriodQuantities {
        &self.remaining
    }
}

impl HasRemaining for RemainingConsumption {
    fn remaining(&self) -> &PeriodQuantities {
        &self.remaining
    }
}

impl HasRemaining for RemainingBank {
    fn remaining(&self) -> &PeriodQuantities {
        &self.remaining
    }
}

/// Free-function form of [`HasRemaining::has_remaining`]
pub fn has_remaining<U: HasRemaining>(unit: &U) -> bool {
    unit.has_remaining()
}

/// Remaining quantities of every unit in a run.
///
/// Consumed destructively during one settlement pass. After the pass it is
/// the residue report: unmatched demand, unspent banked balances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RemainingCapacityView {
    pub production: Vec<RemainingProduction>,
    pub consumption: Vec<RemainingConsumption>,
    pub banked: Vec<RemainingBank>,
}

impl RemainingCapacityView {
    pub fn new(
        production: &[ProductionUnit],
        consumption: &[&ConsumptionUnit],
        banked: &[BankedBalance],
        month: MonthKey,
    ) -> Self {
        Self {
            production: production.iter().map(RemainingProduction::from).collect(),
            consumption: consumption.iter().map(|c| RemainingConsumption::from(*c)).collect(),
            banked: banked
                .iter()
                .map(|b| RemainingBank::from_balance(b, month))
                .collect(),
        }
    }

    /// True if some consumer still needs energy in one of `periods`
    pub fn any_demand_in(&self, periods: &[Period]) -> bool {
        self.consumption
            .iter()
            .any(|c| periods.iter().any(|p| c.remaining[*p] > 0))
    }

    pub fn unmatched_consumers(&self) -> impl Iterator<Item = &RemainingConsumption> {
        self.consumption.iter().filter(|c| c.has_remaining())
    }

    pub fn unmatched_producers(&self) -> impl Iterator<Item = &RemainingProduction> {
        self.production.iter().filter(|p| p.has_remaining())
    }

    pub fn unmatched_demand(&self, period: Period) -> Quantity {
        self.consumption.iter().map(|c| c.remaining[period]).sum()
    }

    pub fn consumer(&self, site: &SiteId) -> Option<&RemainingConsumption> {
        self.consumption.iter().find(|c| &c.site_id == site)
    }

    pub fn bank(&self, site: &SiteId) -> Option<&RemainingBank> {
        self.banked.iter().find(|b| &b.site_id == site)
    }
}
