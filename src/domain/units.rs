// ============================================================================
// Production, Consumption and Banked Units
// Monthly snapshots fed into a settlement run
// ============================================================================

use super::keys::{CompanyId, MonthKey, SiteId};
use super::period::PeriodQuantities;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum ProducerKind {
    Solar,
    Wind,
}

/// Matching precedence of a producer.
///
/// Solar first, then wind without banking, then bankable wind. Bankable wind
/// goes last because its unmatched residue is banked rather than lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProducerGroup {
    Solar,
    Wind,
    BankableWind,
}

impl ProducerGroup {
    pub const PRECEDENCE: [ProducerGroup; 3] =
        [ProducerGroup::Solar, ProducerGroup::Wind, ProducerGroup::BankableWind];

    pub fn of(kind: ProducerKind, banking_enabled: bool) -> Self {
        match (kind, banking_enabled) {
            (ProducerKind::Solar, _) => ProducerGroup::Solar,
            (ProducerKind::Wind, false) => ProducerGroup::Wind,
            (ProducerKind::Wind, true) => ProducerGroup::BankableWind,
        }
    }
}

/// Monthly production snapshot of one site
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProductionUnit {
    pub site_id: SiteId,
    pub company_id: CompanyId,
    pub month: MonthKey,
    pub kind: ProducerKind,
    pub banking_enabled: bool,
    pub quantities: PeriodQuantities,
}

impl ProductionUnit {
    pub fn new(
        site_id: impl Into<SiteId>,
        company_id: impl Into<CompanyId>,
        month: MonthKey,
        kind: ProducerKind,
        banking_enabled: bool,
        quantities: impl Into<PeriodQuantities>,
    ) -> Self {
        Self {
            site_id: site_id.into(),
            company_id: company_id.into(),
            month,
            kind,
            banking_enabled,
            quantities: quantities.into(),
        }
    }

    pub fn group(&self) -> ProducerGroup {
        ProducerGroup::of(self.kind, self.banking_enabled)
    }
}

/// Monthly demand snapshot of one consuming site
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConsumptionUnit {
    pub site_id: SiteId,
    /// Display name, used to break priority ties
    pub site_name: String,
    pub company_id: CompanyId,
    pub month: MonthKey,
    pub quantities: PeriodQuantities,
}

impl ConsumptionUnit {
    pub fn new(
        site_id: impl Into<SiteId>,
        site_name: impl Into<String>,
        company_id: impl Into<CompanyId>,
        month: MonthKey,
        quantities: impl Into<PeriodQuantities>,
    ) -> Self {
        Self {
            site_id: site_id.into(),
            site_name: site_name.into(),
            company_id: company_id.into(),
            month,
            quantities: quantities.into(),
        }
    }
}

/// Window a banked balance was accumulated over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BankingScope {
    Month(MonthKey),
    /// Running balance for the April–March year starting in the given year
    FinancialYear(i32),
}

impl BankingScope {
    /// Whether a balance in this scope may be drawn during `month`
    pub fn covers(&self, month: MonthKey) -> bool {
        match self {
            // Prior months only
            BankingScope::Month(m) => *m < month,
            BankingScope::FinancialYear(fy) => month.financial_year() == *fy,
        }
    }
}

/// Previously deferred surplus of a production site, available for draw
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BankedBalance {
    pub site_id: SiteId,
    /// Owner of the banked site, drives the shareholding scale of draws
    pub company_id: CompanyId,
    pub scope: BankingScope,
    pub quantities: PeriodQuantities,
}

impl BankedBalance {
    pub fn new(
        site_id: impl Into<SiteId>,
        company_id: impl Into<CompanyId>,
        scope: BankingScope,
        quantities: impl Into<PeriodQuantities>,
    ) -> Self {
        Self {
            site_id: site_id.into(),
            company_id: company_id.into(),
            scope,
            quantities: quantities.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn month(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    #[test]
    fn test_producer_group_precedence() {
        let m = month("052024");
        let solar = ProductionUnit::new("S", "C", m, ProducerKind::Solar, true, [0; 5]);
        let wind = ProductionUnit::new("W", "C", m, ProducerKind::Wind, false, [0; 5]);
        let banked_wind = ProductionUnit::new("B", "C", m, ProducerKind::Wind, true, [0; 5]);

        // Solar with banking is still served first
        assert_eq!(solar.group(), ProducerGroup::Solar);
        assert_eq!(wind.group(), ProducerGroup::Wind);
        assert_eq!(banked_wind.group(), ProducerGroup::BankableWind);
        assert!(ProducerGroup::Solar < ProducerGroup::Wind);
        assert!(ProducerGroup::Wind < ProducerGroup::BankableWind);
    }

    #[test]
    fn test_banking_scope_coverage() {
        let fy = BankingScope::FinancialYear(2024);
        assert!(fy.covers(month("042024")));
        assert!(fy.covers(month("032025")));
        assert!(!fy.covers(month("042025")));

        let single = BankingScope::Month(month("052024"));
        assert!(single.covers(month("062024")));
        assert!(!single.covers(month("052024")));
    }
}
