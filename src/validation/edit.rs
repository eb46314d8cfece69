// ============================================================================
// Edit Validation
// Charge uniqueness and minimum-allocation rules for allocation edits
// ============================================================================

use crate::domain::{AllocationRecord, PeriodQuantities, SiteId};
use crate::error::{InvalidInput, SettlementError, SettlementResult};

/// Reject `candidate` if it claims the charge while another record of the
/// same production site and month already holds it.
///
/// The candidate's own previous version (same pair) is ignored.
pub fn check_charge_uniqueness(
    records: &[AllocationRecord],
    candidate: &AllocationRecord,
) -> SettlementResult<()> {
    if !candidate.charge {
        return Ok(());
    }

    let holder = records.iter().find(|r| {
        r.charge
            && r.production_site == candidate.production_site
            && r.month == candidate.month
            && r.consumption_site != candidate.consumption_site
    });

    match holder {
        Some(holder) => Err(SettlementError::ChargeConflict {
            production_site: candidate.production_site.clone(),
            month: candidate.month,
            holder: holder.consumption_site.clone(),
        }),
        None => Ok(()),
    }
}

/// Outcome of the minimum-allocation rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimumAllocation {
    /// At least one period is positive, values kept as given
    Kept(PeriodQuantities),
    /// No period was positive, every period forced to zero
    Zeroed,
}

impl MinimumAllocation {
    pub fn quantities(&self) -> PeriodQuantities {
        match self {
            MinimumAllocation::Kept(q) => *q,
            MinimumAllocation::Zeroed => PeriodQuantities::ZERO,
        }
    }

    pub fn is_zeroed(&self) -> bool {
        matches!(self, MinimumAllocation::Zeroed)
    }
}

/// An edited allocation needs at least one period strictly above zero;
/// otherwise the whole record is zeroed rather than left partially cleared.
pub fn apply_minimum_allocation(quantities: PeriodQuantities) -> MinimumAllocation {
    if quantities.any_positive() {
        MinimumAllocation::Kept(quantities)
    } else {
        MinimumAllocation::Zeroed
    }
}

/// Edited values must not be negative
pub fn check_non_negative(site: &SiteId, quantities: &PeriodQuantities) -> Result<(), InvalidInput> {
    match quantities.first_negative() {
        Some((period, value)) => Err(InvalidInput::NegativeQuantity {
            record: "allocation edit",
            site: site.clone(),
            period,
            value,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompanyId, MonthKey};

    fn record(production: &str, consumption: &str, charge: bool) -> AllocationRecord {
        let month: MonthKey = "072024".parse().unwrap();
        let mut r = AllocationRecord::new(
            SiteId::from(production),
            CompanyId::from("GCO"),
            SiteId::from(consumption),
            CompanyId::from("CCO"),
            month,
        );
        r.charge = charge;
        r
    }

    #[test]
    fn test_second_charge_rejected() {
        let existing = vec![record("GEN", "C1", true), record("GEN", "C2", false)];
        let candidate = record("GEN", "C2", true);

        let err = check_charge_uniqueness(&existing, &candidate).unwrap_err();
        assert!(matches!(
            err,
            SettlementError::ChargeConflict { ref holder, .. } if holder.as_str() == "C1"
        ));
    }

    #[test]
    fn test_recharging_own_record_allowed() {
        let existing = vec![record("GEN", "C1", true)];
        assert!(check_charge_uniqueness(&existing, &record("GEN", "C1", true)).is_ok());
    }

    #[test]
    fn test_other_production_site_does_not_conflict() {
        let existing = vec![record("GEN-A", "C1", true)];
        assert!(check_charge_uniqueness(&existing, &record("GEN-B", "C1", true)).is_ok());
    }

    #[test]
    fn test_uncharged_candidate_always_ok() {
        let existing = vec![record("GEN", "C1", true)];
        assert!(check_charge_uniqueness(&existing, &record("GEN", "C2", false)).is_ok());
    }

    #[test]
    fn test_minimum_allocation() {
        let kept = apply_minimum_allocation(PeriodQuantities::new([0, 0, 3, 0, 0]));
        assert!(!kept.is_zeroed());
        assert_eq!(kept.quantities()[crate::domain::Period::P3], 3);

        let zeroed = apply_minimum_allocation(PeriodQuantities::new([0, -4, 0, 0, 0]));
        assert!(zeroed.is_zeroed());
        assert_eq!(zeroed.quantities(), PeriodQuantities::ZERO);
    }

    #[test]
    fn test_non_negative() {
        let site = SiteId::from("C1");
        assert!(check_non_negative(&site, &PeriodQuantities::new([1, 0, 0, 0, 0])).is_ok());
        assert!(check_non_negative(&site, &PeriodQuantities::new([1, -1, 0, 0, 0])).is_err());
    }
}
