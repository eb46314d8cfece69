// ============================================================================
// Period Pairing Strategies
// ============================================================================

use crate::domain::{Period, PeriodPairingKind};
use crate::interfaces::{DemandPeriods, PeriodPairing};
use smallvec::smallvec;

/// Supply meets demand of the same period only.
///
/// Peak matches peak and non-peak matches non-peak; this is how monthly
/// settlements are run today.
pub struct SamePeriod;

impl PeriodPairing for SamePeriod {
    fn candidate_periods(&self, supply: Period) -> DemandPeriods {
        smallvec![supply]
    }

    fn name(&self) -> &str {
        "SamePeriod"
    }
}

/// Same period first, then every other compatible demand period.
///
/// Peak supply spills over to the other peak period, then to non-peak
/// periods. Non-peak supply spills over to other non-peak periods only.
///
/// # Example
/// ```text
/// supply P2 -> demand P2, P3, P1, P4, P5
/// supply P4 -> demand P4, P1, P5
/// ```
pub struct PeakSubstitution;

impl PeriodPairing for PeakSubstitution {
    fn candidate_periods(&self, supply: Period) -> DemandPeriods {
        let mut periods: DemandPeriods = smallvec![supply];
        periods.extend(
            Period::SETTLEMENT_ORDER
                .iter()
                .copied()
                .filter(|p| *p != supply && Period::is_compatible(supply, *p)),
        );
        periods
    }

    fn name(&self) -> &str {
        "PeakSubstitution"
    }
}

/// Creates the pairing strategy for a configured kind
pub fn create_pairing(kind: PeriodPairingKind) -> Box<dyn PeriodPairing> {
    match kind {
        PeriodPairingKind::SamePeriod => Box::new(SamePeriod),
        PeriodPairingKind::PeakSubstitution => Box::new(PeakSubstitution),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deliberately offers everything, to check the compatibility filter
    struct Everything;

    impl PeriodPairing for Everything {
        fn candidate_periods(&self, _supply: Period) -> DemandPeriods {
            Period::ALL.iter().copied().collect()
        }

        fn name(&self) -> &str {
            "Everything"
        }
    }

    #[test]
    fn test_same_period() {
        for p in Period::ALL {
            assert_eq!(SamePeriod.demand_periods(p).as_slice(), &[p]);
        }
    }

    #[test]
    fn test_peak_substitution_order() {
        assert_eq!(
            PeakSubstitution.demand_periods(Period::P2).as_slice(),
            &[Period::P2, Period::P3, Period::P1, Period::P4, Period::P5]
        );
        assert_eq!(
            PeakSubstitution.demand_periods(Period::P4).as_slice(),
            &[Period::P4, Period::P1, Period::P5]
        );
    }

    #[test]
    fn test_filter_blocks_non_peak_into_peak() {
        let periods = Everything.demand_periods(Period::P1);
        assert!(periods.iter().all(|p| !p.is_peak()));
        assert_eq!(periods.len(), 3);
    }

    #[test]
    fn test_factory() {
        assert_eq!(create_pairing(PeriodPairingKind::SamePeriod).name(), "SamePeriod");
        assert_eq!(
            create_pairing(PeriodPairingKind::PeakSubstitution).name(),
            "PeakSubstitution"
        );
    }
}
