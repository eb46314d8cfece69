// ============================================================================
// Period Pairing Interface
// Defines which demand periods a period's supply may be matched against
// ============================================================================

use crate::domain::Period;
use smallvec::SmallVec;

/// Demand periods in the order they are offered supply
pub type DemandPeriods = SmallVec<[Period; 5]>;

/// Strategy pattern interface for period pairing
/// Implementations: SamePeriod (default), PeakSubstitution
pub trait PeriodPairing: Send + Sync {
    /// Candidate demand periods for supply in `supply`, in preference order
    ///
    /// Implementations may return incompatible periods; callers go through
    /// [`PeriodPairing::demand_periods`], which filters them out.
    fn candidate_periods(&self, supply: Period) -> DemandPeriods;

    /// Get the pairing name for logging
    fn name(&self) -> &str;

    /// Candidate periods restricted to the directional compatibility rule
    fn demand_periods(&self, supply: Period) -> DemandPeriods {
        self.candidate_periods(supply)
            .into_iter()
            .filter(|demand| Period::is_compatible(supply, *demand))
            .collect()
    }
}
