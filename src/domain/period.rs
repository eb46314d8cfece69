// ============================================================================
// Period Model
// Time-of-day settlement buckets and the peak/non-peak compatibility rule
// ============================================================================

use crate::numeric::Quantity;
use std::fmt;
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the five fixed time-of-day settlement buckets.
///
/// `P2` and `P3` are peak periods, `P1`, `P4` and `P5` are non-peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Period {
    P1,
    P2,
    P3,
    P4,
    P5,
}

impl Period {
    /// All periods in ordinal order
    pub const ALL: [Period; 5] = [Period::P1, Period::P2, Period::P3, Period::P4, Period::P5];

    /// Peak periods, in the order the settlement pass visits them
    pub const PEAK: [Period; 2] = [Period::P2, Period::P3];

    /// Non-peak periods, in the order the settlement pass visits them
    pub const NON_PEAK: [Period; 3] = [Period::P1, Period::P4, Period::P5];

    /// Peak periods first, then non-peak periods
    pub const SETTLEMENT_ORDER: [Period; 5] =
        [Period::P2, Period::P3, Period::P1, Period::P4, Period::P5];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn is_peak(self) -> bool {
        matches!(self, Period::P2 | Period::P3)
    }

    /// Directional compatibility between a supply period and a demand period.
    ///
    /// Peak supply may satisfy peak or non-peak demand. Non-peak supply may
    /// only satisfy non-peak demand.
    #[inline]
    pub const fn is_compatible(supply: Period, demand: Period) -> bool {
        supply.is_peak() || !demand.is_peak()
    }

    /// Short label used in persisted documents (`c1`..`c5`)
    pub const fn column(self) -> &'static str {
        match self {
            Period::P1 => "c1",
            Period::P2 => "c2",
            Period::P3 => "c3",
            Period::P4 => "c4",
            Period::P5 => "c5",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.index() + 1)
    }
}

// ============================================================================
// Per-Period Quantities
// ============================================================================

/// A quantity for each of the five periods.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PeriodQuantities([Quantity; 5]);

impl PeriodQuantities {
    pub const ZERO: Self = Self([0; 5]);

    pub const fn new(values: [Quantity; 5]) -> Self {
        Self(values)
    }

    /// Same quantity in every period
    pub const fn splat(value: Quantity) -> Self {
        Self([value; 5])
    }

    pub const fn as_array(&self) -> &[Quantity; 5] {
        &self.0
    }

    pub fn get(&self, period: Period) -> Quantity {
        self.0[period.index()]
    }

    pub fn set(&mut self, period: Period, value: Quantity) {
        self.0[period.index()] = value;
    }

    pub fn add(&mut self, period: Period, value: Quantity) {
        self.0[period.index()] += value;
    }

    pub fn total(&self) -> Quantity {
        self.0.iter().sum()
    }

    /// True if any period is strictly positive
    pub fn any_positive(&self) -> bool {
        self.0.iter().any(|q| *q > 0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|q| *q == 0)
    }

    /// First period holding a negative value, if any
    pub fn first_negative(&self) -> Option<(Period, Quantity)> {
        self.iter().find(|(_, q)| *q < 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Period, Quantity)> + '_ {
        Period::ALL.iter().map(move |p| (*p, self.0[p.index()]))
    }

    /// Element-wise `self - other`
    pub fn delta_from(&self, other: &PeriodQuantities) -> PeriodQuantities {
        let mut out = [0; 5];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.0[i] - other.0[i];
        }
        PeriodQuantities(out)
    }
}

impl From<[Quantity; 5]> for PeriodQuantities {
    fn from(values: [Quantity; 5]) -> Self {
        Self(values)
    }
}

impl Index<Period> for PeriodQuantities {
    type Output = Quantity;

    fn index(&self, period: Period) -> &Self::Output {
        &self.0[period.index()]
    }
}

impl IndexMut<Period> for PeriodQuantities {
    fn index_mut(&mut self, period: Period) -> &mut Self::Output {
        &mut self.0[period.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_classification() {
        let peak: Vec<Period> = Period::ALL.iter().copied().filter(|p| p.is_peak()).collect();
        assert_eq!(peak, vec![Period::P2, Period::P3]);
    }

    #[test]
    fn test_compatibility_is_directional() {
        // Peak supply covers everything
        for demand in Period::ALL {
            assert!(Period::is_compatible(Period::P2, demand));
            assert!(Period::is_compatible(Period::P3, demand));
        }

        // Non-peak supply never covers peak demand
        for supply in Period::NON_PEAK {
            assert!(!Period::is_compatible(supply, Period::P2));
            assert!(!Period::is_compatible(supply, Period::P3));
            for demand in Period::NON_PEAK {
                assert!(Period::is_compatible(supply, demand));
            }
        }
    }

    #[test]
    fn test_settlement_order_visits_peak_first() {
        assert!(Period::SETTLEMENT_ORDER[..2].iter().all(|p| p.is_peak()));
        assert!(Period::SETTLEMENT_ORDER[2..].iter().all(|p| !p.is_peak()));
    }

    #[test]
    fn test_period_quantities_indexing() {
        let mut q = PeriodQuantities::new([100, 50, 50, 100, 100]);
        assert_eq!(q[Period::P2], 50);
        q[Period::P2] -= 20;
        assert_eq!(q.get(Period::P2), 30);
        assert_eq!(q.total(), 380);
        assert!(q.any_positive());
        assert!(!PeriodQuantities::ZERO.any_positive());
    }

    #[test]
    fn test_delta_and_negative_detection() {
        let old = PeriodQuantities::new([10, 10, 0, 0, 0]);
        let new = PeriodQuantities::new([4, 15, 0, 0, 0]);
        let delta = new.delta_from(&old);
        assert_eq!(delta, PeriodQuantities::new([-6, 5, 0, 0, 0]));
        assert_eq!(delta.first_negative(), Some((Period::P1, -6)));
    }
}
