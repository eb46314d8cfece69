// ============================================================================
// Shareholding Percentage
// Decimal percentage in [0, 100] used to scale matched quantities
// ============================================================================

use super::Quantity;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ownership percentage in the closed range `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Decimal", into = "Decimal"))]
pub struct Percentage(Decimal);

impl Percentage {
    /// Full ownership, no scaling
    pub const FULL: Self = Self(Decimal::ONE_HUNDRED);

    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a percentage, returning `None` outside `[0, 100]`.
    pub fn new(value: Decimal) -> Option<Self> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return None;
        }
        Some(Self(value))
    }

    /// Create from a whole-number percentage.
    pub fn from_integer(value: u32) -> Option<Self> {
        Self::new(Decimal::from(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_full(&self) -> bool {
        self.0 == Decimal::ONE_HUNDRED
    }

    /// Scale a quantity by this percentage, floored to an integer.
    ///
    /// `floor(quantity * pct / 100)`. The result never exceeds `quantity` for
    /// non-negative inputs.
    pub fn scale(&self, quantity: Quantity) -> Quantity {
        if self.is_full() {
            return quantity;
        }
        let scaled = (Decimal::from(quantity) * self.0 / Decimal::ONE_HUNDRED).floor();
        // Bounded by |quantity|, always representable
        scaled.to_i64().unwrap_or(0)
    }
}

impl Default for Percentage {
    fn default() -> Self {
        Self::FULL
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = String;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("percentage {} outside [0, 100]", value))
    }
}

impl From<Percentage> for Decimal {
    fn from(value: Percentage) -> Self {
        value.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_validation() {
        assert!(Percentage::new(Decimal::ZERO).is_some());
        assert!(Percentage::new(Decimal::ONE_HUNDRED).is_some());
        assert!(Percentage::new(Decimal::new(-1, 0)).is_none());
        assert!(Percentage::new(Decimal::new(10001, 2)).is_none());
    }

    #[test]
    fn test_scale_floors() {
        let pct = Percentage::new(Decimal::new(335, 1)).unwrap(); // 33.5%
        // 10 * 33.5 / 100 = 3.35 -> 3
        assert_eq!(pct.scale(10), 3);
        assert_eq!(Percentage::FULL.scale(77), 77);
        assert_eq!(Percentage::ZERO.scale(77), 0);
    }

    #[test]
    fn test_scale_never_exceeds_input() {
        let pct = Percentage::from_integer(99).unwrap();
        for q in 0..200 {
            assert!(pct.scale(q) <= q);
        }
    }
}
