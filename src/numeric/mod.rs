// ============================================================================
// Numeric Module
// Integral energy quantities and decimal shareholding percentages
// ============================================================================
//
// Quantities are whole units (kWh) stored as i64. Inputs are validated to be
// non-negative; negative values only appear in usage traces and edit deltas.
// Percentages use rust_decimal so that scaling is exact before flooring.

mod percentage;

pub use percentage::Percentage;

/// Energy quantity in whole units
pub type Quantity = i64;
