// ============================================================================
// Validation Module
// Input checks, edit rules and consumer ordering
// ============================================================================

mod edit;
mod input;
mod priority;

pub use edit::{apply_minimum_allocation, check_charge_uniqueness, check_non_negative, MinimumAllocation};
pub use input::validate_input;
pub use priority::order_consumers;
