// ============================================================================
// Settlement Errors
// ============================================================================

use crate::domain::{MonthKey, Period, SiteId};
use crate::numeric::Quantity;
use rust_decimal::Decimal;
use thiserror::Error;

/// Malformed input. Fails the whole operation; nothing is partially applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("negative quantity {value} in {period} for {record} {site}")]
    NegativeQuantity {
        record: &'static str,
        site: SiteId,
        period: Period,
        value: Quantity,
    },

    #[error("shareholding of {shareholder} in {generator} is {percentage}, outside [0, 100]")]
    PercentageOutOfRange {
        generator: String,
        shareholder: String,
        percentage: Decimal,
    },

    #[error("{record} is missing {field}")]
    MissingIdentity {
        record: &'static str,
        field: &'static str,
    },

    #[error("{record} {site} belongs to {found}, settlement run is for {expected}")]
    MonthMismatch {
        record: &'static str,
        site: SiteId,
        expected: MonthKey,
        found: MonthKey,
    },

    #[error("duplicate {record} {site}")]
    DuplicateSite { record: &'static str, site: SiteId },

    #[error("override references unknown or excluded site {site}")]
    UnknownOverrideSite { site: SiteId },

    #[error("invalid month key {0:?}, expected MMYYYY")]
    MonthKey(String),

    #[error("invalid composite key {0:?}")]
    CompositeKey(String),

    #[error("invalid document: {0}")]
    Document(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// Another allocation of the same production site and month already
    /// carries the charge.
    #[error("charge already held by {holder} for production site {production_site} in {month}")]
    ChargeConflict {
        production_site: SiteId,
        month: MonthKey,
        holder: SiteId,
    },

    #[error("no allocation between {production_site} and {consumption_site} in {month}")]
    AllocationNotFound {
        production_site: SiteId,
        consumption_site: SiteId,
        month: MonthKey,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type SettlementResult<T> = std::result::Result<T, SettlementError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SettlementError::from(InvalidInput::NegativeQuantity {
            record: "production unit",
            site: SiteId::from("GEN-1"),
            period: Period::P3,
            value: -4,
        });
        assert_eq!(
            err.to_string(),
            "invalid input: negative quantity -4 in P3 for production unit GEN-1"
        );
    }

    #[test]
    fn test_charge_conflict_display() {
        let err = SettlementError::ChargeConflict {
            production_site: SiteId::from("GEN-1"),
            month: MonthKey::new(4, 2024).unwrap(),
            holder: SiteId::from("CON-7"),
        };
        assert_eq!(
            err.to_string(),
            "charge already held by CON-7 for production site GEN-1 in 042024"
        );
    }
}
