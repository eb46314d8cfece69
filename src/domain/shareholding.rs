// ============================================================================
// Shareholding
// Ownership percentages that scale matched quantities
// ============================================================================

use super::keys::CompanyId;
use crate::error::InvalidInput;
use crate::numeric::{Percentage, Quantity};
use rust_decimal::Decimal;
use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Raw shareholding record as supplied by the caller.
///
/// The percentage is unchecked here; [`ShareholdingTable::from_records`]
/// rejects values outside `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShareholdingRecord {
    pub generator: CompanyId,
    pub shareholder: CompanyId,
    pub percentage: Decimal,
}

impl ShareholdingRecord {
    pub fn new(
        generator: impl Into<CompanyId>,
        shareholder: impl Into<CompanyId>,
        percentage: Decimal,
    ) -> Self {
        Self {
            generator: generator.into(),
            shareholder: shareholder.into(),
            percentage,
        }
    }
}

/// Generator company -> percentage, as seen by one shareholder
pub type ShareMap = HashMap<CompanyId, Percentage>;

/// Scale a matched quantity by the producer's shareholding.
///
/// Absence of an entry means full ownership (100%).
pub fn apply_share(quantity: Quantity, producer_company: &CompanyId, share_map: &ShareMap) -> Quantity {
    share_map
        .get(producer_company)
        .copied()
        .unwrap_or_default()
        .scale(quantity)
}

/// All validated shareholding records for a run.
///
/// Percentages for one generator are not required to sum to 100.
#[derive(Debug, Clone, Default)]
pub struct ShareholdingTable {
    by_shareholder: HashMap<CompanyId, ShareMap>,
}

impl ShareholdingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: &[ShareholdingRecord]) -> Result<Self, InvalidInput> {
        let mut table = Self::new();
        for record in records {
            table.insert(record)?;
        }
        Ok(table)
    }

    /// Add or replace a record. Later records win.
    pub fn insert(&mut self, record: &ShareholdingRecord) -> Result<(), InvalidInput> {
        if record.generator.is_blank() {
            return Err(InvalidInput::MissingIdentity {
                record: "shareholding record",
                field: "generator",
            });
        }
        if record.shareholder.is_blank() {
            return Err(InvalidInput::MissingIdentity {
                record: "shareholding record",
                field: "shareholder",
            });
        }
        let percentage =
            Percentage::new(record.percentage).ok_or_else(|| InvalidInput::PercentageOutOfRange {
                generator: record.generator.to_string(),
                shareholder: record.shareholder.to_string(),
                percentage: record.percentage,
            })?;

        self.by_shareholder
            .entry(record.shareholder.clone())
            .or_default()
            .insert(record.generator.clone(), percentage);
        Ok(())
    }

    /// Share map for one shareholder (consumer company)
    pub fn share_map(&self, shareholder: &CompanyId) -> Option<&ShareMap> {
        self.by_shareholder.get(shareholder)
    }

    pub fn percentage(&self, generator: &CompanyId, shareholder: &CompanyId) -> Percentage {
        self.share_map(shareholder)
            .and_then(|m| m.get(generator))
            .copied()
            .unwrap_or_default()
    }

    /// Scale `quantity` matched from `generator` to `shareholder`
    pub fn scale(&self, quantity: Quantity, generator: &CompanyId, shareholder: &CompanyId) -> Quantity {
        match self.share_map(shareholder) {
            Some(map) => apply_share(quantity, generator, map),
            None => quantity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.by_shareholder.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_share_defaults_to_full() {
        let map = ShareMap::new();
        assert_eq!(apply_share(57, &CompanyId::from("GEN-CO"), &map), 57);
    }

    #[test]
    fn test_apply_share_scales_and_floors() {
        let mut map = ShareMap::new();
        map.insert(CompanyId::from("GEN-CO"), Percentage::from_integer(26).unwrap());
        // 57 * 26 / 100 = 14.82
        assert_eq!(apply_share(57, &CompanyId::from("GEN-CO"), &map), 14);
    }

    #[test]
    fn test_table_rejects_out_of_range() {
        let err = ShareholdingTable::from_records(&[ShareholdingRecord::new(
            "GEN-CO",
            "CON-CO",
            Decimal::new(101, 0),
        )])
        .unwrap_err();
        assert!(matches!(err, InvalidInput::PercentageOutOfRange { .. }));
    }

    #[test]
    fn test_table_rejects_blank_identity() {
        let err = ShareholdingTable::from_records(&[ShareholdingRecord::new(
            "",
            "CON-CO",
            Decimal::new(50, 0),
        )])
        .unwrap_err();
        assert!(matches!(err, InvalidInput::MissingIdentity { field: "generator", .. }));
    }

    #[test]
    fn test_table_lookup_is_per_pair() {
        let table = ShareholdingTable::from_records(&[
            ShareholdingRecord::new("GEN-CO", "CON-A", Decimal::new(40, 0)),
            ShareholdingRecord::new("GEN-CO", "CON-B", Decimal::new(60, 0)),
        ])
        .unwrap();

        let gen = CompanyId::from("GEN-CO");
        assert_eq!(table.scale(100, &gen, &CompanyId::from("CON-A")), 40);
        assert_eq!(table.scale(100, &gen, &CompanyId::from("CON-B")), 60);
        // Unknown pair: no scaling
        assert_eq!(table.scale(100, &gen, &CompanyId::from("CON-C")), 100);
        assert_eq!(
            table.percentage(&CompanyId::from("OTHER"), &CompanyId::from("CON-A")),
            Percentage::FULL
        );
    }
}
