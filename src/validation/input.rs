// ============================================================================
// Input Validation
// Rejects malformed settlement input before any quantity is touched
// ============================================================================

use crate::domain::{MonthKey, PeriodQuantities, SiteId};
use crate::engine::SettlementInput;
use crate::error::InvalidInput;
use std::collections::HashSet;

/// Validate everything except shareholding percentages, which are checked
/// when the shareholding table is built.
pub fn validate_input(input: &SettlementInput) -> Result<(), InvalidInput> {
    let mut seen = HashSet::new();
    for unit in &input.production {
        require_id("production unit", "site id", unit.site_id.is_blank())?;
        require_id("production unit", "company id", unit.company_id.is_blank())?;
        check_month("production unit", &unit.site_id, input.month, unit.month)?;
        check_quantities("production unit", &unit.site_id, &unit.quantities)?;
        if !seen.insert(&unit.site_id) {
            return Err(InvalidInput::DuplicateSite {
                record: "production unit",
                site: unit.site_id.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    for unit in &input.consumption {
        require_id("consumption unit", "site id", unit.site_id.is_blank())?;
        require_id("consumption unit", "company id", unit.company_id.is_blank())?;
        check_month("consumption unit", &unit.site_id, input.month, unit.month)?;
        check_quantities("consumption unit", &unit.site_id, &unit.quantities)?;
        if !seen.insert(&unit.site_id) {
            return Err(InvalidInput::DuplicateSite {
                record: "consumption unit",
                site: unit.site_id.clone(),
            });
        }
    }

    let mut seen = HashSet::new();
    for balance in &input.banked {
        require_id("banked balance", "site id", balance.site_id.is_blank())?;
        require_id("banked balance", "company id", balance.company_id.is_blank())?;
        check_quantities("banked balance", &balance.site_id, &balance.quantities)?;
        if !seen.insert(&balance.site_id) {
            return Err(InvalidInput::DuplicateSite {
                record: "banked balance",
                site: balance.site_id.clone(),
            });
        }
    }

    for pinned in &input.overrides {
        if pinned.quantity < 0 {
            return Err(InvalidInput::NegativeQuantity {
                record: "manual override",
                site: pinned.production_site.clone(),
                period: pinned.period,
                value: pinned.quantity,
            });
        }
        if !input.production.iter().any(|p| p.site_id == pinned.production_site) {
            return Err(InvalidInput::UnknownOverrideSite {
                site: pinned.production_site.clone(),
            });
        }
        let consumer_known = input
            .consumption
            .iter()
            .any(|c| c.site_id == pinned.consumption_site);
        if !consumer_known || !input.selection.is_selected(&pinned.consumption_site) {
            return Err(InvalidInput::UnknownOverrideSite {
                site: pinned.consumption_site.clone(),
            });
        }
    }

    Ok(())
}

fn require_id(record: &'static str, field: &'static str, blank: bool) -> Result<(), InvalidInput> {
    if blank {
        Err(InvalidInput::MissingIdentity { record, field })
    } else {
        Ok(())
    }
}

fn check_month(
    record: &'static str,
    site: &SiteId,
    expected: MonthKey,
    found: MonthKey,
) -> Result<(), InvalidInput> {
    if expected != found {
        return Err(InvalidInput::MonthMismatch {
            record,
            site: site.clone(),
            expected,
            found,
        });
    }
    Ok(())
}

fn check_quantities(
    record: &'static str,
    site: &SiteId,
    quantities: &PeriodQuantities,
) -> Result<(), InvalidInput> {
    match quantities.first_negative() {
        Some((period, value)) => Err(InvalidInput::NegativeQuantity {
            record,
            site: site.clone(),
            period,
            value,
        }),
        None => Ok(()),
    }
}
