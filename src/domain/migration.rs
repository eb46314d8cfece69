// ============================================================================
// Allocation Document Migration
// Collapses persisted allocation documents into the canonical record shape
// ============================================================================
//
// Schema 0 (legacy) documents carry per-period values (`c1`..`c5`) at the root,
// under a nested `allocated` object, or both. Nested values win. Identity comes
// from `pk` (`companyId_productionSiteId_consumptionSiteId`) and `sk` (`MMYYYY`).
//
// Schema 1 documents are the serde form of `AllocationRecord` wrapped with a
// `schemaVersion` field.

use super::allocation::{AllocationKind, AllocationRecord};
use super::keys::{CompanyId, CompositeKey, MonthKey, SiteId};
use super::period::{Period, PeriodQuantities};
use crate::error::InvalidInput;
use crate::numeric::Quantity;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CURRENT_SCHEMA_VERSION: u64 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CanonicalDocument {
    schema_version: u64,
    #[serde(flatten)]
    record: AllocationRecord,
}

/// Decode a persisted allocation document of any known schema version.
pub fn migrate_allocation(document: Value) -> Result<AllocationRecord, InvalidInput> {
    let version = document
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    match version {
        0 => migrate_legacy(&document),
        CURRENT_SCHEMA_VERSION => {
            let record = serde_json::from_value::<CanonicalDocument>(document)
                .map(|doc| doc.record)
                .map_err(|e| InvalidInput::Document(e.to_string()))?;
            reject_negative(&record.consumption_site, &record.allocated)?;
            if let Some(values) = &record.adjustment {
                reject_negative(&record.consumption_site, values)?;
            }
            Ok(record)
        }
        other => Err(InvalidInput::Document(format!(
            "unsupported schema version {}",
            other
        ))),
    }
}

/// Encode a record in the current schema.
pub fn to_document(record: &AllocationRecord) -> Result<Value, InvalidInput> {
    serde_json::to_value(CanonicalDocument {
        schema_version: CURRENT_SCHEMA_VERSION,
        record: record.clone(),
    })
    .map_err(|e| InvalidInput::Document(e.to_string()))
}

fn migrate_legacy(document: &Value) -> Result<AllocationRecord, InvalidInput> {
    let root = document
        .as_object()
        .ok_or_else(|| InvalidInput::Document("expected a JSON object".to_string()))?;

    let pk = root
        .get("pk")
        .and_then(Value::as_str)
        .ok_or(InvalidInput::MissingIdentity {
            record: "allocation document",
            field: "pk",
        })?;
    let key: CompositeKey = pk.parse()?;
    let consumption_site = key.consumption_site.clone().ok_or_else(|| {
        InvalidInput::CompositeKey(format!("{} has no consumption site", pk))
    })?;

    let month: MonthKey = root
        .get("sk")
        .and_then(Value::as_str)
        .ok_or(InvalidInput::MissingIdentity {
            record: "allocation document",
            field: "sk",
        })?
        .parse()?;

    let production_company = root
        .get("productionCompanyId")
        .and_then(Value::as_str)
        .map(CompanyId::from)
        .unwrap_or_else(|| key.company.clone());

    let nested = root.get("allocated").and_then(Value::as_object);
    let mut allocated = PeriodQuantities::ZERO;
    for period in Period::ALL {
        let value = nested
            .and_then(|n| quantity_field(n, period.column()).transpose())
            .or_else(|| quantity_field(root, period.column()).transpose())
            .transpose()?
            .unwrap_or(0);
        allocated[period] = value;
    }

    let kind = match root.get("type").and_then(Value::as_str) {
        None | Some("normal") | Some("") => AllocationKind::Normal,
        Some("injection") => AllocationKind::Injection,
        Some("reduction") => AllocationKind::Reduction,
        Some(other) => {
            return Err(InvalidInput::Document(format!(
                "unknown allocation type {:?}",
                other
            )))
        }
    };

    let adjustment = match root.get("adjustment").and_then(Value::as_object) {
        Some(adj) => {
            let mut q = PeriodQuantities::ZERO;
            for period in Period::ALL {
                q[period] = quantity_field(adj, period.column())?.unwrap_or(0);
            }
            Some(q)
        }
        None => None,
    };

    let charge = match root.get("charge") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
        _ => false,
    };

    let version = match root.get("version").and_then(Value::as_u64) {
        Some(v) => u32::try_from(v.max(1))
            .map_err(|_| InvalidInput::Document(format!("version {} is out of range", v)))?,
        None => 1,
    };

    reject_negative(&consumption_site, &allocated)?;
    if let Some(values) = &adjustment {
        reject_negative(&consumption_site, values)?;
    }

    let mut record = AllocationRecord::new(
        key.production_site,
        production_company,
        consumption_site,
        key.company,
        month,
    );
    record.allocated = allocated;
    record.charge = charge;
    record.kind = kind;
    record.adjustment = adjustment;
    record.version = version;
    Ok(record)
}

/// Read an integral quantity stored as a number or numeric string
fn quantity_field(object: &Map<String, Value>, field: &str) -> Result<Option<Quantity>, InvalidInput> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(float_quantity))
            .map(Some)
            .ok_or_else(|| InvalidInput::Document(format!("{} is not a quantity", field))),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| InvalidInput::Document(format!("{} is not a quantity: {:?}", field, s))),
        Some(_) => Err(InvalidInput::Document(format!("{} is not a quantity", field))),
    }
}

/// Whole part of a fractional quantity, `None` outside the `i64` range
fn float_quantity(value: f64) -> Option<Quantity> {
    let floored = value.floor();
    // i64::MAX as f64 rounds up to 2^63, itself out of range
    if floored.is_finite() && floored >= i64::MIN as f64 && floored < i64::MAX as f64 {
        Some(floored as i64)
    } else {
        None
    }
}

fn reject_negative(site: &SiteId, quantities: &PeriodQuantities) -> Result<(), InvalidInput> {
    match quantities.first_negative() {
        Some((period, value)) => Err(InvalidInput::NegativeQuantity {
            record: "allocation document",
            site: site.clone(),
            period,
            value,
        }),
        None => Ok(()),
    }
}
