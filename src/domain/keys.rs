// ============================================================================
// Identity Keys
// Site/company identifiers, MMYYYY month keys and composite record keys
// ============================================================================

use crate::error::InvalidInput;
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Production or consumption site identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SiteId(Arc<str>);

/// Opaque company identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CompanyId(Arc<str>);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(value: impl AsRef<str>) -> Self {
                Self(Arc::from(value.as_ref()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(Arc::from(value))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(SiteId);
string_id!(CompanyId);

// ============================================================================
// Month Key
// ============================================================================

/// Settlement month, rendered as `MMYYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct MonthKey {
    // Field order gives chronological ordering
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(month: u32, year: i32) -> Result<Self, InvalidInput> {
        if !(1000..=9999).contains(&year) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(InvalidInput::MonthKey(format!("{:02}{}", month, year)));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn first_day(&self) -> NaiveDate {
        // Validated in the constructor
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    /// Starting year of the April–March financial year containing this month
    pub fn financial_year(&self) -> i32 {
        if self.month >= 4 {
            self.year
        } else {
            self.year - 1
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl FromStr for MonthKey {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidInput::MonthKey(s.to_string()));
        }
        let month: u32 = s[..2].parse().map_err(|_| InvalidInput::MonthKey(s.to_string()))?;
        let year: i32 = s[2..].parse().map_err(|_| InvalidInput::MonthKey(s.to_string()))?;
        Self::new(month, year)
    }
}

impl TryFrom<String> for MonthKey {
    type Error = InvalidInput;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthKey> for String {
    fn from(value: MonthKey) -> Self {
        value.to_string()
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:04}", self.month, self.year)
    }
}

// ============================================================================
// Composite Key
// ============================================================================

/// Persisted primary identity: `companyId_productionSiteId[_consumptionSiteId]`.
///
/// Identifiers themselves must not contain `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    pub company: CompanyId,
    pub production_site: SiteId,
    pub consumption_site: Option<SiteId>,
}

impl CompositeKey {
    pub fn production(company: CompanyId, production_site: SiteId) -> Self {
        Self {
            company,
            production_site,
            consumption_site: None,
        }
    }

    pub fn pair(company: CompanyId, production_site: SiteId, consumption_site: SiteId) -> Self {
        Self {
            company,
            production_site,
            consumption_site: Some(consumption_site),
        }
    }
}

impl FromStr for CompositeKey {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('_').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(InvalidInput::CompositeKey(s.to_string()));
        }
        match parts.as_slice() {
            [company, production] => Ok(Self::production((*company).into(), (*production).into())),
            [company, production, consumption] => Ok(Self::pair(
                (*company).into(),
                (*production).into(),
                (*consumption).into(),
            )),
            _ => Err(InvalidInput::CompositeKey(s.to_string())),
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.company, self.production_site)?;
        if let Some(consumption) = &self.consumption_site {
            write!(f, "_{}", consumption)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key_parse_and_render() {
        let key: MonthKey = "042024".parse().unwrap();
        assert_eq!(key.month(), 4);
        assert_eq!(key.year(), 2024);
        assert_eq!(key.to_string(), "042024");
    }

    #[test]
    fn test_month_key_rejects_garbage() {
        assert!("132024".parse::<MonthKey>().is_err());
        assert!("002024".parse::<MonthKey>().is_err());
        assert!("4-2024".parse::<MonthKey>().is_err());
        assert!("42024".parse::<MonthKey>().is_err());
    }

    #[test]
    fn test_month_key_ordering_is_chronological() {
        let dec: MonthKey = "122023".parse().unwrap();
        let jan: MonthKey = "012024".parse().unwrap();
        assert!(dec < jan);
        assert_eq!(dec.next(), jan);
        assert_eq!(jan.previous(), dec);
    }

    #[test]
    fn test_financial_year_starts_in_april() {
        assert_eq!("032024".parse::<MonthKey>().unwrap().financial_year(), 2023);
        assert_eq!("042024".parse::<MonthKey>().unwrap().financial_year(), 2024);
    }

    #[test]
    fn test_composite_key_round_trip() {
        let key: CompositeKey = "ACME_GEN1_CON9".parse().unwrap();
        assert_eq!(key.company.as_str(), "ACME");
        assert_eq!(key.production_site.as_str(), "GEN1");
        assert_eq!(key.consumption_site.as_ref().map(|s| s.as_str()), Some("CON9"));
        assert_eq!(key.to_string(), "ACME_GEN1_CON9");

        let short: CompositeKey = "ACME_GEN1".parse().unwrap();
        assert!(short.consumption_site.is_none());
    }

    #[test]
    fn test_composite_key_rejects_bad_shapes() {
        assert!("ACME".parse::<CompositeKey>().is_err());
        assert!("ACME__CON".parse::<CompositeKey>().is_err());
        assert!("A_B_C_D".parse::<CompositeKey>().is_err());
    }
}
