// ============================================================================
// Settlement Configuration
// Engine policy plus the per-run consumer selection and manual overrides
// ============================================================================

use super::keys::SiteId;
use super::period::Period;
use crate::numeric::Quantity;
use std::collections::{HashMap, HashSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Period Pairing Type
// ============================================================================

/// Which demand periods a period's supply is offered to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PeriodPairingKind {
    /// Supply only meets demand in the same period
    #[default]
    SamePeriod,

    /// Same period first, then peak supply spills over to other compatible
    /// demand periods (peak before non-peak). Non-peak supply never reaches
    /// peak demand.
    PeakSubstitution,
}

// ============================================================================
// Engine Configuration
// ============================================================================

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SettlementConfig {
    /// Label used in logs and events
    pub name: String,

    pub pairing: PeriodPairingKind,

    /// Log a warning when a run ends with unmatched consumer demand
    pub warn_on_residue: bool,

    /// Emit one event per individual match (verbose)
    pub emit_match_events: bool,
}

impl SettlementConfig {
    pub fn new(name: impl Into<String>, pairing: PeriodPairingKind) -> Self {
        Self {
            name: name.into(),
            pairing,
            warn_on_residue: true,
            emit_match_events: false,
        }
    }

    pub fn with_residue_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_residue = enabled;
        self
    }

    pub fn with_match_events(mut self, enabled: bool) -> Self {
        self.emit_match_events = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Settlement name cannot be empty".to_string());
        }
        Ok(())
    }

    /// Same-period matching, the established settlement convention
    pub fn standard(name: impl Into<String>) -> Self {
        Self::new(name, PeriodPairingKind::SamePeriod)
    }

    /// Peak generation may also cover off-peak need
    pub fn peak_substitution(name: impl Into<String>) -> Self {
        Self::new(name, PeriodPairingKind::PeakSubstitution)
    }
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self::standard("default")
    }
}

// ============================================================================
// Consumer Selection
// ============================================================================

/// Priority and include/exclude membership of consumers for one run.
///
/// Lower priority values are served first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConsumerSelection {
    pub priorities: HashMap<SiteId, u32>,
    pub included: HashSet<SiteId>,
    pub excluded: HashSet<SiteId>,
    /// Only explicitly included consumers take part
    pub exclude_by_default: bool,
}

impl ConsumerSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(mut self, site: impl Into<SiteId>, priority: u32) -> Self {
        self.priorities.insert(site.into(), priority);
        self
    }

    pub fn include(mut self, site: impl Into<SiteId>) -> Self {
        let site = site.into();
        self.excluded.remove(&site);
        self.included.insert(site);
        self
    }

    pub fn exclude(mut self, site: impl Into<SiteId>) -> Self {
        let site = site.into();
        self.included.remove(&site);
        self.excluded.insert(site);
        self
    }

    pub fn exclude_by_default(mut self, enabled: bool) -> Self {
        self.exclude_by_default = enabled;
        self
    }

    pub fn is_selected(&self, site: &SiteId) -> bool {
        if self.exclude_by_default {
            self.included.contains(site)
        } else {
            !self.excluded.contains(site)
        }
    }

    pub fn priority(&self, site: &SiteId) -> Option<u32> {
        self.priorities.get(site).copied()
    }
}

// ============================================================================
// Manual Override
// ============================================================================

/// Pinned allocation applied before greedy matching of its period
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManualOverride {
    pub production_site: SiteId,
    pub consumption_site: SiteId,
    pub period: Period,
    pub quantity: Quantity,
}

impl ManualOverride {
    pub fn new(
        production_site: impl Into<SiteId>,
        consumption_site: impl Into<SiteId>,
        period: Period,
        quantity: Quantity,
    ) -> Self {
        Self {
            production_site: production_site.into(),
            consumption_site: consumption_site.into(),
            period,
            quantity,
        }
    }
}
