// ============================================================================
// Settlement Engine Factory
// Creates settlement engines with proper configuration
// ============================================================================

use crate::domain::{PeriodPairingKind, SettlementConfig};
use crate::engine::pairing::create_pairing;
use crate::engine::SettlementEngine;
use crate::error::{SettlementError, SettlementResult};
use crate::interfaces::SettlementEventHandler;
use std::sync::Arc;

// ============================================================================
// Factory Functions
// ============================================================================

/// Creates a settlement engine from configuration
///
/// # Arguments
/// * `config` - Settlement configuration
/// * `event_handler` - Event handler for run and edit events
///
/// # Example
/// ```
/// use energy_settlement::prelude::*;
/// use energy_settlement::engine::factory::create_from_config;
/// use std::sync::Arc;
///
/// let config = SettlementConfig::standard("tn-captive");
/// let engine = create_from_config(config, Arc::new(NoOpEventHandler)).unwrap();
/// assert_eq!(engine.pairing_name(), "SamePeriod");
/// ```
pub fn create_from_config(
    config: SettlementConfig,
    event_handler: Arc<dyn SettlementEventHandler>,
) -> SettlementResult<SettlementEngine> {
    config.validate().map_err(SettlementError::Config)?;

    let pairing = create_pairing(config.pairing);
    Ok(SettlementEngine::new(config, pairing, event_handler))
}

// ============================================================================
// Builder Pattern
// ============================================================================

/// Builder for creating settlement engines with fluent API
///
/// # Example
/// ```
/// use energy_settlement::prelude::*;
/// use energy_settlement::engine::factory::SettlementEngineBuilder;
/// use std::sync::Arc;
///
/// let engine = SettlementEngineBuilder::new("tn-captive")
///     .peak_substitution()
///     .with_residue_warnings(false)
///     .build(Arc::new(NoOpEventHandler))
///     .unwrap();
/// assert_eq!(engine.pairing_name(), "PeakSubstitution");
/// ```
pub struct SettlementEngineBuilder {
    config: SettlementConfig,
}

impl SettlementEngineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: SettlementConfig::standard(name),
        }
    }

    pub fn from_config(config: SettlementConfig) -> Self {
        Self { config }
    }

    /// Supply only meets same-period demand (default)
    pub fn same_period_matching(mut self) -> Self {
        self.config.pairing = PeriodPairingKind::SamePeriod;
        self
    }

    /// Peak supply may also cover other compatible periods
    pub fn peak_substitution(mut self) -> Self {
        self.config.pairing = PeriodPairingKind::PeakSubstitution;
        self
    }

    pub fn with_residue_warnings(mut self, enabled: bool) -> Self {
        self.config = self.config.with_residue_warnings(enabled);
        self
    }

    pub fn with_match_events(mut self, enabled: bool) -> Self {
        self.config = self.config.with_match_events(enabled);
        self
    }

    /// Build the settlement engine
    pub fn build(
        self,
        event_handler: Arc<dyn SettlementEventHandler>,
    ) -> SettlementResult<SettlementEngine> {
        create_from_config(self.config, event_handler)
    }

    /// Get the configuration without building (for inspection)
    pub fn get_config(&self) -> &SettlementConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interfaces::NoOpEventHandler;

    #[test]
    fn test_create_standard_engine() {
        let engine =
            create_from_config(SettlementConfig::standard("tn"), Arc::new(NoOpEventHandler)).unwrap();
        assert_eq!(engine.pairing_name(), "SamePeriod");
        assert_eq!(engine.config().name, "tn");
    }

    #[test]
    fn test_blank_name_rejected() {
        let result = create_from_config(SettlementConfig::standard("  "), Arc::new(NoOpEventHandler));
        assert!(matches!(result, Err(SettlementError::Config(_))));
    }

    #[test]
    fn test_builder_pattern() {
        let builder = SettlementEngineBuilder::new("tn")
            .peak_substitution()
            .with_match_events(true);
        assert!(builder.get_config().emit_match_events);

        let engine = builder.build(Arc::new(NoOpEventHandler)).unwrap();
        assert_eq!(engine.pairing_name(), "PeakSubstitution");
    }

    #[test]
    fn test_builder_back_to_same_period() {
        let engine = SettlementEngineBuilder::from_config(SettlementConfig::peak_substitution("tn"))
            .same_period_matching()
            .build(Arc::new(NoOpEventHandler))
            .unwrap();
        assert_eq!(engine.pairing_name(), "SamePeriod");
    }
}
