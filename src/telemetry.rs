// ============================================================================
// Telemetry
// Tracing subscriber setup for binaries and tests embedding the engine
// ============================================================================

use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; only the first call installs anything. If
/// the host already set a global subscriber, that one is kept.
pub fn init_tracing(service_name: &'static str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let installed = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .try_init()
            .is_ok();

        if installed {
            tracing::info!(service = service_name, "tracing initialized");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing("settlement-test");
        init_tracing("settlement-test");
        assert!(TRACING_INIT.get().is_some());
    }
}
