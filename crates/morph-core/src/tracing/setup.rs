use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::constants::LOG_ENV_VAR;

/// Install the global fmt subscriber. `MORPH_LOG` overrides the configured
/// level. Returns false if a global subscriber was already installed.
pub fn init_tracing(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(config.effective_level()));

    if config.effective_json() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init()
            .is_ok()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
            .is_ok()
    }
}
