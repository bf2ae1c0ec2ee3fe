//! Tracing bootstrap.
//!
//! Filter precedence: the `GRIDLOCK_LOG` environment variable wins when
//! set, otherwise the configured default level applies.

use crate::config::types::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives.
pub const LOG_ENV_VAR: &str = "GRIDLOCK_LOG";

/// Install the global tracing subscriber.
///
/// Safe to call more than once; later calls log a debug line and leave the
/// first subscriber in place, so library consumers that install their own
/// are not fought over.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    match result {
        Ok(()) => tracing::debug!(level = %config.level, "logging initialized"),
        Err(_) => tracing::debug!("logging already initialized, keeping existing subscriber"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_init_does_not_panic() {
        let config = LoggingConfig::default();
        init(&config);
        init(&config);
    }
}
