//! Logging and tracing utilities

use crate::config::{Config, LogFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing from a [`Config`]
///
/// `RUST_LOG` wins over `config.default_filter`. Fails if a global
/// subscriber is already installed.
pub fn init_tracing_with(config: &Config) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))?;

    let (plain, json) = match config.log_format {
        LogFormat::Plain => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(plain)
        .with(json)
        .try_init()?;

    tracing::debug!(app = %config.app_name, env = %config.environment, "tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let config = Config::default();
        // Another test may have installed the subscriber already
        let _ = init_tracing_with(&config);
        assert!(init_tracing_with(&config).is_err());
    }
}
