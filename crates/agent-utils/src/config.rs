//! Configuration management utilities

use serde::{Deserialize, Serialize};

/// Output format for log records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Plain,
    /// One JSON object per record
    Json,
}

impl LogFormat {
    /// Parse a format name, falling back to [`LogFormat::Plain`]
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Plain
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Log record format
    pub log_format: LogFormat,
    /// Filter directive used when `RUST_LOG` is not set
    pub default_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "vehicle-intel".to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Plain,
            default_filter: "info".to_string(),
        }
    }
}

impl Config {
    /// Load overrides from `APP_ENV` and `LOG_FORMAT`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(environment) = std::env::var("APP_ENV") {
            config.environment = environment;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.log_format = LogFormat::from_name(&format);
        }
        config
    }

    /// Set the application name
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Set the default filter directive
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// Whether this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self.environment.as_str(), "prod" | "production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_from_name() {
        assert_eq!(LogFormat::from_name("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_name(" JSON "), LogFormat::Json);
        assert_eq!(LogFormat::from_name("pretty"), LogFormat::Plain);
    }

    #[test]
    fn test_builder_methods() {
        let config = Config::default()
            .with_app_name("basic-report")
            .with_default_filter("warn,agent_vehicle=debug");

        assert_eq!(config.app_name, "basic-report");
        assert_eq!(config.default_filter, "warn,agent_vehicle=debug");
        assert!(!config.is_production());
    }
}
