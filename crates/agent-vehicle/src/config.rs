//! Configuration for the vehicle intelligence pipeline

use crate::error::{Result, VehicleError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Seconds each collaborator call may take
pub const ENV_STAGE_TIMEOUT: &str = "VEHICLE_INTEL_STAGE_TIMEOUT_SECS";
/// Market data cache lifetime in seconds
pub const ENV_CACHE_TTL: &str = "VEHICLE_INTEL_CACHE_TTL_SECS";
/// `false`/`0`/`off` disables the override registry
pub const ENV_OVERRIDES: &str = "VEHICLE_INTEL_OVERRIDES";

/// Configuration for pipeline runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound for a single collaborator call
    pub stage_timeout: Duration,

    /// How long cached market data stays valid
    pub market_cache_ttl: Duration,

    /// Serve precomputed reports for registered vehicles
    pub overrides_enabled: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(30),
            market_cache_ttl: Duration::from_secs(3600), // 1 hour
            overrides_enabled: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Defaults overridden by `VEHICLE_INTEL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::builder().with_env()?.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.stage_timeout.is_zero() {
            return Err(VehicleError::Config(
                "stage_timeout must be greater than 0".to_string(),
            ));
        }
        if self.market_cache_ttl.is_zero() {
            return Err(VehicleError::Config(
                "market_cache_ttl must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for PipelineConfig
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    stage_timeout: Option<Duration>,
    market_cache_ttl: Option<Duration>,
    overrides_enabled: Option<bool>,
}

impl PipelineConfigBuilder {
    /// Set the per-call timeout
    pub fn stage_timeout(mut self, duration: Duration) -> Self {
        self.stage_timeout = Some(duration);
        self
    }

    /// Set the market data cache TTL
    pub fn market_cache_ttl(mut self, duration: Duration) -> Self {
        self.market_cache_ttl = Some(duration);
        self
    }

    /// Enable or disable override lookups
    pub fn overrides_enabled(mut self, enabled: bool) -> Self {
        self.overrides_enabled = Some(enabled);
        self
    }

    /// Apply any `VEHICLE_INTEL_*` variables present in the environment
    pub fn with_env(self) -> Result<Self> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    fn with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(ENV_STAGE_TIMEOUT) {
            self.stage_timeout = Some(parse_secs(ENV_STAGE_TIMEOUT, &raw)?);
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL) {
            self.market_cache_ttl = Some(parse_secs(ENV_CACHE_TTL, &raw)?);
        }
        if let Some(raw) = lookup(ENV_OVERRIDES) {
            self.overrides_enabled = Some(parse_flag(ENV_OVERRIDES, &raw)?);
        }
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> Result<PipelineConfig> {
        let defaults = PipelineConfig::default();

        let config = PipelineConfig {
            stage_timeout: self.stage_timeout.unwrap_or(defaults.stage_timeout),
            market_cache_ttl: self.market_cache_ttl.unwrap_or(defaults.market_cache_ttl),
            overrides_enabled: self.overrides_enabled.unwrap_or(defaults.overrides_enabled),
        };

        config.validate()?;
        Ok(config)
    }
}

fn parse_secs(name: &str, raw: &str) -> Result<Duration> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| VehicleError::Config(format!("{name}={raw:?}: {e}")))
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(VehicleError::Config(format!(
            "{name}={other:?} is not a boolean"
        ))),
    }
}
