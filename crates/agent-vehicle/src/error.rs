//! Error types for vehicle price intelligence

use agent_core::{LogEntry, StageError};
use thiserror::Error;

/// Errors raised by collaborators and registry construction
#[derive(Debug, Error)]
pub enum VehicleError {
    /// No market data for the requested vehicle
    #[error("Data not available for {vehicle}: {reason}")]
    DataUnavailable { vehicle: String, reason: String },

    /// A collaborator (datastore, model, generator) failed
    #[error("Provider error: {0}")]
    Provider(String),

    /// Narrative template failed to render
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An override fixture is internally inconsistent
    #[error("Invalid fixture {key}: {reason}")]
    InvalidFixture { key: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for vehicle operations
pub type Result<T> = std::result::Result<T, VehicleError>;

/// Collaborator failures are recoverable; broken fixtures and config are not
impl From<VehicleError> for StageError {
    fn from(err: VehicleError) -> Self {
        match err {
            VehicleError::DataUnavailable { .. }
            | VehicleError::Provider(_)
            | VehicleError::Template(_)
            | VehicleError::Json(_) => StageError::recoverable(err.to_string()),
            VehicleError::InvalidFixture { .. } | VehicleError::Config(_) => {
                StageError::fatal(err.to_string())
            }
        }
    }
}

/// Top-level failure surfaced to callers of the orchestrator
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Required identity field missing or malformed
    #[error("Invalid query field {field}: {reason}")]
    InvalidQuery { field: &'static str, reason: String },

    /// A stage failed without a usable neutral default
    #[error("{agent} failed: {source}")]
    StageFailed {
        agent: String,
        #[source]
        source: StageError,
        /// Log up to and including the failed entry
        log: Vec<LogEntry>,
    },

    /// The override registry could not be built
    #[error("Registry error: {0}")]
    Registry(#[from] VehicleError),
}

impl PipelineError {
    /// Log entries recorded before the pipeline aborted
    pub fn partial_log(&self) -> &[LogEntry] {
        match self {
            Self::StageFailed { log, .. } => log,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VehicleError::DataUnavailable {
            vehicle: "2020 Acme Roadster".to_string(),
            reason: "no listings".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Data not available for 2020 Acme Roadster: no listings"
        );

        let err = PipelineError::InvalidQuery {
            field: "make",
            reason: "must not be empty".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid query field make: must not be empty");
    }

    #[test]
    fn test_error_conversion() {
        let stage: StageError = VehicleError::Provider("datastore offline".to_string()).into();
        assert!(stage.is_recoverable());

        let stage: StageError = VehicleError::Config("bad".to_string()).into();
        assert!(!stage.is_recoverable());
    }

    #[test]
    fn test_partial_log() {
        let err = PipelineError::StageFailed {
            agent: "ForecastAgent".to_string(),
            source: StageError::fatal("no price"),
            log: vec![LogEntry::failed("ForecastAgent", "no price")],
        };
        assert_eq!(err.partial_log().len(), 1);
        assert!(err.to_string().starts_with("ForecastAgent failed"));
    }
}
