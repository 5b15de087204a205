//! Error types for agent-core

use std::time::Duration;
use thiserror::Error;

/// Result type alias for stage execution
pub type Result<T> = std::result::Result<T, StageError>;

/// Error raised by a pipeline stage
///
/// Every variant knows whether the pipeline may continue with a neutral
/// default (`recoverable`) or has to abort.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    /// A prior stage's output this stage depends on is absent
    #[error("Missing required input: {input}")]
    MissingInput {
        /// Name of the missing input
        input: &'static str,
    },

    /// A prior stage's output is present but unusable
    #[error("Malformed input {input}: {detail}")]
    MalformedInput {
        /// Name of the malformed input
        input: &'static str,
        /// What is wrong with it
        detail: String,
    },

    /// An external collaborator did not answer within the stage budget
    #[error("Collaborator timed out after {}s", .after.as_secs_f64())]
    Timeout {
        /// The budget that was exceeded
        after: Duration,
    },

    /// An external collaborator failed
    #[error("Collaborator failed: {cause}")]
    Collaborator {
        /// Human-readable cause
        cause: String,
        /// Whether a neutral default may replace the output
        recoverable: bool,
    },
}

impl StageError {
    /// Build a recoverable collaborator failure
    pub fn recoverable(cause: impl Into<String>) -> Self {
        Self::Collaborator {
            cause: cause.into(),
            recoverable: true,
        }
    }

    /// Build a non-recoverable collaborator failure
    pub fn fatal(cause: impl Into<String>) -> Self {
        Self::Collaborator {
            cause: cause.into(),
            recoverable: false,
        }
    }

    /// Build a malformed-input error
    pub fn malformed(input: &'static str, detail: impl Into<String>) -> Self {
        Self::MalformedInput {
            input,
            detail: detail.into(),
        }
    }

    /// Whether the orchestrator may substitute a neutral default
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::MissingInput { .. } | Self::MalformedInput { .. } => false,
            Self::Timeout { .. } => true,
            Self::Collaborator { recoverable, .. } => *recoverable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverability() {
        assert!(!StageError::MissingInput { input: "price_history" }.is_recoverable());
        assert!(!StageError::malformed("predicted_price", "negative").is_recoverable());
        assert!(StageError::Timeout {
            after: Duration::from_secs(5)
        }
        .is_recoverable());
        assert!(StageError::recoverable("datastore offline").is_recoverable());
        assert!(!StageError::fatal("schema mismatch").is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = StageError::MissingInput { input: "trend" };
        assert_eq!(err.to_string(), "Missing required input: trend");

        let err = StageError::Timeout {
            after: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "Collaborator timed out after 1.5s");

        let err = StageError::malformed("predicted_price", "must be positive");
        assert_eq!(
            err.to_string(),
            "Malformed input predicted_price: must be positive"
        );
    }
}
