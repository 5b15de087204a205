//! Execution log entries
//!
//! Every stage contributes exactly one [`LogEntry`] per run. Entries are
//! appended in execution order and are never reordered or deduplicated.

use serde::{Deserialize, Serialize};

/// Outcome of a single stage run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Stage ran normally
    Ok,
    /// Stage failed recoverably and was replaced with neutral defaults
    Degraded,
    /// Stage failed and aborted the pipeline
    Failed,
}

impl AgentStatus {
    /// Lowercase label used in log output
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Degraded => "degraded",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One human-readable record of a stage execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Name of the agent that produced the entry
    pub agent: String,
    /// Outcome of the run
    pub status: AgentStatus,
    /// Human-readable summary
    pub message: String,
    /// Structured snapshot of the stage output
    pub output: serde_json::Value,
}

impl LogEntry {
    /// Create an entry with status `ok`
    pub fn ok(
        agent: impl Into<String>,
        message: impl Into<String>,
        output: serde_json::Value,
    ) -> Self {
        Self {
            agent: agent.into(),
            status: AgentStatus::Ok,
            message: message.into(),
            output,
        }
    }

    /// Create an entry from any serializable snapshot
    ///
    /// Snapshots that fail to serialize are recorded as `null`.
    pub fn from_snapshot<T: Serialize>(
        agent: impl Into<String>,
        message: impl Into<String>,
        snapshot: &T,
    ) -> Self {
        let output = serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null);
        Self::ok(agent, message, output)
    }

    /// Mark the entry as degraded, prefixing the message with the cause
    pub fn degraded(mut self, cause: impl std::fmt::Display) -> Self {
        self.status = AgentStatus::Degraded;
        self.message = format!("Degraded ({cause}); neutral defaults applied. {}", self.message);
        self
    }

    /// Create a failed entry for an agent that aborted the pipeline
    pub fn failed(agent: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self {
            agent: agent.into(),
            status: AgentStatus::Failed,
            message: format!("Stage failed: {cause}"),
            output: serde_json::Value::Null,
        }
    }

    /// Whether the entry reports a normal run
    pub fn is_ok(&self) -> bool {
        self.status == AgentStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_value(AgentStatus::Ok).unwrap(), json!("ok"));
        assert_eq!(
            serde_json::to_value(AgentStatus::Degraded).unwrap(),
            json!("degraded")
        );
        assert_eq!(AgentStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn test_degraded_keeps_agent_and_output() {
        let entry = LogEntry::ok("DataAgent", "Retrieved 0 months.", json!({"n_months": 0}))
            .degraded("datastore offline");

        assert_eq!(entry.agent, "DataAgent");
        assert_eq!(entry.status, AgentStatus::Degraded);
        assert!(entry.message.starts_with("Degraded (datastore offline)"));
        assert!(entry.message.ends_with("Retrieved 0 months."));
        assert_eq!(entry.output, json!({"n_months": 0}));
        assert!(!entry.is_ok());
    }

    #[test]
    fn test_failed_entry() {
        let entry = LogEntry::failed("RiskAssessmentAgent", "bad price");
        assert_eq!(entry.status, AgentStatus::Failed);
        assert_eq!(entry.message, "Stage failed: bad price");
        assert!(entry.output.is_null());
    }

    #[test]
    fn test_from_snapshot() {
        #[derive(Serialize)]
        struct Snapshot {
            risk_score: u8,
        }

        let entry = LogEntry::from_snapshot("RiskAssessmentAgent", "ok", &Snapshot { risk_score: 58 });
        assert_eq!(entry.output, json!({"risk_score": 58}));
        assert!(entry.is_ok());
    }
}
