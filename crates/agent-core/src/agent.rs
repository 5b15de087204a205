//! Core Agent trait definition

use crate::{LogEntry, Result};
use async_trait::async_trait;

/// Result of one stage: its payload plus exactly one log entry
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput<T> {
    /// Stage-specific payload
    pub payload: T,
    /// The single log entry describing this run
    pub log_entry: LogEntry,
}

impl<T> AgentOutput<T> {
    /// Pair a payload with its log entry
    pub fn new(payload: T, log_entry: LogEntry) -> Self {
        Self { payload, log_entry }
    }
}

/// Core trait that all pipeline stages implement
///
/// `C` is the context the stage reads prior outputs from. Stages never
/// mutate the context; the orchestrator stores each payload after the stage
/// returns.
#[async_trait]
pub trait Agent<C>: Send + Sync
where
    C: Sync,
{
    /// Payload produced by a successful run
    type Output: Send + Sync;

    /// Get the agent's name, as it appears in the execution log
    fn name(&self) -> &str;

    /// Run the stage against the accumulated context
    async fn run(&self, context: &C) -> Result<Self::Output>;

    /// Neutral payload used after a recoverable failure
    ///
    /// `None` means the stage has no meaningful default and the pipeline
    /// must abort even on recoverable errors.
    fn fallback(&self, _context: &C) -> Option<Self::Output> {
        None
    }

    /// Build the log entry describing a payload
    fn describe(&self, output: &Self::Output) -> LogEntry;
}
