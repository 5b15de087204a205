//! Core abstractions for staged analytic pipelines
//!
//! This crate defines the contract every pipeline stage satisfies: the
//! [`Agent`] trait, the [`AgentOutput`] payload/log pair, the [`LogEntry`]
//! record and the [`StageError`] type.

pub mod agent;
pub mod error;
pub mod log;

pub use agent::{Agent, AgentOutput};
pub use error::{Result, StageError};
pub use log::{AgentStatus, LogEntry};
