//! Report production engine
//!
//! Coordination layer between the request entry point and the two report
//! producers.

pub mod context;
pub mod log_builder;
pub mod orchestrator;
pub mod producer;
pub mod report;

pub use context::PipelineContext;
pub use log_builder::ExecutionLogBuilder;
pub use orchestrator::Orchestrator;
pub use producer::{
    Collaborators, FixtureProducer, LivePipelineProducer, MarketCache, ReportProducer,
};
pub use report::{CanonicalReport, CompatInputs, IntelligenceReport, LegacyFields};
