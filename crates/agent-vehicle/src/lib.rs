//! Vehicle price intelligence pipeline
//!
//! This crate turns a vehicle identity into a structured price intelligence
//! report: a 90-day price outlook, confidence and volatility, a BUY NOW /
//! WAIT / MONITOR recommendation, three reasoning statements, ethics
//! disclosures and a per-stage execution log.
//!
//! # Architecture
//!
//! The [`Orchestrator`] checks the [`OverrideRegistry`] first. Registered
//! vehicles are served from a fixture; everything else runs seven live stages
//! in order over a shared `PipelineContext`:
//! - `DataAgent`: price history and market conditions
//! - `TrendAnalysisAgent`: trend curve, strength and momentum
//! - `ForecastAgent`: fair value and 30/90-day forecasts
//! - `RiskAssessmentAgent`: risk score, volatility and uncertainty band
//! - `DecisionAgent`: the recommendation
//! - `ExplanationAgent`: three reasoning statements
//! - `EthicsAgent`: transparency, bias and disclaimer text
//!
//! Both paths produce the same [`IntelligenceReport`] shape.
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_vehicle::{Collaborators, Orchestrator, OverrideRegistry, PipelineConfig};
//! use agent_vehicle::providers::StaticMarketData;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let orchestrator = Orchestrator::new(
//!         Arc::new(OverrideRegistry::builtin()?),
//!         Collaborators::reference(Arc::new(StaticMarketData::new())),
//!         PipelineConfig::from_env()?,
//!     );
//!
//!     let report = orchestrator.analyze("Tesla", "Model 3", 2021).await?;
//!     println!("{}", report.to_json_pretty()?);
//!
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod overrides;
pub mod providers;
pub mod query;
pub mod types;

// Re-export main types for convenience
pub use config::PipelineConfig;
pub use engine::{Collaborators, IntelligenceReport, Orchestrator};
pub use error::{PipelineError, Result, VehicleError};
pub use overrides::{OverrideRecord, OverrideRegistry};
pub use query::VehicleQuery;
pub use types::{Recommendation, Volatility};
