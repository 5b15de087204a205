//! Request entry point
//!
//! The orchestrator checks the override registry once per request and hands
//! the query to exactly one producer. A hit is served from the fixture; a
//! miss runs the live stages.

use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use super::producer::{Collaborators, FixtureProducer, LivePipelineProducer, ReportProducer};
use super::report::IntelligenceReport;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::overrides::{OverrideRecord, OverrideRegistry};
use crate::query::VehicleQuery;

/// Vehicle price intelligence orchestrator
pub struct Orchestrator {
    registry: Arc<OverrideRegistry>,
    live: LivePipelineProducer,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<OverrideRegistry>,
        collaborators: Collaborators,
        config: PipelineConfig,
    ) -> Self {
        Self {
            live: LivePipelineProducer::new(collaborators, &config),
            registry,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &OverrideRegistry {
        &self.registry
    }

    /// Drop cached market data for the query's vehicle and model year
    pub async fn invalidate_market_data(&self, query: &VehicleQuery) {
        self.live.market_cache().invalidate(query).await;
    }

    /// Drop all cached market data
    pub async fn clear_market_cache(&self) {
        self.live.market_cache().clear().await;
    }

    fn lookup(&self, query: &VehicleQuery) -> Option<&OverrideRecord> {
        if !self.config.overrides_enabled {
            return None;
        }
        self.registry.lookup(query.make(), query.model())
    }

    /// Produce the intelligence report for `query`
    pub async fn run_pipeline(
        &self,
        query: &VehicleQuery,
    ) -> Result<IntelligenceReport, PipelineError> {
        let vehicle = query.display_name();
        let span = tracing::info_span!(
            "pipeline",
            request_id = %Uuid::new_v4(),
            vehicle = %vehicle
        );

        async {
            let fixture;
            let producer: &dyn ReportProducer = match self.lookup(query) {
                Some(record) => {
                    tracing::info!(key = %record.key, "serving override fixture");
                    fixture = FixtureProducer::new(record);
                    &fixture
                }
                None => {
                    tracing::info!("running live pipeline");
                    &self.live
                }
            };

            let report = producer.produce(query).await;
            match &report {
                Ok(report) => tracing::info!(
                    recommendation = %report.canonical.final_recommendation,
                    confidence = report.canonical.confidence_score,
                    "report ready"
                ),
                Err(err) => tracing::error!(error = %err, "pipeline aborted"),
            }
            report
        }
        .instrument(span)
        .await
    }

    /// [`run_pipeline`](Self::run_pipeline) with default mileage, condition
    /// and region
    pub async fn analyze(
        &self,
        make: &str,
        model: &str,
        year: i32,
    ) -> Result<IntelligenceReport, PipelineError> {
        let query = VehicleQuery::new(make, model, year)?;
        self.run_pipeline(&query).await
    }
}
