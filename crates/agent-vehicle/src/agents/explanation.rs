//! Explanation agent

use agent_core::{Agent, LogEntry, Result, StageError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::call_with_timeout;
use crate::engine::PipelineContext;
use crate::engine::log_builder::{EXPLANATION_AGENT, ExplanationSnapshot, explanation_entry};
use crate::providers::template::render_narrative;
use crate::providers::{ExplanationProvider, ExplanationRequest, GeneratedNarrative, NarrativeMethod};
use crate::types::Recommendation;

/// Three reasoning statements and their flattened text
#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationOutput {
    pub reasoning_summary: [String; 3],
    /// Statements joined with single spaces
    pub explanation_text: String,
    pub generator: String,
    pub method: NarrativeMethod,
    pub recommendation: Recommendation,
}

impl ExplanationOutput {
    fn from_narrative(narrative: GeneratedNarrative, recommendation: Recommendation) -> Result<Self> {
        let statements: Vec<String> = narrative
            .statements
            .into_iter()
            .map(|s| s.trim().to_string())
            .collect();
        if statements.iter().any(String::is_empty) {
            return Err(StageError::recoverable("generator returned an empty statement"));
        }
        let reasoning_summary: [String; 3] = statements.try_into().map_err(|v: Vec<String>| {
            StageError::recoverable(format!(
                "generator returned {} statements instead of 3",
                v.len()
            ))
        })?;

        Ok(Self {
            explanation_text: reasoning_summary.join(" "),
            reasoning_summary,
            generator: narrative.generator,
            method: narrative.method,
            recommendation,
        })
    }
}

/// Agent turning the analysis into a three-point narrative
pub struct ExplanationAgent {
    generator: Arc<dyn ExplanationProvider>,
    timeout: Duration,
}

impl ExplanationAgent {
    pub fn new(generator: Arc<dyn ExplanationProvider>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }
}

fn explanation_request(context: &PipelineContext) -> Result<ExplanationRequest> {
    let query = context.query();
    let data = context.require_data()?;
    let trend = context.require_trend()?;
    let forecast = context.require_forecast()?;
    let risk = context.require_risk()?;
    let decision = context.require_decision()?;

    Ok(ExplanationRequest {
        vehicle: query.display_name(),
        mileage: query.mileage(),
        condition: query.condition().to_string(),
        region: query.region().to_string(),
        predicted_price: forecast.predicted_price,
        predicted_90_day_change: risk.predicted_90_day_change,
        confidence_score: forecast.confidence_base,
        volatility: risk.volatility,
        final_recommendation: decision.final_recommendation,
        decision_rationale: decision.rationale.clone(),
        key_insight: forecast.key_insight.clone(),
        trend_direction: trend.trend.direction,
        inventory_trend: data.market_context.inventory_trend,
    })
}

#[async_trait]
impl Agent<PipelineContext> for ExplanationAgent {
    type Output = ExplanationOutput;

    fn name(&self) -> &str {
        EXPLANATION_AGENT
    }

    async fn run(&self, context: &PipelineContext) -> Result<ExplanationOutput> {
        let request = explanation_request(context)?;
        let narrative =
            call_with_timeout(self.timeout, self.generator.explain(&request)).await?;
        tracing::debug!(generator = %narrative.generator, "narrative generated");
        ExplanationOutput::from_narrative(narrative, request.final_recommendation)
    }

    /// Narrative rendered from the local templates
    fn fallback(&self, context: &PipelineContext) -> Option<ExplanationOutput> {
        let request = explanation_request(context).ok()?;
        let narrative = render_narrative(&request).ok()?;
        ExplanationOutput::from_narrative(narrative, request.final_recommendation).ok()
    }

    fn describe(&self, output: &ExplanationOutput) -> LogEntry {
        explanation_entry(&ExplanationSnapshot {
            reasoning_bullets: output.reasoning_summary.len(),
            method: output.method,
            recommendation: output.recommendation,
            generator: output.generator.clone(),
        })
    }
}
