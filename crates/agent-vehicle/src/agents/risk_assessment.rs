//! Risk assessment agent
//!
//! Risk score is `|Δ90| × 8 + (100 − confidence)`, plus 15 without price
//! history and 5 when the inventory trend is unknown, clamped to 0-100.
//! Scores below 45 are Low volatility, below 65 Moderate, otherwise High.

use agent_core::{Agent, LogEntry, Result, StageError};
use async_trait::async_trait;

use crate::engine::PipelineContext;
use crate::engine::log_builder::{RISK_AGENT, RiskSnapshot, risk_entry};
use crate::metrics::{UncertaintyRange, ninety_day_change, round_to, uncertainty_range};
use crate::types::{InventoryTrend, Volatility};

const CHANGE_WEIGHT: f64 = 8.0;
const NO_HISTORY_PENALTY: f64 = 15.0;
const UNKNOWN_INVENTORY_PENALTY: f64 = 5.0;
const LOW_BELOW: u8 = 45;
const MODERATE_BELOW: u8 = 65;
const NEUTRAL_RISK: u8 = 50;

/// Output of the risk stage
#[derive(Debug, Clone, PartialEq)]
pub struct RiskOutput {
    pub volatility: Volatility,
    pub risk_score: u8,
    pub uncertainty_range: UncertaintyRange,
    pub predicted_90_day_change: f64,
}

/// Risk score for the given signal quality
pub fn risk_score(
    pct_change_90d: f64,
    confidence: u8,
    has_history: bool,
    inventory_trend: InventoryTrend,
) -> u8 {
    let mut score = pct_change_90d.abs() * CHANGE_WEIGHT + (100.0 - f64::from(confidence));
    if !has_history {
        score += NO_HISTORY_PENALTY;
    }
    if inventory_trend == InventoryTrend::Unknown {
        score += UNKNOWN_INVENTORY_PENALTY;
    }
    score.round().clamp(0.0, 100.0) as u8
}

pub fn volatility_for(risk_score: u8) -> Volatility {
    if risk_score < LOW_BELOW {
        Volatility::Low
    } else if risk_score < MODERATE_BELOW {
        Volatility::Moderate
    } else {
        Volatility::High
    }
}

/// Agent scoring forecast risk and sizing the uncertainty band
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskAssessmentAgent;

impl RiskAssessmentAgent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent<PipelineContext> for RiskAssessmentAgent {
    type Output = RiskOutput;

    fn name(&self) -> &str {
        RISK_AGENT
    }

    async fn run(&self, context: &PipelineContext) -> Result<RiskOutput> {
        let forecast = context.require_forecast()?;
        let data = context.require_data()?;

        let change = ninety_day_change(forecast.predicted_price, forecast.forecast_90d)
            .ok_or_else(|| {
                StageError::malformed(
                    "price forecast",
                    format!(
                        "predicted price {} cannot anchor a percentage change",
                        forecast.predicted_price
                    ),
                )
            })?;

        let risk_score = risk_score(
            change,
            forecast.confidence_base,
            data.has_history,
            data.market_context.inventory_trend,
        );
        let volatility = volatility_for(risk_score);

        Ok(RiskOutput {
            volatility,
            risk_score,
            uncertainty_range: uncertainty_range(round_to(forecast.forecast_90d, 2), volatility),
            predicted_90_day_change: change,
        })
    }

    fn fallback(&self, context: &PipelineContext) -> Option<RiskOutput> {
        let forecast = context.forecast.as_ref()?;
        let volatility = Volatility::Moderate;
        Some(RiskOutput {
            volatility,
            risk_score: NEUTRAL_RISK,
            uncertainty_range: uncertainty_range(round_to(forecast.forecast_90d, 2), volatility),
            predicted_90_day_change: ninety_day_change(
                forecast.predicted_price,
                forecast.forecast_90d,
            )
            .unwrap_or(0.0),
        })
    }

    fn describe(&self, output: &RiskOutput) -> LogEntry {
        risk_entry(&RiskSnapshot {
            volatility_index: output.volatility,
            risk_score: output.risk_score,
            predicted_90_day_change: output.predicted_90_day_change,
        })
    }
}
