//! Final report schema
//!
//! An [`IntelligenceReport`] is the canonical report plus the legacy fields
//! older consumers still read. The legacy half is always projected from the
//! canonical half, never authored separately, so the two cannot disagree.

use crate::error::Result;
use crate::metrics::{UncertaintyRange, legacy_recommendation};
use crate::providers::{ForecastCurve, MarketContext, PricePoint};
use crate::types::{
    BuyWindow, ForecastMethod, LegacyConfidence, LegacyRecommendation, Recommendation, ShapFactor,
    TrendDirection, TrendStrength, Volatility,
};
use agent_core::LogEntry;
use serde::{Deserialize, Serialize};

/// Trend descriptor reported to consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendData {
    pub direction: TrendDirection,
    pub strength: TrendStrength,
    pub momentum_score: f64,
}

/// Engineered features behind the trend analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataFeatures {
    pub ma_30: f64,
    pub ma_90: f64,
    pub depreciation_rate: f64,
    pub seasonal_factor: f64,
}

/// Fields every consumer relies on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalReport {
    pub vehicle_name: String,
    pub predicted_90_day_change: f64,
    pub projected_price: f64,
    pub current_price: f64,
    pub confidence_score: u8,
    pub volatility_index: Volatility,
    pub risk_score: u8,
    pub final_recommendation: Recommendation,
    pub reasoning_summary: [String; 3],
    pub uncertainty_range: UncertaintyRange,
    pub transparency_note: String,
    pub bias_statement: String,
    pub ethics_disclaimer: String,
    pub agent_log: Vec<LogEntry>,
    pub trend_data: TrendData,
    pub data_features: DataFeatures,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    pub predicted_price: f64,
    pub shap_factors: Vec<ShapFactor>,
}

/// Price analysis as the narrative model reported it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAnalysis {
    pub forecast_30d: f64,
    pub forecast_90d: f64,
    pub trend_direction: TrendDirection,
    pub key_insight: String,
    pub best_time_to_buy: BuyWindow,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedRecommendation {
    pub recommendation: LegacyRecommendation,
    pub confidence: LegacyConfidence,
    pub rationale: String,
    pub predicted_price: f64,
    pub forecast_30d: f64,
    pub forecast_90d: f64,
}

/// Raw per-tool outputs kept for legacy consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutputs {
    pub get_price_history: Vec<PricePoint>,
    pub run_forecast: ForecastCurve,
    pub get_market_context: MarketContext,
    pub run_price_prediction: PricePrediction,
    pub run_llm_price_analysis: PriceAnalysis,
    pub synthesize_recommendation: SynthesizedRecommendation,
}

/// Values the legacy projection needs beyond the canonical report
#[derive(Debug, Clone, PartialEq)]
pub struct CompatInputs {
    pub legacy_confidence: LegacyConfidence,
    pub forecast_30d: f64,
    pub forecast_method: ForecastMethod,
    pub llm_key_insight: String,
    pub shap_factors: Vec<ShapFactor>,
    pub price_history: Vec<PricePoint>,
    pub forecast_curve: ForecastCurve,
    pub market_context: MarketContext,
    pub price_analysis: PriceAnalysis,
    pub decision_rationale: String,
}

/// Backwards-compatible fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyFields {
    pub recommendation: LegacyRecommendation,
    pub confidence: LegacyConfidence,
    pub explanation: String,
    pub predicted_price: f64,
    pub forecast_30d: f64,
    pub forecast_90d: f64,
    pub forecast_method: ForecastMethod,
    pub llm_key_insight: String,
    pub tool_outputs: ToolOutputs,
    pub shap_factors: Vec<ShapFactor>,
}

impl LegacyFields {
    /// Project the legacy view of `canonical`
    pub fn project(canonical: &CanonicalReport, compat: CompatInputs) -> Self {
        let recommendation = legacy_recommendation(canonical.final_recommendation);
        let predicted_price = canonical.current_price;
        let forecast_90d = canonical.projected_price;

        let tool_outputs = ToolOutputs {
            get_price_history: compat.price_history,
            run_forecast: compat.forecast_curve,
            get_market_context: compat.market_context,
            run_price_prediction: PricePrediction {
                predicted_price,
                shap_factors: compat.shap_factors.clone(),
            },
            run_llm_price_analysis: compat.price_analysis,
            synthesize_recommendation: SynthesizedRecommendation {
                recommendation,
                confidence: compat.legacy_confidence,
                rationale: compat.decision_rationale,
                predicted_price,
                forecast_30d: compat.forecast_30d,
                forecast_90d,
            },
        };

        Self {
            recommendation,
            confidence: compat.legacy_confidence,
            explanation: canonical.reasoning_summary.join(" "),
            predicted_price,
            forecast_30d: compat.forecast_30d,
            forecast_90d,
            forecast_method: compat.forecast_method,
            llm_key_insight: compat.llm_key_insight,
            tool_outputs,
            shap_factors: compat.shap_factors,
        }
    }
}

/// The merged response document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntelligenceReport {
    #[serde(flatten)]
    pub canonical: CanonicalReport,
    #[serde(flatten)]
    pub legacy: LegacyFields,
}

impl IntelligenceReport {
    pub fn assemble(canonical: CanonicalReport, compat: CompatInputs) -> Self {
        let legacy = LegacyFields::project(&canonical, compat);
        Self { canonical, legacy }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
