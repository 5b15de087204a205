//! Shared domain vocabulary
//!
//! Labels serialize exactly as they appear in the report schema
//! (`"BUY NOW"`, `"Moderate"`, `"llm_blended"`, ...).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse risk category driving the uncertainty band width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Volatility {
    Low,
    Moderate,
    High,
}

impl Volatility {
    /// Half-width of the uncertainty band as a fraction of the projected price
    pub fn sigma(self) -> f64 {
        match self {
            Self::Low => 0.04,
            Self::Moderate => 0.08,
            Self::High => 0.14,
        }
    }

    /// Half-width of the uncertainty band in whole percent
    pub fn sigma_percent(self) -> u8 {
        match self {
            Self::Low => 4,
            Self::Moderate => 8,
            Self::High => 14,
        }
    }

    /// Parse a label; unrecognized labels fall back to `Moderate`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "high" => Self::High,
            _ => Self::Moderate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final purchase recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "BUY NOW")]
    BuyNow,
    #[serde(rename = "WAIT")]
    Wait,
    #[serde(rename = "MONITOR")]
    Monitor,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BuyNow => "BUY NOW",
            Self::Wait => "WAIT",
            Self::Monitor => "MONITOR",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recommendation label of the pre-pipeline schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LegacyRecommendation {
    Buy,
    Wait,
    Neutral,
}

/// Confidence label of the pre-pipeline schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LegacyConfidence {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Rising,
    Falling,
}

impl TrendDirection {
    /// Direction of a signed percentage change; zero counts as rising
    pub fn of_change(pct_change: f64) -> Self {
        if pct_change < 0.0 {
            Self::Falling
        } else {
            Self::Rising
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStrength {
    Weak,
    Moderate,
    Strong,
}

impl TrendStrength {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Moderate => "moderate",
            Self::Strong => "strong",
        }
    }
}

impl fmt::Display for TrendStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of active listing counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryTrend {
    Rising,
    Falling,
    Stable,
    #[default]
    Unknown,
}

impl InventoryTrend {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for InventoryTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag identifying how a forecast was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastMethod {
    Prophet,
    Xgboost,
    LlmBlended,
    #[serde(rename = "linear")]
    LinearTrend,
    #[serde(rename = "industry_default")]
    IndustryEstimate,
}

impl ForecastMethod {
    /// Tag as serialized
    pub fn tag(self) -> &'static str {
        match self {
            Self::Prophet => "prophet",
            Self::Xgboost => "xgboost",
            Self::LlmBlended => "llm_blended",
            Self::LinearTrend => "linear",
            Self::IndustryEstimate => "industry_default",
        }
    }

    /// Label used in log messages and transparency notes
    pub fn label(self) -> &'static str {
        match self {
            Self::Prophet => "Prophet",
            Self::Xgboost => "XGBoost",
            Self::LlmBlended => "LLM-blended",
            Self::LinearTrend => "Linear-trend",
            Self::IndustryEstimate => "Industry-estimate",
        }
    }

    /// Name of the model behind the fair-value estimate
    pub fn fair_value_source(self) -> &'static str {
        match self {
            Self::Prophet => "Prophet",
            Self::Xgboost | Self::LlmBlended => "XGBoost",
            Self::LinearTrend => "Linear-trend",
            Self::IndustryEstimate => "Industry",
        }
    }
}

impl fmt::Display for ForecastMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Suggested purchase window from the price analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuyWindow {
    #[serde(rename = "now")]
    Now,
    #[serde(rename = "wait")]
    Wait,
    #[serde(rename = "30_days")]
    ThirtyDays,
}

impl BuyWindow {
    /// Window implied by a final recommendation
    pub fn for_recommendation(recommendation: Recommendation) -> Self {
        match recommendation {
            Recommendation::BuyNow => Self::Now,
            Recommendation::Wait => Self::Wait,
            Recommendation::Monitor => Self::ThirtyDays,
        }
    }
}

/// Result of the never-blocking fairness review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FairnessCheck {
    Passed,
    Failed,
}

impl FairnessCheck {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
        }
    }
}

/// A feature's signed contribution to the price prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapFactor {
    pub feature: String,
    /// Signed weight in dollars
    pub impact: f64,
    /// `"increases price"` or `"decreases price"`
    pub direction: String,
}

impl ShapFactor {
    pub fn new(feature: impl Into<String>, impact: f64) -> Self {
        let direction = if impact >= 0.0 {
            "increases price"
        } else {
            "decreases price"
        };
        Self {
            feature: feature.into(),
            impact,
            direction: direction.to_string(),
        }
    }
}
