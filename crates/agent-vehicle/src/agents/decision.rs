//! Decision synthesis agent
//!
//! Ordered rules, first match wins:
//!
//! 1. change ≤ −3% and confidence ≥ 75 → WAIT
//! 2. change ≥ +2% and Low volatility → BUY NOW
//! 3. otherwise → MONITOR

use agent_core::{Agent, LogEntry, Result};
use async_trait::async_trait;

use crate::engine::PipelineContext;
use crate::engine::log_builder::{DECISION_AGENT, DecisionSnapshot, decision_entry};
use crate::types::{Recommendation, Volatility};

const WAIT_MAX_CHANGE: f64 = -3.0;
const WAIT_MIN_CONFIDENCE: u8 = 75;
const BUY_MIN_CHANGE: f64 = 2.0;

/// The rule that produced a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionRule {
    FallingWithConfidence,
    RisingWithLowVolatility,
    NoStrongSignal,
}

impl DecisionRule {
    /// Label shown in the execution log
    pub fn label(self) -> &'static str {
        match self {
            Self::FallingWithConfidence => "falling >3% + conf ≥75",
            Self::RisingWithLowVolatility => "rising ≥2% + Low volatility",
            Self::NoStrongSignal => "no strong signal",
        }
    }

    pub fn recommendation(self) -> Recommendation {
        match self {
            Self::FallingWithConfidence => Recommendation::Wait,
            Self::RisingWithLowVolatility => Recommendation::BuyNow,
            Self::NoStrongSignal => Recommendation::Monitor,
        }
    }
}

/// Apply the decision rules
pub fn decide(
    pct_change_90d: f64,
    confidence: u8,
    volatility: Volatility,
) -> (Recommendation, DecisionRule) {
    let rule = if pct_change_90d <= WAIT_MAX_CHANGE && confidence >= WAIT_MIN_CONFIDENCE {
        DecisionRule::FallingWithConfidence
    } else if pct_change_90d >= BUY_MIN_CHANGE && volatility == Volatility::Low {
        DecisionRule::RisingWithLowVolatility
    } else {
        DecisionRule::NoStrongSignal
    };
    (rule.recommendation(), rule)
}

/// One-sentence justification of a decision
pub fn rationale(
    rule: DecisionRule,
    pct_change_90d: f64,
    confidence: u8,
    price_vs_median_pct: f64,
) -> String {
    let pricing = if price_vs_median_pct > 0.0 {
        format!("listings sit {price_vs_median_pct:.1}% above the regional median")
    } else if price_vs_median_pct < 0.0 {
        format!("listings sit {:.1}% below the regional median", price_vs_median_pct.abs())
    } else {
        "listings are priced at the regional median".to_string()
    };

    match rule {
        DecisionRule::FallingWithConfidence => format!(
            "prices are forecast to fall {:.1}% with {confidence}% confidence, and {pricing}.",
            pct_change_90d.abs()
        ),
        DecisionRule::RisingWithLowVolatility => format!(
            "prices are forecast to rise {pct_change_90d:.1}% in a low-volatility market, and {pricing}."
        ),
        DecisionRule::NoStrongSignal => format!(
            "a {pct_change_90d:+.1}% outlook is not a strong enough signal to act on, and {pricing}."
        ),
    }
}

/// Output of the decision stage
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionOutput {
    pub final_recommendation: Recommendation,
    pub rule: DecisionRule,
    pub rationale: String,
    /// Inputs the decision was taken on
    pub confidence_score: u8,
    pub volatility: Volatility,
}

/// Agent applying the decision rules to the risk assessment
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionAgent;

impl DecisionAgent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent<PipelineContext> for DecisionAgent {
    type Output = DecisionOutput;

    fn name(&self) -> &str {
        DECISION_AGENT
    }

    async fn run(&self, context: &PipelineContext) -> Result<DecisionOutput> {
        let risk = context.require_risk()?;
        let forecast = context.require_forecast()?;
        let market = &context.require_data()?.market_context;

        let change = risk.predicted_90_day_change;
        let (final_recommendation, rule) =
            decide(change, forecast.confidence_base, risk.volatility);
        tracing::debug!(rule = rule.label(), %final_recommendation, "decision rule matched");

        Ok(DecisionOutput {
            final_recommendation,
            rule,
            rationale: rationale(
                rule,
                change,
                forecast.confidence_base,
                market.price_vs_median_pct,
            ),
            confidence_score: forecast.confidence_base,
            volatility: risk.volatility,
        })
    }

    fn fallback(&self, context: &PipelineContext) -> Option<DecisionOutput> {
        Some(DecisionOutput {
            final_recommendation: Recommendation::Monitor,
            rule: DecisionRule::NoStrongSignal,
            rationale: "no decision signal was available.".to_string(),
            confidence_score: context.forecast.as_ref().map_or(0, |f| f.confidence_base),
            volatility: context
                .risk
                .as_ref()
                .map_or(Volatility::Moderate, |r| r.volatility),
        })
    }

    fn describe(&self, output: &DecisionOutput) -> LogEntry {
        decision_entry(&DecisionSnapshot {
            final_recommendation: output.final_recommendation,
            confidence_score: output.confidence_score,
            volatility_index: output.volatility,
            rule: output.rule,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_examples() {
        assert_eq!(decide(-4.2, 82, Volatility::Moderate).0, Recommendation::Wait);
        assert_eq!(decide(2.4, 79, Volatility::Low).0, Recommendation::BuyNow);
        assert_eq!(decide(-1.3, 76, Volatility::Low).0, Recommendation::Monitor);
    }

    #[test]
    fn test_rule_boundaries() {
        assert_eq!(decide(-3.0, 75, Volatility::High).1, DecisionRule::FallingWithConfidence);
        assert_eq!(decide(-3.0, 74, Volatility::High).1, DecisionRule::NoStrongSignal);
        assert_eq!(decide(2.0, 10, Volatility::Low).1, DecisionRule::RisingWithLowVolatility);
        assert_eq!(decide(2.0, 90, Volatility::Moderate).1, DecisionRule::NoStrongSignal);
        assert_eq!(decide(1.99, 90, Volatility::Low).1, DecisionRule::NoStrongSignal);
    }

    #[test]
    fn test_first_match_wins() {
        // A falling forecast can never also satisfy the rising rule, but the
        // WAIT rule is checked first regardless of volatility
        let (rec, rule) = decide(-8.0, 95, Volatility::Low);
        assert_eq!(rec, Recommendation::Wait);
        assert_eq!(rule.label(), "falling >3% + conf ≥75");
    }

    #[test]
    fn test_rationale_mentions_pricing() {
        let text = rationale(DecisionRule::FallingWithConfidence, -4.2, 82, -2.1);
        assert_eq!(
            text,
            "prices are forecast to fall 4.2% with 82% confidence, and listings sit 2.1% below the regional median."
        );
        assert!(rationale(DecisionRule::NoStrongSignal, 0.5, 60, 0.0).contains("at the regional median"));
    }
}
