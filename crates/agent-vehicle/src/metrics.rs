//! Derived metrics shared by the override and live paths
//!
//! Both report producers go through these functions, so a fixture and a live
//! run with the same inputs always agree on every derived number.

use crate::types::{
    LegacyConfidence, LegacyRecommendation, Recommendation, TrendStrength, Volatility,
};
use serde::{Deserialize, Serialize};

/// Price band around a projected price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertaintyRange {
    pub low: f64,
    pub high: f64,
}

impl UncertaintyRange {
    pub fn contains(&self, price: f64) -> bool {
        self.low <= price && price <= self.high
    }
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);
    (value * factor).round() / factor
}

/// Price after applying a percentage change, rounded to cents
pub fn projected_price(current_price: f64, pct_change: f64) -> f64 {
    round_to(current_price * (1.0 + pct_change / 100.0), 2)
}

/// Symmetric band around `projected_price` sized by volatility
pub fn uncertainty_range(projected_price: f64, volatility: Volatility) -> UncertaintyRange {
    let sigma = volatility.sigma();
    UncertaintyRange {
        low: round_to(projected_price * (1.0 - sigma), 2),
        high: round_to(projected_price * (1.0 + sigma), 2),
    }
}

/// Momentum on a 0-100 scale centred at 50
pub fn momentum_score(pct_change: f64) -> f64 {
    round_to(50.0 + pct_change * 3.0, 1)
}

/// Three-band strength used by live trend analysis and execution logs
pub fn trend_strength(pct_change: f64) -> TrendStrength {
    let magnitude = pct_change.abs();
    if magnitude >= 3.0 {
        TrendStrength::Strong
    } else if magnitude >= 1.0 {
        TrendStrength::Moderate
    } else {
        TrendStrength::Weak
    }
}

/// Two-band strength reported for override fixtures
///
/// Legacy behaviour: the weak band is folded into moderate.
pub fn fixture_trend_strength(pct_change: f64) -> TrendStrength {
    if pct_change.abs() >= 3.0 {
        TrendStrength::Strong
    } else {
        TrendStrength::Moderate
    }
}

pub fn legacy_recommendation(recommendation: Recommendation) -> LegacyRecommendation {
    match recommendation {
        Recommendation::BuyNow => LegacyRecommendation::Buy,
        Recommendation::Wait => LegacyRecommendation::Wait,
        Recommendation::Monitor => LegacyRecommendation::Neutral,
    }
}

/// Confidence label for live reports; fixtures carry their own label
pub fn legacy_confidence(confidence_base: u8) -> LegacyConfidence {
    if confidence_base >= 75 {
        LegacyConfidence::High
    } else if confidence_base >= 55 {
        LegacyConfidence::Moderate
    } else {
        LegacyConfidence::Low
    }
}

/// 30-day point interpolated as a third of the 90-day change
pub fn forecast_30d(current_price: f64, pct_change_90d: f64) -> f64 {
    round_to(current_price * (1.0 + pct_change_90d / 300.0), 2)
}

/// Normalized 90-day percentage change, rounded to 2 places
///
/// Returns `None` for a non-positive or non-finite base price.
pub fn ninety_day_change(predicted_price: f64, forecast_90d: f64) -> Option<f64> {
    if !predicted_price.is_finite() || !forecast_90d.is_finite() || predicted_price <= 0.0 {
        return None;
    }
    Some(round_to(
        (forecast_90d - predicted_price) / predicted_price * 100.0,
        2,
    ))
}

/// Group an integer's digits in thousands (`2841` -> `"2,841"`)
pub fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        grouped.insert(0, '-');
    }
    grouped
}

/// Whole-dollar amount with thousands separators, without the `$`
pub fn whole_dollars(value: f64) -> String {
    group_thousands(value.round() as i64)
}
