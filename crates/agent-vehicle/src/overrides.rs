//! Override registry of precomputed vehicle reports
//!
//! A registry hit bypasses the live stages entirely. Every derived number of
//! an override report is recomputed from the record's seeds with the shared
//! formulas in [`crate::metrics`], so a record only stores authored values.

use crate::agents::decision::decide;
use crate::error::{Result, VehicleError};
use crate::query::normalize_key;
use crate::types::{ForecastMethod, LegacyConfidence, Recommendation, Volatility};
use std::collections::HashMap;

/// Seed values a fixture derives its remaining numbers from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureSeeds {
    pub current_price: f64,
    pub inventory_count: u32,
    pub price_vs_median_pct: f64,
}

/// A complete precomputed fixture
#[derive(Debug, Clone, PartialEq)]
pub struct OverrideRecord {
    /// Normalized `"make model"` key
    pub key: String,
    pub predicted_90_day_change: f64,
    pub confidence_score: u8,
    pub volatility: Volatility,
    pub risk_score: u8,
    pub final_recommendation: Recommendation,
    pub reasoning_summary: [String; 3],
    pub transparency_note: String,
    pub bias_statement: String,
    /// Authored independently of the live confidence formula
    pub legacy_confidence: LegacyConfidence,
    pub forecast_method: ForecastMethod,
    pub seeds: FixtureSeeds,
}

impl OverrideRecord {
    fn validate(&self) -> Result<()> {
        let invalid = |reason: String| VehicleError::InvalidFixture {
            key: self.key.clone(),
            reason,
        };

        let normalized = self
            .key
            .split_once(' ')
            .filter(|(make, _)| !make.trim().is_empty())
            .map(|(make, model)| normalize_key(make, model));
        if normalized.as_deref() != Some(self.key.as_str()) {
            return Err(invalid("key is not a normalized \"make model\" pair".to_string()));
        }
        if self.reasoning_summary.iter().any(|s| s.trim().is_empty()) {
            return Err(invalid("reasoning statements must not be empty".to_string()));
        }
        if self.confidence_score > 100 {
            return Err(invalid(format!("confidence {} exceeds 100", self.confidence_score)));
        }
        if self.risk_score > 100 {
            return Err(invalid(format!("risk score {} exceeds 100", self.risk_score)));
        }
        if !self.seeds.current_price.is_finite() || self.seeds.current_price <= 0.0 {
            return Err(invalid("current price must be positive".to_string()));
        }

        let (expected, _) = decide(
            self.predicted_90_day_change,
            self.confidence_score,
            self.volatility,
        );
        if expected != self.final_recommendation {
            return Err(invalid(format!(
                "recommendation {} disagrees with decision rules ({expected})",
                self.final_recommendation
            )));
        }
        Ok(())
    }
}

/// Immutable table of fixtures keyed by normalized vehicle identity
#[derive(Debug, Clone, Default)]
pub struct OverrideRegistry {
    records: HashMap<String, OverrideRecord>,
}

impl OverrideRegistry {
    /// Build a registry, validating every record
    pub fn new(records: impl IntoIterator<Item = OverrideRecord>) -> Result<Self> {
        let mut map = HashMap::new();
        for record in records {
            record.validate()?;
            let key = record.key.clone();
            if map.insert(key.clone(), record).is_some() {
                return Err(VehicleError::InvalidFixture {
                    key,
                    reason: "duplicate key".to_string(),
                });
            }
        }
        Ok(Self { records: map })
    }

    /// Registry without fixtures; every lookup misses
    pub fn empty() -> Self {
        Self::default()
    }

    /// The six built-in demo fixtures
    pub fn builtin() -> Result<Self> {
        Self::new(builtin_records())
    }

    /// Exact-match lookup on the normalized key
    pub fn lookup(&self, make: &str, model: &str) -> Option<&OverrideRecord> {
        self.records.get(&normalize_key(make, model))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Registered keys in sorted order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.records.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    key: &str,
    change: f64,
    confidence: u8,
    volatility: Volatility,
    risk: u8,
    recommendation: Recommendation,
    reasoning: [&str; 3],
    transparency: &str,
    bias: &str,
    legacy_confidence: LegacyConfidence,
    seeds: FixtureSeeds,
) -> OverrideRecord {
    OverrideRecord {
        key: key.to_string(),
        predicted_90_day_change: change,
        confidence_score: confidence,
        volatility,
        risk_score: risk,
        final_recommendation: recommendation,
        reasoning_summary: reasoning.map(str::to_string),
        transparency_note: transparency.to_string(),
        bias_statement: bias.to_string(),
        legacy_confidence,
        forecast_method: ForecastMethod::LlmBlended,
        seeds,
    }
}

fn builtin_records() -> Vec<OverrideRecord> {
    vec![
        record(
            "tesla model 3",
            -4.2,
            82,
            Volatility::Moderate,
            58,
            Recommendation::Wait,
            [
                "The 2021 Tesla Model 3 shows a projected 4.2% price decline over 90 days driven by EV market saturation.",
                "With a confidence score of 82% and moderate volatility, the downward signal is reliable but not extreme.",
                "Waiting 30–90 days is likely to yield a better entry price as new EV inventory normalises.",
            ],
            "Forecast uses XGBoost + GPT-4o-mini blended model with 12 months of EV price history.",
            "EV market data is sparse pre-2020; federal subsidy policy changes can shift residual values significantly.",
            LegacyConfidence::High,
            FixtureSeeds {
                current_price: 35_200.0,
                inventory_count: 312,
                price_vs_median_pct: -2.1,
            },
        ),
        record(
            "toyota camry",
            -1.3,
            76,
            Volatility::Low,
            28,
            Recommendation::Monitor,
            [
                "The Toyota Camry is showing a modest 1.3% dip — insufficient to trigger a strong BUY or WAIT signal.",
                "With low volatility and 76% confidence, the Camry market is stable with no urgency to act immediately.",
                "Monitor for 30 days: a further decline below −3% would upgrade this to a clear BUY NOW opportunity.",
            ],
            "Prophet time-series forecast (3+ months data) blended with AI-enhanced analysis.",
            "Toyota Camry is one of the best-represented vehicles in training data — below-average model bias.",
            LegacyConfidence::Moderate,
            FixtureSeeds {
                current_price: 25_100.0,
                inventory_count: 2_841,
                price_vs_median_pct: 0.8,
            },
        ),
        record(
            "honda civic",
            2.4,
            79,
            Volatility::Low,
            22,
            Recommendation::BuyNow,
            [
                "The Honda Civic is forecast to rise 2.4% over 90 days with low volatility — an ideal buy window.",
                "Strong fuel efficiency demand and limited compact sedan inventory are driving upward price pressure.",
                "At 79% confidence with Low volatility, this represents a high-quality BUY NOW signal.",
            ],
            "Blended XGBoost + LLM forecast using 8 months of Civic price history.",
            "Honda Civic is well-represented in training data — below-average uncertainty for this vehicle.",
            LegacyConfidence::High,
            FixtureSeeds {
                current_price: 22_400.0,
                inventory_count: 1_983,
                price_vs_median_pct: -3.4,
            },
        ),
        record(
            "ford f-150",
            -3.8,
            81,
            Volatility::Moderate,
            52,
            Recommendation::Wait,
            [
                "The Ford F-150 is projected to decline 3.8% over 90 days as new model inventory recovers.",
                "Moderate volatility reflects uncertainty between regional truck demand and national oversupply.",
                "With 81% confidence on a falling trend, waiting likely saves $1,000–$1,500 on this purchase.",
            ],
            "F-150 forecast integrates regional inventory data with national trend signals.",
            "Truck segment pricing shows high regional variance — national averages may not reflect local markets.",
            LegacyConfidence::High,
            FixtureSeeds {
                current_price: 33_800.0,
                inventory_count: 4_217,
                price_vs_median_pct: 1.2,
            },
        ),
        record(
            "jeep wrangler",
            3.1,
            84,
            Volatility::Low,
            18,
            Recommendation::BuyNow,
            [
                "The Jeep Wrangler is rising 3.1% in 90 days — strong off-road demand and tight dealer inventory drive prices up.",
                "With 84% confidence and low volatility, this is one of the strongest BUY NOW signals in the current market.",
                "Wranglers hold value exceptionally well — buy now before spring off-road season drives prices higher.",
            ],
            "Forecast uses Prophet model with 14 months of Wrangler-specific price history.",
            "Off-road/adventure segments show high regional variance not fully captured by national averages.",
            LegacyConfidence::High,
            FixtureSeeds {
                current_price: 38_600.0,
                inventory_count: 892,
                price_vs_median_pct: -4.2,
            },
        ),
        record(
            "bmw 3 series",
            -5.6,
            78,
            Volatility::High,
            72,
            Recommendation::Wait,
            [
                "The BMW 3 Series faces a steep 5.6% price decline as luxury segment buyers shift toward EVs and newer models.",
                "High volatility (risk score 72/100) reflects maintenance cost uncertainty and financing rate sensitivity.",
                "Strong WAIT signal: waiting 90 days could save $2,000–$3,000 on this purchase.",
            ],
            "Luxury vehicle data is underrepresented — confidence reflects model uncertainty for this segment.",
            "Luxury vehicle maintenance costs and out-of-warranty risk are not factored into this price prediction.",
            LegacyConfidence::Moderate,
            FixtureSeeds {
                current_price: 41_200.0,
                inventory_count: 274,
                price_vs_median_pct: 3.8,
            },
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = OverrideRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 6);
        assert_eq!(
            registry.keys(),
            vec![
                "bmw 3 series",
                "ford f-150",
                "honda civic",
                "jeep wrangler",
                "tesla model 3",
                "toyota camry",
            ]
        );
    }

    #[test]
    fn test_lookup_normalizes_identity() {
        let registry = OverrideRegistry::builtin().unwrap();
        let record = registry.lookup("  Tesla", "MODEL 3 ").unwrap();
        assert_eq!(record.final_recommendation, Recommendation::Wait);
        assert_eq!(record.confidence_score, 82);
        assert!((record.seeds.current_price - 35_200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_lookup_miss_is_none() {
        let registry = OverrideRegistry::builtin().unwrap();
        assert!(registry.lookup("tesla", "model y").is_none());
        assert!(registry.lookup("teslamodel", "3").is_none());
        assert!(OverrideRegistry::empty().lookup("tesla", "model 3").is_none());
    }

    #[test]
    fn test_fixture_legacy_confidence_is_authored() {
        let registry = OverrideRegistry::builtin().unwrap();
        let camry = registry.lookup("toyota", "camry").unwrap();
        assert_eq!(camry.confidence_score, 76);
        assert_eq!(camry.legacy_confidence, LegacyConfidence::Moderate);
    }

    #[test]
    fn test_inconsistent_fixture_rejected() {
        let mut bad = builtin_records().remove(0);
        bad.final_recommendation = Recommendation::BuyNow;
        assert!(matches!(
            OverrideRegistry::new(vec![bad]),
            Err(VehicleError::InvalidFixture { .. })
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let records = builtin_records();
        let dup = vec![records[0].clone(), records[0].clone()];
        assert!(OverrideRegistry::new(dup).is_err());
    }

    #[test]
    fn test_empty_reasoning_rejected() {
        let mut bad = builtin_records().remove(1);
        bad.reasoning_summary[2] = "  ".to_string();
        assert!(OverrideRegistry::new(vec![bad]).is_err());
    }

    #[test]
    fn test_unnormalized_key_rejected() {
        for key in ["Tesla Model 3", " tesla model 3", "tesla model 3 ", "tesla", "tesla  model 3"] {
            let mut bad = builtin_records().remove(0);
            bad.key = key.to_string();
            assert!(
                matches!(
                    OverrideRegistry::new(vec![bad]),
                    Err(VehicleError::InvalidFixture { .. })
                ),
                "{key:?}"
            );
        }
    }
}
