//! External collaborators consumed by the live stages
//!
//! The pipeline only depends on these traits. Each exposes one call per
//! stage and returns the stage's documented output shape or a
//! [`VehicleError`](crate::VehicleError). Reference implementations:
//!
//! - [`StaticMarketData`]: in-memory market data
//! - [`CachedMarketData`]: TTL cache over any market data provider
//! - [`BaselineForecaster`]: least-squares trend and rule-based pricing
//! - [`TemplateExplainer`]: MiniJinja-rendered reasoning statements

pub mod baseline;
pub mod market;
pub mod template;

pub use baseline::BaselineForecaster;
pub use market::{CachedMarketData, StaticMarketData};
pub use template::TemplateExplainer;

use crate::error::Result;
use crate::query::VehicleQuery;
use crate::types::{
    BuyWindow, ForecastMethod, InventoryTrend, Recommendation, ShapFactor, TrendDirection,
    Volatility,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Monthly average listing price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// First day of the month; serialized as `YYYY-MM`
    #[serde(with = "year_month")]
    pub date: NaiveDate,
    pub avg_price: f64,
    pub listing_count: u32,
}

/// Current market conditions for a vehicle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketContext {
    pub current_inventory_count: u32,
    pub inventory_trend: InventoryTrend,
    pub price_vs_median_pct: f64,
}

/// Everything the historical-price datastore returns for one vehicle
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketData {
    pub price_history: Vec<PricePoint>,
    pub market_context: MarketContext,
}

/// Trend model projection over the price history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastCurve {
    pub forecast_30d: f64,
    pub forecast_90d: f64,
    pub trend_direction: TrendDirection,
    /// 30-day percentage change
    pub trend_pct_change: f64,
    pub trend_pct_90d: f64,
    pub method: ForecastMethod,
    /// Omitted from the serialized curve when no price was observed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_known_price: Option<f64>,
}

impl ForecastCurve {
    /// Curve with no movement at `price` (zero when unknown)
    pub fn flat(price: Option<f64>) -> Self {
        let level = price.unwrap_or(0.0);
        Self {
            forecast_30d: level,
            forecast_90d: level,
            trend_direction: TrendDirection::Rising,
            trend_pct_change: 0.0,
            trend_pct_90d: 0.0,
            method: ForecastMethod::IndustryEstimate,
            last_known_price: price,
        }
    }
}

/// Inputs of the price model
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRequest {
    pub query: VehicleQuery,
    pub curve: ForecastCurve,
    pub market: MarketContext,
    /// Months of price history behind the curve
    pub history_months: usize,
}

/// Price model output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceForecast {
    pub predicted_price: f64,
    pub forecast_30d: f64,
    pub forecast_90d: f64,
    pub method: ForecastMethod,
    /// Confidence base on a 0-100 scale
    pub confidence_base: u8,
    pub factors: Vec<ShapFactor>,
    pub key_insight: String,
    pub best_time_to_buy: BuyWindow,
}

/// How a narrative was generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeMethod {
    LlmGeneration,
    Template,
}

/// Raw generator output, validated by the explanation stage
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedNarrative {
    pub statements: Vec<String>,
    /// Generator name shown in the execution log
    pub generator: String,
    pub method: NarrativeMethod,
}

/// Context handed to the explanation generator
#[derive(Debug, Clone, PartialEq)]
pub struct ExplanationRequest {
    pub vehicle: String,
    pub mileage: u32,
    pub condition: String,
    pub region: String,
    pub predicted_price: f64,
    pub predicted_90_day_change: f64,
    pub confidence_score: u8,
    pub volatility: Volatility,
    pub final_recommendation: Recommendation,
    pub decision_rationale: String,
    pub key_insight: String,
    pub trend_direction: TrendDirection,
    pub inventory_trend: InventoryTrend,
}

/// Historical-price and market-data datastore
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    async fn fetch_market_data(&self, query: &VehicleQuery) -> Result<MarketData>;
}

#[async_trait]
impl<T: MarketDataProvider + ?Sized> MarketDataProvider for Arc<T> {
    async fn fetch_market_data(&self, query: &VehicleQuery) -> Result<MarketData> {
        (**self).fetch_market_data(query).await
    }
}

/// Trend and price forecasting models
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Project the price curve from the history (which may be empty)
    async fn project_trend(
        &self,
        query: &VehicleQuery,
        history: &[PricePoint],
    ) -> Result<ForecastCurve>;

    /// Predict current fair value and the 30/90-day forecasts
    async fn predict_price(&self, request: &PriceRequest) -> Result<PriceForecast>;
}

/// Natural-language reasoning generator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExplanationProvider: Send + Sync {
    async fn explain(&self, request: &ExplanationRequest) -> Result<GeneratedNarrative>;
}

mod year_month {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format("%Y-%m").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_point_month_format() {
        let point = PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            avg_price: 35_200.0,
            listing_count: 312,
        };
        let value = serde_json::to_value(&point).unwrap();
        assert_eq!(
            value,
            json!({"date": "2024-01", "avg_price": 35200.0, "listing_count": 312})
        );

        let parsed: PricePoint = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, point);
    }

    #[test]
    fn test_flat_curve() {
        let curve = ForecastCurve::flat(Some(18_000.0));
        assert!((curve.forecast_90d - 18_000.0).abs() < f64::EPSILON);
        assert_eq!(curve.trend_direction, TrendDirection::Rising);
        assert_eq!(curve.method, ForecastMethod::IndustryEstimate);

        let unknown = ForecastCurve::flat(None);
        assert!(unknown.last_known_price.is_none());
        let value = serde_json::to_value(&unknown).unwrap();
        assert!(value.get("last_known_price").is_none());
    }
}
