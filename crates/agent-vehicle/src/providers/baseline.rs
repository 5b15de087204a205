//! Baseline forecasting collaborator
//!
//! A least-squares trend over monthly prices plus rule-based fair value
//! adjustments. Good enough to drive the pipeline without a model server.

use super::{ForecastCurve, ForecastProvider, PriceForecast, PricePoint, PriceRequest};
use crate::error::{Result, VehicleError};
use crate::metrics::round_to;
use crate::query::{DEFAULT_MILEAGE, VehicleQuery};
use crate::types::{BuyWindow, ForecastMethod, InventoryTrend, ShapFactor, TrendDirection};
use async_trait::async_trait;
use chrono::{Datelike, Utc};

/// Fair value change per 10,000 miles above the 50,000 mile baseline
const MILEAGE_RATE_PER_10K: f64 = -0.004;

/// Average transaction price of a new vehicle
const NEW_VEHICLE_PRICE: f64 = 38_000.0;
const ANNUAL_DEPRECIATION: f64 = 0.15;
/// Share of the new price a very old vehicle keeps
const RESIDUAL_FLOOR: f64 = 0.10;
const MILES_PER_YEAR: f64 = 12_000.0;
/// Industry value change per 10,000 miles over or under the expected mileage
const INDUSTRY_MILEAGE_RATE_PER_10K: f64 = -0.02;

/// Baseline trend and price model
#[derive(Debug, Clone, Copy, Default)]
pub struct BaselineForecaster;

impl BaselineForecaster {
    pub fn new() -> Self {
        Self
    }
}

/// Industry fair value from model year and mileage alone
///
/// Used when a vehicle has no price history. Depreciates the average new
/// price by age relative to `as_of_year`, then adjusts for mileage against
/// the expected 12,000 miles a year.
pub fn industry_estimate(query: &VehicleQuery, as_of_year: i32) -> f64 {
    let age = (as_of_year - query.year()).clamp(0, 30);
    let residual = (1.0 - ANNUAL_DEPRECIATION).powi(age).max(RESIDUAL_FLOOR);
    let expected_miles = MILES_PER_YEAR * f64::from(age.max(1));
    let excess_miles = f64::from(query.mileage()) - expected_miles;
    let mileage_factor =
        (1.0 + INDUSTRY_MILEAGE_RATE_PER_10K * excess_miles / 10_000.0).clamp(0.6, 1.1);

    round_to(NEW_VEHICLE_PRICE * residual * mileage_factor, 2)
}

/// [`industry_estimate`] as of the current calendar year
pub fn industry_estimate_today(query: &VehicleQuery) -> f64 {
    industry_estimate(query, Utc::now().year())
}

/// Least-squares slope of prices per month
fn monthly_slope(history: &[PricePoint]) -> f64 {
    let n = history.len() as f64;
    if history.len() < 2 {
        return 0.0;
    }
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = history.iter().map(|p| p.avg_price).sum::<f64>() / n;

    let (num, den) = history
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, p)| {
            let dx = i as f64 - mean_x;
            (num + dx * (p.avg_price - mean_y), den + dx * dx)
        });

    if den == 0.0 { 0.0 } else { num / den }
}

fn condition_multiplier(condition: &str) -> f64 {
    match condition {
        "excellent" | "like new" => 1.05,
        "fair" => 0.92,
        "poor" | "salvage" => 0.82,
        _ => 1.0,
    }
}

fn inventory_adjustment(trend: InventoryTrend) -> f64 {
    match trend {
        InventoryTrend::Rising => -1.0,
        InventoryTrend::Falling => 1.0,
        InventoryTrend::Stable | InventoryTrend::Unknown => 0.0,
    }
}

#[async_trait]
impl ForecastProvider for BaselineForecaster {
    async fn project_trend(
        &self,
        query: &VehicleQuery,
        history: &[PricePoint],
    ) -> Result<ForecastCurve> {
        let last = history.last().ok_or_else(|| VehicleError::DataUnavailable {
            vehicle: query.display_name(),
            reason: "trend model needs at least one price point".to_string(),
        })?;

        let slope = monthly_slope(history);
        let level = last.avg_price;
        let forecast_30d = round_to(level + slope, 2);
        let forecast_90d = round_to(level + slope * 3.0, 2);
        let trend_pct_90d = round_to((forecast_90d - level) / level * 100.0, 2);

        Ok(ForecastCurve {
            forecast_30d,
            forecast_90d,
            trend_direction: TrendDirection::of_change(trend_pct_90d),
            trend_pct_change: round_to((forecast_30d - level) / level * 100.0, 2),
            trend_pct_90d,
            method: ForecastMethod::LinearTrend,
            last_known_price: Some(level),
        })
    }

    async fn predict_price(&self, request: &PriceRequest) -> Result<PriceForecast> {
        let query = &request.query;
        // Without a listing price the industry estimate already prices in mileage
        let (base, method, mileage_impact) = match request.curve.last_known_price {
            Some(price) => {
                let excess_miles = f64::from(query.mileage()) - f64::from(DEFAULT_MILEAGE);
                let impact = price * MILEAGE_RATE_PER_10K * (excess_miles / 10_000.0);
                (price, ForecastMethod::LinearTrend, impact)
            }
            None => (
                industry_estimate_today(query),
                ForecastMethod::IndustryEstimate,
                0.0,
            ),
        };
        let condition_impact = base * (condition_multiplier(query.condition()) - 1.0);
        let predicted_price = round_to(base + mileage_impact + condition_impact, 2);

        let inventory_pct = inventory_adjustment(request.market.inventory_trend);
        let pct_90d = request.curve.trend_pct_90d + inventory_pct;
        let pct_30d = request.curve.trend_pct_change + inventory_pct / 3.0;
        let forecast_90d = round_to(predicted_price * (1.0 + pct_90d / 100.0), 2);
        let forecast_30d = round_to(predicted_price * (1.0 + pct_30d / 100.0), 2);

        // 45 with no history, up to 81 with a full year
        let months = i32::try_from(request.history_months.min(12)).unwrap_or(12);
        let mut confidence = 45 + 3 * months;
        if request.curve.method == ForecastMethod::IndustryEstimate {
            confidence -= 10;
        }
        if request.market.inventory_trend == InventoryTrend::Unknown {
            confidence -= 10;
        }

        let best_time_to_buy = if pct_90d <= -3.0 {
            BuyWindow::Wait
        } else if pct_90d >= 2.0 {
            BuyWindow::Now
        } else {
            BuyWindow::ThirtyDays
        };

        Ok(PriceForecast {
            predicted_price,
            forecast_30d,
            forecast_90d,
            method,
            confidence_base: u8::try_from(confidence.clamp(0, 100)).unwrap_or(100),
            factors: vec![
                ShapFactor::new("mileage", round_to(mileage_impact, 2)),
                ShapFactor::new("condition", round_to(condition_impact, 2)),
                ShapFactor::new(
                    "market_trend",
                    round_to(predicted_price * request.curve.trend_pct_90d / 100.0, 2),
                ),
                ShapFactor::new(
                    "inventory_pressure",
                    round_to(predicted_price * inventory_pct / 100.0, 2),
                ),
            ],
            key_insight: format!(
                "{} fair value is ${predicted_price:.0} with a {:+.1}% 90-day trend.",
                query.display_name(),
                pct_90d
            ),
            best_time_to_buy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MarketContext;
    use chrono::NaiveDate;

    fn history(prices: &[f64]) -> Vec<PricePoint> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &avg_price)| PricePoint {
                date: NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap(),
                avg_price,
                listing_count: 100,
            })
            .collect()
    }

    #[test]
    fn test_monthly_slope() {
        assert!((monthly_slope(&history(&[100.0, 110.0, 120.0])) - 10.0).abs() < 1e-9);
        assert!(monthly_slope(&history(&[100.0])).abs() < f64::EPSILON);
        assert!(monthly_slope(&[]).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_project_trend_falling() {
        let query = VehicleQuery::new("Nissan", "Leaf", 2020).unwrap();
        let curve = BaselineForecaster::new()
            .project_trend(&query, &history(&[20_000.0, 19_800.0, 19_600.0, 19_400.0]))
            .await
            .unwrap();

        assert_eq!(curve.last_known_price, Some(19_400.0));
        assert!((curve.forecast_30d - 19_200.0).abs() < 1e-9);
        assert!((curve.forecast_90d - 18_800.0).abs() < 1e-9);
        assert_eq!(curve.trend_direction, TrendDirection::Falling);
        assert!((curve.trend_pct_90d - -3.09).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_project_trend_requires_history() {
        let query = VehicleQuery::new("Nissan", "Leaf", 2020).unwrap();
        assert!(matches!(
            BaselineForecaster::new().project_trend(&query, &[]).await,
            Err(VehicleError::DataUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_predict_price_adjustments() {
        let query = VehicleQuery::builder("Nissan", "Leaf", 2020)
            .mileage(70_000)
            .condition("fair")
            .build()
            .unwrap();
        let mut curve = ForecastCurve::flat(Some(20_000.0));
        curve.method = ForecastMethod::LinearTrend;

        let forecast = BaselineForecaster::new()
            .predict_price(&PriceRequest {
                query,
                curve,
                market: MarketContext::default(),
                history_months: 8,
            })
            .await
            .unwrap();

        // 20k base, -160 for 20k extra miles, -1600 for fair condition
        assert!((forecast.predicted_price - 18_240.0).abs() < 1e-9);
        assert!((forecast.forecast_90d - 18_240.0).abs() < 1e-9);
        assert_eq!(forecast.confidence_base, 59);
        assert_eq!(forecast.best_time_to_buy, BuyWindow::ThirtyDays);
        assert_eq!(forecast.factors.len(), 4);
        assert_eq!(forecast.factors[0].direction, "decreases price");
    }

    #[test]
    fn test_industry_estimate_by_age_and_mileage() {
        let query = VehicleQuery::new("Kia", "Soul", 2019).unwrap();
        // 5 years: 38k * 0.85^5, 10k miles under the expected 60k
        assert!((industry_estimate(&query, 2024) - 17_198.02).abs() < 0.01);

        let high_miles = VehicleQuery::builder("Kia", "Soul", 2019)
            .mileage(110_000)
            .build()
            .unwrap();
        assert!(industry_estimate(&high_miles, 2024) < industry_estimate(&query, 2024));

        // A model year ahead of the reference year is priced as new
        let new = VehicleQuery::builder("Kia", "Soul", 2026).mileage(12_000).build().unwrap();
        assert!((industry_estimate(&new, 2024) - 38_000.0).abs() < 0.01);

        let vintage = VehicleQuery::builder("Ford", "Model T", 1925).mileage(0).build().unwrap();
        assert!((industry_estimate(&vintage, 2024) - 4_180.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_predict_price_without_history_uses_industry_estimate() {
        let query = VehicleQuery::new("Kia", "Soul", 2019).unwrap();
        let forecast = BaselineForecaster::new()
            .predict_price(&PriceRequest {
                query: query.clone(),
                curve: ForecastCurve::flat(None),
                market: MarketContext {
                    inventory_trend: InventoryTrend::Stable,
                    ..MarketContext::default()
                },
                history_months: 0,
            })
            .await
            .unwrap();

        assert_eq!(forecast.method, ForecastMethod::IndustryEstimate);
        assert!((forecast.predicted_price - industry_estimate_today(&query)).abs() < 1e-9);
        assert!((forecast.forecast_90d - forecast.predicted_price).abs() < 1e-9);
        assert_eq!(forecast.confidence_base, 35);
        assert!(forecast.factors[0].impact.abs() < f64::EPSILON);
    }
}
