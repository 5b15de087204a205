//! Trend analysis agent
//!
//! Projects the price curve through the forecasting collaborator, then
//! derives the trend descriptor and a small feature bundle locally.

use agent_core::{Agent, LogEntry, Result, StageError};
use async_trait::async_trait;
use chrono::Datelike;
use std::sync::Arc;
use std::time::Duration;
use ta::{Next, indicators::SimpleMovingAverage};

use super::call_with_timeout;
use crate::engine::PipelineContext;
use crate::engine::log_builder::{TREND_AGENT, TrendSnapshot, trend_entry};
use crate::engine::report::{DataFeatures, TrendData};
use crate::metrics::{momentum_score, round_to, trend_strength};
use crate::providers::{ForecastCurve, ForecastProvider, PricePoint};
use crate::types::{TrendDirection, TrendStrength};

/// Relative used-car demand by calendar month, January first
const SEASONAL_FACTORS: [f64; 12] = [
    0.98, 0.99, 1.02, 1.03, 1.02, 1.01, 1.0, 1.0, 0.99, 0.99, 0.98, 0.97,
];

/// Output of the trend stage
#[derive(Debug, Clone, PartialEq)]
pub struct TrendOutput {
    pub curve: ForecastCurve,
    pub trend: TrendData,
    pub features: DataFeatures,
}

/// Agent analysing the direction and strength of the price trend
pub struct TrendAnalysisAgent {
    forecaster: Arc<dyn ForecastProvider>,
    timeout: Duration,
}

impl TrendAnalysisAgent {
    pub fn new(forecaster: Arc<dyn ForecastProvider>, timeout: Duration) -> Self {
        Self {
            forecaster,
            timeout,
        }
    }
}

/// Moving average over the last `period` monthly prices
fn trailing_average(history: &[PricePoint], period: usize) -> Result<Option<f64>> {
    let mut sma =
        SimpleMovingAverage::new(period).map_err(|e| StageError::fatal(e.to_string()))?;
    Ok(history
        .iter()
        .fold(None, |_, point| Some(sma.next(point.avg_price))))
}

fn seasonal_factor(history: &[PricePoint]) -> f64 {
    history
        .last()
        .map_or(1.0, |p| SEASONAL_FACTORS[p.date.month0() as usize])
}

fn features(history: &[PricePoint], curve: &ForecastCurve) -> Result<DataFeatures> {
    let level = curve.last_known_price.unwrap_or(curve.forecast_30d);
    // One monthly point covers 30 days, three cover 90
    let ma_30 = trailing_average(history, 1)?.unwrap_or(level);
    let ma_90 = trailing_average(history, 3)?.unwrap_or(level);

    Ok(DataFeatures {
        ma_30: round_to(ma_30, 2),
        ma_90: round_to(ma_90, 2),
        depreciation_rate: if curve.trend_pct_90d < 0.0 {
            curve.trend_pct_90d.abs()
        } else {
            0.0
        },
        seasonal_factor: seasonal_factor(history),
    })
}

fn check_curve(curve: &ForecastCurve) -> Result<()> {
    let values = [
        curve.forecast_30d,
        curve.forecast_90d,
        curve.trend_pct_change,
        curve.trend_pct_90d,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(StageError::recoverable(
            "trend model returned non-finite values",
        ));
    }
    Ok(())
}

#[async_trait]
impl Agent<PipelineContext> for TrendAnalysisAgent {
    type Output = TrendOutput;

    fn name(&self) -> &str {
        TREND_AGENT
    }

    async fn run(&self, context: &PipelineContext) -> Result<TrendOutput> {
        let history = &context.require_data()?.price_history;

        let curve = call_with_timeout(
            self.timeout,
            self.forecaster.project_trend(context.query(), history),
        )
        .await?;
        check_curve(&curve)?;

        let pct = curve.trend_pct_90d;
        let trend = TrendData {
            direction: TrendDirection::of_change(pct),
            strength: trend_strength(pct),
            momentum_score: momentum_score(pct),
        };
        tracing::debug!(
            direction = %trend.direction,
            strength = %trend.strength,
            momentum = trend.momentum_score,
            "trend projected"
        );

        Ok(TrendOutput {
            features: features(history, &curve)?,
            curve,
            trend,
        })
    }

    fn fallback(&self, context: &PipelineContext) -> Option<TrendOutput> {
        let history = context
            .data
            .as_ref()
            .map_or(&[][..], |d| d.price_history.as_slice());
        let curve = ForecastCurve::flat(history.last().map(|p| p.avg_price));

        Some(TrendOutput {
            features: features(history, &curve).ok()?,
            trend: TrendData {
                direction: TrendDirection::Rising,
                strength: TrendStrength::Weak,
                momentum_score: 50.0,
            },
            curve,
        })
    }

    fn describe(&self, output: &TrendOutput) -> LogEntry {
        trend_entry(&TrendSnapshot {
            direction: output.trend.direction,
            strength: output.trend.strength,
            momentum_score: output.trend.momentum_score,
            method: output.curve.method,
            pct_change_90d: output.curve.trend_pct_90d,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VehicleError;
    use crate::agents::DataOutput;
    use crate::providers::{BaselineForecaster, MockForecastProvider};
    use crate::query::VehicleQuery;
    use crate::types::ForecastMethod;
    use chrono::NaiveDate;

    fn context_with(prices: &[f64]) -> PipelineContext {
        let mut context = PipelineContext::new(VehicleQuery::new("Nissan", "Leaf", 2020).unwrap());
        let price_history: Vec<PricePoint> = prices
            .iter()
            .enumerate()
            .map(|(i, &avg_price)| PricePoint {
                date: NaiveDate::from_ymd_opt(2024, i as u32 + 1, 1).unwrap(),
                avg_price,
                listing_count: 40,
            })
            .collect();
        context.data = Some(DataOutput {
            has_history: !price_history.is_empty(),
            price_history,
            ..DataOutput::default()
        });
        context
    }

    #[tokio::test]
    async fn test_trend_from_baseline() {
        let agent = TrendAnalysisAgent::new(Arc::new(BaselineForecaster::new()), Duration::from_secs(1));
        let output = agent
            .run(&context_with(&[20_000.0, 19_800.0, 19_600.0, 19_400.0]))
            .await
            .unwrap();

        assert_eq!(output.trend.direction, TrendDirection::Falling);
        assert_eq!(output.trend.strength, TrendStrength::Strong);
        assert!((output.trend.momentum_score - 40.7).abs() < 1e-9);

        assert!((output.features.ma_30 - 19_400.0).abs() < 1e-9);
        assert!((output.features.ma_90 - 19_600.0).abs() < 1e-9);
        assert!((output.features.depreciation_rate - 3.09).abs() < 1e-9);
        // Last point is April
        assert!((output.features.seasonal_factor - 1.03).abs() < 1e-9);

        assert_eq!(
            agent.describe(&output).message,
            "Linear-trend model: falling trend, strong strength (-3.1% over 90d). Momentum: 40.7/100."
        );
    }

    #[tokio::test]
    async fn test_missing_data_is_fatal() {
        let agent = TrendAnalysisAgent::new(Arc::new(BaselineForecaster::new()), Duration::from_secs(1));
        let context = PipelineContext::new(VehicleQuery::new("Nissan", "Leaf", 2020).unwrap());
        let err = agent.run(&context).await.unwrap_err();
        assert!(matches!(err, StageError::MissingInput { .. }));
    }

    #[tokio::test]
    async fn test_non_finite_curve_rejected() {
        let mut forecaster = MockForecastProvider::new();
        forecaster.expect_project_trend().returning(|_, _| {
            let mut curve = ForecastCurve::flat(Some(20_000.0));
            curve.forecast_90d = f64::NAN;
            Ok(curve)
        });

        let agent = TrendAnalysisAgent::new(Arc::new(forecaster), Duration::from_secs(1));
        let err = agent.run(&context_with(&[20_000.0])).await.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_neutral_default_is_flat_at_last_price() {
        let mut forecaster = MockForecastProvider::new();
        forecaster
            .expect_project_trend()
            .returning(|_, _| Err(VehicleError::Provider("model offline".to_string())));

        let agent = TrendAnalysisAgent::new(Arc::new(forecaster), Duration::from_secs(1));
        let context = context_with(&[21_000.0, 20_500.0]);
        assert!(agent.run(&context).await.unwrap_err().is_recoverable());

        let neutral = agent.fallback(&context).unwrap();
        assert_eq!(neutral.curve.last_known_price, Some(20_500.0));
        assert_eq!(neutral.curve.method, ForecastMethod::IndustryEstimate);
        assert_eq!(neutral.trend.strength, TrendStrength::Weak);
        assert!((neutral.trend.momentum_score - 50.0).abs() < f64::EPSILON);
    }
}
