//! Price forecast agent

use agent_core::{Agent, LogEntry, Result, StageError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::call_with_timeout;
use crate::engine::PipelineContext;
use crate::engine::log_builder::{FORECAST_AGENT, ForecastSnapshot, forecast_entry};
use crate::providers::baseline::industry_estimate_today;
use crate::providers::{ForecastProvider, PriceForecast, PriceRequest};
use crate::types::{BuyWindow, ForecastMethod};

/// Confidence reported when only a flat estimate is available
const NEUTRAL_CONFIDENCE: u8 = 40;

/// Output of the forecast stage
pub type ForecastOutput = PriceForecast;

/// Agent predicting fair value and the 30/90-day forecasts
pub struct ForecastAgent {
    forecaster: Arc<dyn ForecastProvider>,
    timeout: Duration,
}

impl ForecastAgent {
    pub fn new(forecaster: Arc<dyn ForecastProvider>, timeout: Duration) -> Self {
        Self {
            forecaster,
            timeout,
        }
    }
}

/// Reject model output the downstream stages cannot use
fn check_forecast(forecast: &PriceForecast) -> Result<()> {
    let prices = [
        ("predicted_price", forecast.predicted_price),
        ("forecast_30d", forecast.forecast_30d),
        ("forecast_90d", forecast.forecast_90d),
    ];
    if let Some((name, value)) = prices.iter().find(|(_, v)| !v.is_finite() || *v <= 0.0) {
        return Err(StageError::recoverable(format!(
            "price model returned {name} = {value}"
        )));
    }
    if forecast.confidence_base > 100 {
        return Err(StageError::recoverable(format!(
            "price model returned confidence {}",
            forecast.confidence_base
        )));
    }
    Ok(())
}

#[async_trait]
impl Agent<PipelineContext> for ForecastAgent {
    type Output = ForecastOutput;

    fn name(&self) -> &str {
        FORECAST_AGENT
    }

    async fn run(&self, context: &PipelineContext) -> Result<ForecastOutput> {
        let data = context.require_data()?;
        let trend = context.require_trend()?;

        let request = PriceRequest {
            query: context.query().clone(),
            curve: trend.curve.clone(),
            market: data.market_context.clone(),
            history_months: data.price_history.len(),
        };
        let forecast =
            call_with_timeout(self.timeout, self.forecaster.predict_price(&request)).await?;
        check_forecast(&forecast)?;

        tracing::debug!(
            predicted = forecast.predicted_price,
            forecast_90d = forecast.forecast_90d,
            method = %forecast.method,
            "price predicted"
        );
        Ok(forecast)
    }

    /// Flat forecast at the last known price, or at the industry estimate
    /// for a vehicle with no usable price
    fn fallback(&self, context: &PipelineContext) -> Option<ForecastOutput> {
        let price = context
            .trend
            .as_ref()
            .and_then(|t| t.curve.last_known_price)
            .or_else(|| {
                context
                    .data
                    .as_ref()
                    .and_then(|d| d.price_history.last())
                    .map(|p| p.avg_price)
            })
            .filter(|p| p.is_finite() && *p > 0.0)
            .unwrap_or_else(|| industry_estimate_today(context.query()));

        Some(PriceForecast {
            predicted_price: price,
            forecast_30d: price,
            forecast_90d: price,
            method: ForecastMethod::IndustryEstimate,
            confidence_base: NEUTRAL_CONFIDENCE,
            factors: Vec::new(),
            key_insight: String::new(),
            best_time_to_buy: BuyWindow::ThirtyDays,
        })
    }

    fn describe(&self, output: &ForecastOutput) -> LogEntry {
        forecast_entry(&ForecastSnapshot {
            predicted_price: output.predicted_price,
            forecast_90d: output.forecast_90d,
            forecast_method: output.method,
            confidence_base: output.confidence_base,
        })
    }
}
