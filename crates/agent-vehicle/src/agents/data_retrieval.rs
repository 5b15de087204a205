//! Historical data retrieval agent

use agent_core::{Agent, LogEntry, Result, StageError};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::call_with_timeout;
use crate::engine::PipelineContext;
use crate::engine::log_builder::{DATA_AGENT, DataSnapshot, data_entry};
use crate::providers::{MarketContext, MarketDataProvider, PricePoint};

/// Price history and market conditions for the requested vehicle
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataOutput {
    /// Monthly prices, oldest first; may be empty
    pub price_history: Vec<PricePoint>,
    pub market_context: MarketContext,
    pub has_history: bool,
}

/// Agent fetching price history from the market datastore
pub struct DataAgent {
    provider: Arc<dyn MarketDataProvider>,
    timeout: Duration,
}

impl DataAgent {
    pub fn new(provider: Arc<dyn MarketDataProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }
}

/// Every monthly price must be positive and finite
fn check_history(history: &[PricePoint]) -> Result<()> {
    match history
        .iter()
        .find(|p| !p.avg_price.is_finite() || p.avg_price <= 0.0)
    {
        Some(point) => Err(StageError::recoverable(format!(
            "datastore returned avg_price = {} for {}",
            point.avg_price,
            point.date.format("%Y-%m")
        ))),
        None => Ok(()),
    }
}

#[async_trait]
impl Agent<PipelineContext> for DataAgent {
    type Output = DataOutput;

    fn name(&self) -> &str {
        DATA_AGENT
    }

    async fn run(&self, context: &PipelineContext) -> Result<DataOutput> {
        let data = call_with_timeout(
            self.timeout,
            self.provider.fetch_market_data(context.query()),
        )
        .await?;

        let mut price_history = data.price_history;
        check_history(&price_history)?;
        price_history.sort_by_key(|point| point.date);
        tracing::debug!(months = price_history.len(), "price history retrieved");

        Ok(DataOutput {
            has_history: !price_history.is_empty(),
            price_history,
            market_context: data.market_context,
        })
    }

    fn fallback(&self, _context: &PipelineContext) -> Option<DataOutput> {
        Some(DataOutput::default())
    }

    fn describe(&self, output: &DataOutput) -> LogEntry {
        data_entry(&DataSnapshot {
            n_months: output.price_history.len(),
            inventory_count: output.market_context.current_inventory_count,
            inventory_trend: output.market_context.inventory_trend,
            price_vs_median: output.market_context.price_vs_median_pct,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VehicleError;
    use crate::providers::{MarketData, MockMarketDataProvider};
    use crate::query::VehicleQuery;
    use crate::types::InventoryTrend;
    use chrono::NaiveDate;

    fn context() -> PipelineContext {
        PipelineContext::new(VehicleQuery::new("Mazda", "CX-5", 2020).unwrap())
    }

    fn point(month: u32, avg_price: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2024, month, 1).unwrap(),
            avg_price,
            listing_count: 50,
        }
    }

    #[tokio::test]
    async fn test_history_sorted_oldest_first() {
        let mut provider = MockMarketDataProvider::new();
        provider.expect_fetch_market_data().returning(|_| {
            Ok(MarketData {
                price_history: vec![point(3, 24_000.0), point(1, 25_000.0)],
                market_context: MarketContext {
                    current_inventory_count: 1_204,
                    inventory_trend: InventoryTrend::Rising,
                    price_vs_median_pct: 1.1,
                },
            })
        });

        let agent = DataAgent::new(Arc::new(provider), Duration::from_secs(1));
        let output = agent.run(&context()).await.unwrap();

        assert!(output.has_history);
        assert_eq!(output.price_history[0].date.format("%m").to_string(), "01");
        assert_eq!(
            agent.describe(&output).message,
            "Retrieved 2 months of price history. 1,204 active listings found. Inventory trend: rising."
        );
    }

    #[tokio::test]
    async fn test_provider_failure_is_recoverable() {
        let mut provider = MockMarketDataProvider::new();
        provider
            .expect_fetch_market_data()
            .returning(|_| Err(VehicleError::Provider("connection refused".to_string())));

        let agent = DataAgent::new(Arc::new(provider), Duration::from_secs(1));
        let err = agent.run(&context()).await.unwrap_err();
        assert!(err.is_recoverable());

        let neutral = agent.fallback(&context()).unwrap();
        assert!(!neutral.has_history);
        assert_eq!(neutral.market_context.inventory_trend, InventoryTrend::Unknown);
        assert_eq!(neutral.market_context.current_inventory_count, 0);
    }

    #[tokio::test]
    async fn test_unusable_prices_are_recoverable() {
        for bad in [f64::NAN, f64::INFINITY, 0.0, -1.0] {
            let mut provider = MockMarketDataProvider::new();
            provider.expect_fetch_market_data().returning(move |_| {
                Ok(MarketData {
                    price_history: vec![point(1, 20_000.0), point(2, bad), point(3, 19_000.0)],
                    market_context: MarketContext::default(),
                })
            });

            let agent = DataAgent::new(Arc::new(provider), Duration::from_secs(1));
            let err = agent.run(&context()).await.unwrap_err();
            assert!(err.is_recoverable(), "{err}");
            assert!(err.to_string().contains("2024-02"), "{err}");
        }
    }
}
