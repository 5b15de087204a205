//! In-memory market data and a TTL caching layer

use super::{MarketData, MarketDataProvider};
use crate::error::{Result, VehicleError};
use crate::query::{VehicleQuery, normalize_key};
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Market data held in memory, keyed by normalized `"make model"`
#[derive(Debug, Clone, Default)]
pub struct StaticMarketData {
    entries: HashMap<String, MarketData>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add data for a vehicle
    pub fn with_vehicle(mut self, make: &str, model: &str, data: MarketData) -> Self {
        self.entries.insert(normalize_key(make, model), data);
        self
    }
}

#[async_trait]
impl MarketDataProvider for StaticMarketData {
    async fn fetch_market_data(&self, query: &VehicleQuery) -> Result<MarketData> {
        self.entries
            .get(&query.registry_key())
            .cloned()
            .ok_or_else(|| VehicleError::DataUnavailable {
                vehicle: query.display_name(),
                reason: "no listings in datastore".to_string(),
            })
    }
}

/// Cache key for market data requests
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Normalized `"make model"`
    pub vehicle: String,
    pub year: i32,
}

impl CacheKey {
    pub fn for_query(query: &VehicleQuery) -> Self {
        Self {
            vehicle: query.registry_key(),
            year: query.year(),
        }
    }
}

/// Thread-safe TTL cache in front of another market data provider
///
/// Failed fetches are not cached.
pub struct CachedMarketData<P> {
    inner: P,
    cache: Arc<RwLock<TimedCache<CacheKey, MarketData>>>,
}

impl<P: MarketDataProvider> CachedMarketData<P> {
    /// Wrap `inner` with entries living for `ttl`
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    /// Invalidate a specific cache entry
    pub async fn invalidate(&self, query: &VehicleQuery) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(&CacheKey::for_query(query));
    }

    /// Clear all cached entries
    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }
}

#[async_trait]
impl<P: MarketDataProvider> MarketDataProvider for CachedMarketData<P> {
    async fn fetch_market_data(&self, query: &VehicleQuery) -> Result<MarketData> {
        let key = CacheKey::for_query(query);

        {
            let mut cache = self.cache.write().await;
            if let Some(data) = cache.cache_get(&key) {
                tracing::debug!(vehicle = %key.vehicle, year = key.year, "market data cache hit");
                return Ok(data.clone());
            }
        }

        tracing::debug!(vehicle = %key.vehicle, year = key.year, "market data cache miss");
        let data = self.inner.fetch_market_data(query).await?;

        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, data.clone());
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{MarketContext, MockMarketDataProvider, PricePoint};
    use crate::types::InventoryTrend;
    use chrono::NaiveDate;

    async fn cached_entries<P: MarketDataProvider>(cached: &CachedMarketData<P>) -> usize {
        cached.cache.read().await.cache_size()
    }

    fn sample_data() -> MarketData {
        MarketData {
            price_history: vec![PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                avg_price: 19_800.0,
                listing_count: 140,
            }],
            market_context: MarketContext {
                current_inventory_count: 140,
                inventory_trend: InventoryTrend::Falling,
                price_vs_median_pct: -1.5,
            },
        }
    }

    #[tokio::test]
    async fn test_static_lookup() {
        let provider = StaticMarketData::new().with_vehicle("Mazda", "CX-5", sample_data());

        let query = VehicleQuery::new("mazda", "cx-5", 2020).unwrap();
        let data = provider.fetch_market_data(&query).await.unwrap();
        assert_eq!(data.market_context.current_inventory_count, 140);

        let missing = VehicleQuery::new("mazda", "mx-5", 2020).unwrap();
        assert!(matches!(
            provider.fetch_market_data(&missing).await,
            Err(VehicleError::DataUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_cache_hits_skip_inner_provider() {
        let mut inner = MockMarketDataProvider::new();
        inner
            .expect_fetch_market_data()
            .times(1)
            .returning(|_| Ok(sample_data()));

        let cached = CachedMarketData::new(inner, Duration::from_secs(60));
        let query = VehicleQuery::new("Mazda", "CX-5", 2020).unwrap();

        let first = cached.fetch_market_data(&query).await.unwrap();
        let second = cached.fetch_market_data(&query).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(cached_entries(&cached).await, 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mut inner = MockMarketDataProvider::new();
        inner
            .expect_fetch_market_data()
            .times(2)
            .returning(|_| Err(VehicleError::Provider("offline".to_string())));

        let cached = CachedMarketData::new(inner, Duration::from_secs(60));
        let query = VehicleQuery::new("Mazda", "CX-5", 2020).unwrap();

        assert!(cached.fetch_market_data(&query).await.is_err());
        assert!(cached.fetch_market_data(&query).await.is_err());
        assert_eq!(cached_entries(&cached).await, 0);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cached = CachedMarketData::new(
            StaticMarketData::new()
                .with_vehicle("Mazda", "CX-5", sample_data())
                .with_vehicle("Kia", "Soul", sample_data()),
            Duration::from_secs(60),
        );
        let cx5 = VehicleQuery::new("Mazda", "CX-5", 2020).unwrap();
        let soul = VehicleQuery::new("Kia", "Soul", 2019).unwrap();

        cached.fetch_market_data(&cx5).await.unwrap();
        cached.fetch_market_data(&soul).await.unwrap();
        assert_eq!(cached_entries(&cached).await, 2);

        cached.invalidate(&cx5).await;
        assert_eq!(cached_entries(&cached).await, 1);

        cached.clear().await;
        assert_eq!(cached_entries(&cached).await, 0);
    }
}
