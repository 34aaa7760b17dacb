//! Cache-aside weather lookups.
//!
//! [`WeatherService`] checks the cache under [`Coordinate::cache_key`] and
//! only calls the upstream provider on a clean miss, writing the fresh
//! observation back afterwards. A cache that cannot be reached aborts the
//! lookup instead of falling through to the provider.

use std::{sync::Arc, time::Instant};

use crate::{
    cache::WeatherCache,
    error::{CacheError, WeatherError},
    model::{Coordinate, WeatherObservation, WeatherQuery},
    places::PlaceRegistry,
    provider::WeatherProvider,
};

/// Where an observation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
    Cache,
    Upstream,
}

impl CacheSource {
    pub fn is_cached(&self) -> bool {
        matches!(self, CacheSource::Cache)
    }
}

#[derive(Debug, Clone)]
pub struct WeatherService {
    places: PlaceRegistry,
    cache: Arc<dyn WeatherCache>,
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherService {
    pub fn new(
        places: PlaceRegistry,
        cache: Arc<dyn WeatherCache>,
        provider: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self { places, cache, provider }
    }

    pub fn resolve(&self, name: &str) -> Result<Coordinate, WeatherError> {
        self.places.resolve(name)
    }

    /// Answer a query by place name or coordinate.
    pub async fn lookup(&self, query: &WeatherQuery) -> Result<WeatherObservation, WeatherError> {
        let start = Instant::now();

        let result = match query {
            WeatherQuery::Place(name) => match self.resolve(name) {
                Ok(coordinate) => self.get_weather_with_source(coordinate).await,
                Err(e) => Err(e),
            },
            WeatherQuery::Coordinate(coordinate) => {
                self.get_weather_with_source(*coordinate).await
            }
        };

        let elapsed = start.elapsed();
        match result {
            Ok((observation, source)) => {
                tracing::info!(%query, cached = source.is_cached(), ?elapsed, "Weather lookup complete");
                Ok(observation)
            }
            Err(e) => {
                tracing::error!(%query, ?elapsed, error = %e, "Weather lookup failed");
                Err(e)
            }
        }
    }

    /// Current conditions for a coordinate, from cache when present.
    pub async fn get_weather(
        &self,
        coordinate: Coordinate,
    ) -> Result<WeatherObservation, WeatherError> {
        self.get_weather_with_source(coordinate).await.map(|(observation, _)| observation)
    }

    /// Like [`get_weather`](Self::get_weather), also reporting whether the
    /// cache answered.
    pub async fn get_weather_with_source(
        &self,
        coordinate: Coordinate,
    ) -> Result<(WeatherObservation, CacheSource), WeatherError> {
        let key = coordinate.cache_key();

        if let Some(bytes) = self.cache.get(&key).await? {
            let observation = serde_json::from_slice(&bytes)
                .map_err(|e| CacheError::Corrupt { key: key.clone(), reason: e.to_string() })?;
            tracing::debug!(%coordinate, key = %key, "Cache hit");
            return Ok((observation, CacheSource::Cache));
        }

        tracing::debug!(%coordinate, key = %key, "Cache miss, fetching from upstream");
        let observation = self.provider.fetch(coordinate).await?;

        match serde_json::to_vec(&observation) {
            Ok(bytes) => {
                if let Err(e) = self.cache.set(&key, &bytes).await {
                    tracing::warn!(%coordinate, key = %key, error = %e, "Failed to store observation in cache");
                }
            }
            Err(e) => {
                tracing::warn!(%coordinate, key = %key, error = %e, "Failed to serialize observation");
            }
        }

        Ok((observation, CacheSource::Upstream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cache::memory::MemoryCache, error::CacheResult, model::Place};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug)]
    struct StubProvider {
        calls: AtomicUsize,
        seen: Mutex<Vec<Coordinate>>,
        fail: bool,
    }

    impl StubProvider {
        fn ok() -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), seen: Mutex::new(Vec::new()), fail: false })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), seen: Mutex::new(Vec::new()), fail: true })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherObservation, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(coordinate);
            if self.fail {
                return Err(WeatherError::UpstreamUnavailable("stub failure".into()));
            }
            Ok(sunny())
        }
    }

    /// Cache whose every operation fails.
    #[derive(Debug, Default)]
    struct BrokenCache {
        sets: AtomicUsize,
    }

    #[async_trait]
    impl WeatherCache for BrokenCache {
        async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
            Err(CacheError::Backend("connection refused".into()))
        }

        async fn set(&self, _key: &str, _value: &[u8]) -> CacheResult<()> {
            self.sets.fetch_add(1, Ordering::SeqCst);
            Err(CacheError::Backend("connection refused".into()))
        }
    }

    /// Cache that reads fine but refuses writes.
    #[derive(Debug, Default)]
    struct ReadOnlyCache;

    #[async_trait]
    impl WeatherCache for ReadOnlyCache {
        async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &[u8]) -> CacheResult<()> {
            Err(CacheError::Backend("READONLY".into()))
        }
    }

    fn sunny() -> WeatherObservation {
        WeatherObservation {
            temperature: "72°C".into(),
            humidity: "40%".into(),
            wind_speed: "10 mph".into(),
            conditions: "Sunny".into(),
        }
    }

    fn chicago() -> Coordinate {
        Coordinate::new(41.8781, -87.6298)
    }

    fn places() -> PlaceRegistry {
        PlaceRegistry::new(vec![Place {
            name: "Chicago".into(),
            latitude: 41.8781,
            longitude: -87.6298,
        }])
    }

    fn service(cache: Arc<dyn WeatherCache>, provider: Arc<StubProvider>) -> WeatherService {
        WeatherService::new(places(), cache, provider)
    }

    #[tokio::test]
    async fn cache_hit_skips_upstream() {
        let cache = Arc::new(MemoryCache::new());
        let cached = WeatherObservation { conditions: "Cloudy".into(), ..sunny() };
        cache
            .set(&chicago().cache_key(), &serde_json::to_vec(&cached).unwrap())
            .await
            .unwrap();

        let provider = StubProvider::ok();
        let svc = service(cache, provider.clone());

        let obs = svc.get_weather(chicago()).await.unwrap();
        assert_eq!(obs, cached);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn miss_fetches_once_then_serves_from_cache() {
        let cache = Arc::new(MemoryCache::new());
        let provider = StubProvider::ok();
        let svc = service(cache.clone(), provider.clone());

        let first = svc.get_weather(chicago()).await.unwrap();
        assert_eq!(first, sunny());
        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.len().await, 1);

        let second = svc.get_weather(chicago()).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn source_reports_upstream_then_cache() {
        let provider = StubProvider::ok();
        let svc = service(Arc::new(MemoryCache::new()), provider.clone());

        let (first, source) = svc.get_weather_with_source(chicago()).await.unwrap();
        assert_eq!(source, CacheSource::Upstream);
        assert!(!source.is_cached());

        let (second, source) = svc.get_weather_with_source(chicago()).await.unwrap();
        assert_eq!(source, CacheSource::Cache);
        assert!(source.is_cached());
        assert_eq!(second, first);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn miss_stores_serialized_observation_under_derived_key() {
        let cache = Arc::new(MemoryCache::new());
        let svc = service(cache.clone(), StubProvider::ok());

        svc.get_weather(chicago()).await.unwrap();

        let stored = cache.get("41.878100,-87.629800").await.unwrap().expect("entry written");
        let decoded: WeatherObservation = serde_json::from_slice(&stored).unwrap();
        assert_eq!(decoded, sunny());
    }

    #[tokio::test]
    async fn upstream_failure_is_not_cached() {
        let cache = Arc::new(MemoryCache::new());
        let provider = StubProvider::failing();
        let svc = service(cache.clone(), provider.clone());

        let err = svc.get_weather(chicago()).await.unwrap_err();
        assert!(matches!(err, WeatherError::UpstreamUnavailable(_)));
        assert!(cache.is_empty().await);

        svc.get_weather(chicago()).await.unwrap_err();
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn cache_error_aborts_without_upstream_call() {
        let cache = Arc::new(BrokenCache::default());
        let provider = StubProvider::ok();
        let svc = service(cache.clone(), provider.clone());

        let err = svc.get_weather(chicago()).await.unwrap_err();
        assert!(matches!(err, WeatherError::CacheUnavailable(CacheError::Backend(_))));
        assert_eq!(provider.calls(), 0);
        assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn corrupt_cache_entry_is_reported() {
        let cache = Arc::new(MemoryCache::new());
        cache.set(&chicago().cache_key(), b"not json").await.unwrap();
        let provider = StubProvider::ok();
        let svc = service(cache, provider.clone());

        let err = svc.get_weather(chicago()).await.unwrap_err();
        assert!(matches!(err, WeatherError::CacheUnavailable(CacheError::Corrupt { .. })));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn failed_cache_write_still_returns_observation() {
        let provider = StubProvider::ok();
        let svc = service(Arc::new(ReadOnlyCache), provider.clone());

        let obs = svc.get_weather(chicago()).await.unwrap();
        assert_eq!(obs, sunny());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn place_and_coordinate_queries_share_cache_entry() {
        let cache = Arc::new(MemoryCache::new());
        let provider = StubProvider::ok();
        let svc = service(cache.clone(), provider.clone());

        svc.lookup(&WeatherQuery::Place("Chicago".into())).await.unwrap();
        svc.lookup(&WeatherQuery::Coordinate(chicago())).await.unwrap();

        assert_eq!(provider.calls(), 1);
        assert_eq!(cache.len().await, 1);
        assert_eq!(provider.seen.lock().unwrap().as_slice(), &[chicago()]);
    }

    #[tokio::test]
    async fn unknown_place_fails_before_cache_or_upstream() {
        let cache = Arc::new(BrokenCache::default());
        let provider = StubProvider::ok();
        let svc = service(cache, provider.clone());

        let err = svc.lookup(&WeatherQuery::Place("Nonexistent City".into())).await.unwrap_err();
        assert!(matches!(err, WeatherError::PlaceNotFound(_)));
        assert!(!err.is_client_error());
        assert_eq!(provider.calls(), 0);
    }
}
