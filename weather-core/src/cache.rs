use anyhow::Context;
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug, sync::Arc};

use crate::{
    cache::{memory::MemoryCache, redis_cache::RedisCache},
    config::CacheConfig,
    error::CacheResult,
};

pub mod memory;
pub mod redis_cache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheBackend {
    Redis,
    Memory,
}

impl CacheBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheBackend::Redis => "redis",
            CacheBackend::Memory => "memory",
        }
    }

    pub const fn all() -> &'static [CacheBackend] {
        &[CacheBackend::Redis, CacheBackend::Memory]
    }
}

impl std::fmt::Display for CacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CacheBackend {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "redis" => Ok(CacheBackend::Redis),
            "memory" => Ok(CacheBackend::Memory),
            _ => Err(anyhow::anyhow!(
                "Unknown cache backend '{value}'. Supported backends: redis, memory."
            )),
        }
    }
}

/// Key-value store holding serialized observations. Entries never expire.
#[async_trait]
pub trait WeatherCache: Send + Sync + Debug {
    /// `Ok(None)` is a clean miss; `Err` means the cache could not be asked.
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8]) -> CacheResult<()>;
}

/// Build the configured cache backend.
pub async fn cache_from_config(config: &CacheConfig) -> anyhow::Result<Arc<dyn WeatherCache>> {
    let backend = config.backend_id()?;

    let cache: Arc<dyn WeatherCache> = match backend {
        CacheBackend::Redis => Arc::new(
            RedisCache::connect(&config.redis_url)
                .await
                .with_context(|| format!("Failed to connect to Redis at {}", config.redis_url))?,
        ),
        CacheBackend::Memory => Arc::new(MemoryCache::new()),
    };

    tracing::info!(backend = %backend, "Cache backend ready");
    Ok(cache)
}
