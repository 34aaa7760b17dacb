use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

use crate::{
    config::UpstreamConfig,
    error::WeatherError,
    model::{Coordinate, WeatherObservation},
    provider::nws::NwsProvider,
};

pub mod nws;

/// Fetches current conditions for a coordinate from an upstream service.
///
/// Implementations do not cache; caching belongs to
/// [`WeatherService`](crate::service::WeatherService).
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherObservation, WeatherError>;
}

/// Construct the upstream provider from config.
pub fn provider_from_config(config: &UpstreamConfig) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    Ok(Arc::new(NwsProvider::from_config(config)?))
}
