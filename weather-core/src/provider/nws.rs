use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};
use std::time::Duration;

use crate::{
    config::UpstreamConfig,
    error::WeatherError,
    model::{Coordinate, WeatherObservation},
};

use super::WeatherProvider;

/// Client for the US National Weather Service API (api.weather.gov).
///
/// A lookup takes two requests: `/points/{lat},{lon}` yields the URL of the
/// forecast for that grid cell, and that forecast lists periods, the first
/// of which is the current one.
#[derive(Debug, Clone)]
pub struct NwsProvider {
    base_url: String,
    http: Client,
}

impl NwsProvider {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn from_config(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build().context("Failed to build HTTP client for weather.gov")?;

        Ok(Self::new(config.base_url.as_str(), http))
    }

    /// Stage 1: find the forecast URL for a coordinate.
    async fn forecast_url(&self, coordinate: Coordinate) -> Result<String, WeatherError> {
        let url = format!(
            "{}/points/{:.6},{:.6}",
            self.base_url, coordinate.latitude, coordinate.longitude
        );

        let point: NwsPointResponse = self.get_json(&url, "point lookup").await?;

        match point.properties.forecast {
            Some(forecast) if !forecast.is_empty() => Ok(forecast),
            _ => {
                tracing::warn!(%coordinate, "No forecast URL available");
                Err(WeatherError::NoForecastAvailable)
            }
        }
    }

    /// Stage 2: fetch the forecast and take its first period.
    async fn current_period(&self, forecast_url: &str) -> Result<NwsPeriod, WeatherError> {
        let forecast: NwsForecastResponse = self.get_json(forecast_url, "forecast").await?;

        forecast
            .properties
            .periods
            .into_iter()
            .next()
            .ok_or(WeatherError::NoDataAvailable)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, stage: &str) -> Result<T, WeatherError> {
        let res = self.http.get(url).send().await.map_err(|e| {
            WeatherError::UpstreamUnavailable(format!("{stage} request to {url} failed: {e}"))
        })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::UpstreamUnavailable(format!("failed to read {stage} response body: {e}"))
        })?;

        if !status.is_success() {
            tracing::warn!(%status, stage, url, "Upstream request failed");
            return Err(WeatherError::UpstreamUnavailable(format!(
                "{stage} request failed with status {status}: {}",
                truncate_body(&body),
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            WeatherError::UpstreamMalformed(format!("failed to parse {stage} JSON: {e}"))
        })
    }
}

#[async_trait]
impl WeatherProvider for NwsProvider {
    async fn fetch(&self, coordinate: Coordinate) -> Result<WeatherObservation, WeatherError> {
        let forecast_url = self.forecast_url(coordinate).await?;
        tracing::debug!(%coordinate, forecast_url = %forecast_url, "Resolved forecast URL");

        let period = self.current_period(&forecast_url).await?;
        Ok(normalize(period))
    }
}

#[derive(Debug, Default, Deserialize)]
struct NwsPointProperties {
    #[serde(default)]
    forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NwsPointResponse {
    #[serde(default)]
    properties: NwsPointProperties,
}

#[derive(Debug, Deserialize)]
struct NwsQuantity {
    #[serde(default)]
    value: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NwsPeriod {
    #[serde(default)]
    temperature: i64,
    #[serde(default)]
    wind_speed: String,
    #[serde(default)]
    short_forecast: String,
    #[serde(default)]
    relative_humidity: Option<NwsQuantity>,
}

#[derive(Debug, Default, Deserialize)]
struct NwsForecastProperties {
    #[serde(default)]
    periods: Vec<NwsPeriod>,
}

#[derive(Debug, Deserialize)]
struct NwsForecastResponse {
    #[serde(default)]
    properties: NwsForecastProperties,
}

/// Map a forecast period onto the observation shape, adding unit labels.
fn normalize(period: NwsPeriod) -> WeatherObservation {
    let humidity = period.relative_humidity.and_then(|h| h.value).unwrap_or(0);

    WeatherObservation {
        temperature: format!("{}°C", period.temperature),
        humidity: format!("{humidity}%"),
        wind_speed: period.wind_speed,
        conditions: period.short_forecast,
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
