use thiserror::Error;

/// Failures raised by a cache backend.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),

    #[error("cached value for '{key}' could not be decoded: {reason}")]
    Corrupt { key: String, reason: String },
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Everything that can go wrong while answering a weather lookup.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Malformed request input. The only caller-side error.
    #[error("{0}")]
    InvalidInput(String),

    #[error("place not found: {0}")]
    PlaceNotFound(String),

    #[error("cache unavailable: {0}")]
    CacheUnavailable(#[from] CacheError),

    #[error("upstream weather service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream weather service returned an unexpected payload: {0}")]
    UpstreamMalformed(String),

    #[error("no forecast available for this location")]
    NoForecastAvailable,

    #[error("no weather data available")]
    NoDataAvailable,
}

impl WeatherError {
    /// True when the request itself was at fault.
    ///
    /// Unknown place names are not client errors: they are reported the
    /// same way as upstream and cache failures.
    pub fn is_client_error(&self) -> bool {
        matches!(self, WeatherError::InvalidInput(_))
    }
}
