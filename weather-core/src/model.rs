use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// A latitude/longitude pair. No range validation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Cache key for this coordinate: both components with six fractional digits.
    ///
    /// The encoding is part of the key, so it must never change between
    /// releases or previously cached entries become unreachable.
    pub fn cache_key(&self) -> String {
        format!("{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// A known place, as stored in the places file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Place {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Current conditions, already formatted for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherObservation {
    pub temperature: String,
    pub humidity: String,
    pub wind_speed: String,
    pub conditions: String,
}

/// What the caller asked for: a known place or an explicit coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    Place(String),
    Coordinate(Coordinate),
}

impl WeatherQuery {
    /// Build a query from raw request parameters.
    ///
    /// A non-empty `location` takes precedence. Otherwise both `lat` and
    /// `lon` must be present and numeric.
    pub fn from_params(
        location: Option<&str>,
        lat: Option<&str>,
        lon: Option<&str>,
    ) -> Result<Self, WeatherError> {
        fn non_empty(s: Option<&str>) -> Option<&str> {
            s.filter(|v| !v.is_empty())
        }

        if let Some(name) = non_empty(location) {
            return Ok(WeatherQuery::Place(name.to_string()));
        }

        match (non_empty(lat), non_empty(lon)) {
            (Some(lat), Some(lon)) => {
                let latitude: f64 = lat
                    .trim()
                    .parse()
                    .map_err(|_| WeatherError::InvalidInput("Invalid latitude".to_string()))?;
                let longitude: f64 = lon
                    .trim()
                    .parse()
                    .map_err(|_| WeatherError::InvalidInput("Invalid longitude".to_string()))?;
                Ok(WeatherQuery::Coordinate(Coordinate::new(latitude, longitude)))
            }
            _ => Err(WeatherError::InvalidInput(
                "Location or coordinates required".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for WeatherQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherQuery::Place(name) => write!(f, "place '{name}'"),
            WeatherQuery::Coordinate(c) => write!(f, "coordinate {c}"),
        }
    }
}
