use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::{
    error::WeatherError,
    model::{Coordinate, Place},
};

/// Read-only table of known places, looked up by exact name.
#[derive(Debug, Clone, Default)]
pub struct PlaceRegistry {
    places: Vec<Place>,
}

impl PlaceRegistry {
    pub fn new(places: Vec<Place>) -> Self {
        Self { places }
    }

    /// Load places from a JSON array of `{name, latitude, longitude}` records.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read places file: {}", path.display()))?;

        let places: Vec<Place> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse places file: {}", path.display()))?;

        tracing::info!(count = places.len(), path = %path.display(), "Loaded places");
        Ok(Self::new(places))
    }

    /// Coordinate of the first place whose name matches exactly.
    pub fn resolve(&self, name: &str) -> Result<Coordinate, WeatherError> {
        self.places
            .iter()
            .find(|p| p.name == name)
            .map(Place::coordinate)
            .ok_or_else(|| {
                tracing::warn!(place = name, "Place not found");
                WeatherError::PlaceNotFound(name.to_string())
            })
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}
