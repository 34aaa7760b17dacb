//! Core library for the cached weather service.
//!
//! This crate defines:
//! - Configuration handling
//! - The known-place registry
//! - Cache backends and the upstream weather provider
//! - The cache-aside [`WeatherService`] tying them together
//!
//! It is used by `weather-server`, but can also be embedded by other binaries.

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod places;
pub mod provider;
pub mod service;

pub use cache::{CacheBackend, WeatherCache};
pub use config::Config;
pub use error::{CacheError, WeatherError};
pub use model::{Coordinate, Place, WeatherObservation, WeatherQuery};
pub use places::PlaceRegistry;
pub use provider::WeatherProvider;
pub use service::{CacheSource, WeatherService};
