//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The saved-locations store and its durable key-value backends
//! - Device location lookup
//! - The OpenWeather client (current conditions, forecast, geocoding)
//! - Fetch orchestration and the loading / error / ready view state
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod geolocation;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod storage;
pub mod store;
pub mod view;

pub use config::{Config, Units};
pub use error::{FetchError, LocationError, PersistenceError, SearchError};
pub use geolocation::{Geolocator, IpGeolocator, Permission};
pub use model::{
    Condition, ConditionCategory, Coordinates, ForecastEntry, SavedLocation, WeatherReport,
    WeatherSnapshot,
};
pub use orchestrator::{WeatherOrchestrator, select_daily};
pub use provider::{OpenWeatherClient, WeatherApi};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use store::LocationStore;
pub use view::{ViewState, WeatherView};
