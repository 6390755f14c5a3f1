use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::FetchError,
    model::{Coordinates, ForecastEntry, WeatherSnapshot},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Read-only weather endpoints used by the orchestrator.
#[async_trait]
pub trait WeatherApi: Send + Sync + Debug {
    /// False when no credential is available; callers must not issue requests then.
    fn is_configured(&self) -> bool;

    async fn current(&self, at: Coordinates) -> Result<WeatherSnapshot, FetchError>;

    /// Every forecast point the provider returns, in upstream order.
    async fn forecast(&self, at: Coordinates) -> Result<Vec<ForecastEntry>, FetchError>;
}
