//! Resolve a coordinate and fetch current conditions plus a daily forecast.

use std::sync::Arc;

use crate::{
    error::FetchError,
    geolocation::{Geolocator, Permission},
    model::{Coordinates, ForecastEntry, WeatherReport},
    provider::WeatherApi,
};

/// Time-of-day marker in `dt_txt` that picks the one forecast point per day.
pub const DAILY_MARKER: &str = "12:00:00";

#[derive(Debug, Clone)]
pub struct WeatherOrchestrator {
    api: Arc<dyn WeatherApi>,
    geolocator: Arc<dyn Geolocator>,
}

impl WeatherOrchestrator {
    pub fn new(api: Arc<dyn WeatherApi>, geolocator: Arc<dyn Geolocator>) -> Self {
        Self { api, geolocator }
    }

    /// Fetch weather for explicit coordinates, or for the device location when
    /// either coordinate is `None`.
    pub async fn fetch(
        &self,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<WeatherReport, FetchError> {
        if !self.api.is_configured() {
            return Err(FetchError::missing_api_key());
        }

        let at = self.resolve(lat, lon).await?;

        let (snapshot, forecast) = tokio::try_join!(self.api.current(at), self.api.forecast(at))?;
        let forecast = select_daily(forecast);

        tracing::info!(
            location = %snapshot.location_name,
            condition = %snapshot.condition,
            days = forecast.len(),
            "weather fetched"
        );

        Ok(WeatherReport { snapshot, forecast })
    }

    async fn resolve(&self, lat: Option<f64>, lon: Option<f64>) -> Result<Coordinates, FetchError> {
        if let (Some(lat), Some(lon)) = (lat, lon) {
            return Ok(Coordinates::new(lat, lon));
        }

        if self.geolocator.request_permission().await == Permission::Denied {
            tracing::warn!("location permission denied");
            return Err(FetchError::PermissionDenied);
        }

        Ok(self.geolocator.current_position().await?)
    }
}

/// Keep the points stamped at noon, in upstream order.
///
/// This matches on the provider's text timestamp, so "noon" is whatever the
/// provider's clock says, not local noon.
pub fn select_daily(points: Vec<ForecastEntry>) -> Vec<ForecastEntry> {
    points
        .into_iter()
        .filter(|p| p.time_text.ends_with(DAILY_MARKER))
        .collect()
}
