use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use crate::{
    config::{Config, Units},
    error::{FetchError, SearchError},
    model::{Condition, Coordinates, ForecastEntry, SavedLocation, WeatherSnapshot},
};

use super::WeatherApi;

const REQUEST_TIMEOUT_SECS: u64 = 15;
const SEARCH_LIMIT: &str = "5";

/// Shorter queries are not sent to the geocoder.
pub const MIN_QUERY_LEN: usize = 3;

/// OpenWeather current, 5-day/3-hour forecast and direct geocoding endpoints.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: Option<String>,
    base_url: String,
    units: Units,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>, units: Units) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            units,
            http,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_key().map(str::to_owned),
            config.api_base_url.clone(),
            config.units,
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a weather endpoint, returning the body only on a 2xx status.
    async fn get_weather_body(
        &self,
        endpoint: &'static str,
        path: &str,
        at: Coordinates,
    ) -> Result<String, FetchError> {
        let api_key = self.api_key.as_deref().ok_or_else(FetchError::missing_api_key)?;

        let lat = at.latitude.to_string();
        let lon = at.longitude.to_string();

        tracing::debug!(endpoint, lat = at.latitude, lon = at.longitude, "requesting weather");

        let res = self
            .http
            .get(self.url(path))
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", api_key),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| FetchError::upstream(endpoint, format!("failed to send request: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| FetchError::upstream(endpoint, format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(FetchError::upstream(endpoint, upstream_message(status, &body)));
        }

        Ok(body)
    }

    /// Look up to five places matching a free-text city query.
    pub async fn search(&self, query: &str) -> Result<Vec<SavedLocation>, SearchError> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        let api_key = self.api_key.as_deref().ok_or_else(|| {
            SearchError::Configuration("API key is missing; cannot search locations.".to_string())
        })?;

        let res = self
            .http
            .get(self.url("/geo/1.0/direct"))
            .query(&[("q", query), ("limit", SEARCH_LIMIT), ("appid", api_key)])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::error!(%status, query, "Failed to fetch locations");
            return Err(SearchError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let results: Vec<SavedLocation> = serde_json::from_str(&body)?;
        tracing::debug!(query, count = results.len(), "location search finished");
        Ok(results)
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[derive(Debug, Deserialize)]
struct OwForecastPoint {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    dt_txt: String,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Vec<OwForecastPoint>,
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: String,
}

impl From<OwCurrentResponse> for WeatherSnapshot {
    fn from(parsed: OwCurrentResponse) -> Self {
        let (condition, description) = parsed
            .weather
            .first()
            .map(|w| (Condition::parse(&w.main), w.description.clone()))
            .unwrap_or_default();

        WeatherSnapshot {
            location_name: parsed.name,
            temperature: parsed.main.temp,
            feels_like: parsed.main.feels_like,
            humidity_pct: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            condition,
            description,
        }
    }
}

impl TryFrom<OwForecastPoint> for ForecastEntry {
    type Error = FetchError;

    fn try_from(point: OwForecastPoint) -> Result<Self, Self::Error> {
        let timestamp = DateTime::<Utc>::from_timestamp(point.dt, 0).ok_or_else(|| {
            FetchError::upstream("forecast", format!("timestamp {} is out of range", point.dt))
        })?;

        Ok(ForecastEntry {
            timestamp,
            time_text: point.dt_txt,
            temperature: point.main.temp,
            condition: point
                .weather
                .first()
                .map(|w| Condition::parse(&w.main))
                .unwrap_or_default(),
        })
    }
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn current(&self, at: Coordinates) -> Result<WeatherSnapshot, FetchError> {
        let body = self.get_weather_body("current", "/data/2.5/weather", at).await?;

        let parsed: OwCurrentResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::upstream("current", format!("malformed response: {e}")))?;

        Ok(parsed.into())
    }

    async fn forecast(&self, at: Coordinates) -> Result<Vec<ForecastEntry>, FetchError> {
        let body = self.get_weather_body("forecast", "/data/2.5/forecast", at).await?;

        let parsed: OwForecastResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::upstream("forecast", format!("malformed response: {e}")))?;

        parsed.list.into_iter().map(ForecastEntry::try_from).collect()
    }
}

/// Prefer the provider's own `message` field, else the status and raw body.
fn upstream_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<OwErrorBody>(body) {
        Ok(err) if !err.message.is_empty() => err.message,
        _ => format!("status {}: {}", status, truncate_body(body)),
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
