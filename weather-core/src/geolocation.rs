//! Device location: permission gate plus current-position lookup.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{error::LocationError, model::Coordinates};

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn request_permission(&self) -> Permission;

    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Approximate position from the public IP address (ip-api.com).
///
/// Permission is a user setting: unless `allow_location` is enabled in the
/// config, the lookup is refused before any request is made.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    endpoint: String,
    allowed: bool,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    #[serde(default)]
    city: Option<String>,
}

impl IpGeolocator {
    pub fn new(endpoint: impl Into<String>, allowed: bool) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: endpoint.into(),
            allowed,
            http,
        }
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn request_permission(&self) -> Permission {
        if self.allowed {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        tracing::info!(endpoint = %self.endpoint, "looking up device location");

        let res = self
            .http
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| LocationError::ServiceUnavailable(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(LocationError::ServiceUnavailable(format!(
                "location lookup returned status {status}"
            )));
        }

        let body: IpApiResponse = res
            .json()
            .await
            .map_err(|e| LocationError::Malformed(e.to_string()))?;

        if body.status != "success" {
            return Err(LocationError::ServiceUnavailable(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                tracing::info!(lat, lon, city = ?body.city, "device location resolved");
                Ok(Coordinates::new(lat, lon))
            }
            _ => Err(LocationError::Malformed(
                "response is missing coordinates".to_string(),
            )),
        }
    }
}
