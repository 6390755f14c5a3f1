//! Error types shared by the store, the orchestrator and the search client.

use thiserror::Error;

/// Why the device position could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Location response could not be understood: {0}")]
    Malformed(String),
}

/// Failure of a single weather fetch.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Permission to access location was denied")]
    PermissionDenied,

    #[error("Current location is unavailable: {0}")]
    LocationUnavailable(String),

    #[error("{0}")]
    Configuration(String),

    #[error("Weather {endpoint} request failed: {message}")]
    Upstream {
        endpoint: &'static str,
        message: String,
    },
}

impl FetchError {
    pub(crate) fn upstream(endpoint: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            endpoint,
            message: message.into(),
        }
    }

    pub(crate) fn missing_api_key() -> Self {
        Self::Configuration(
            "API key is missing.\n\
             Hint: run `weather configure` or set WEATHER_API_KEY."
                .to_string(),
        )
    }
}

impl From<LocationError> for FetchError {
    fn from(err: LocationError) -> Self {
        Self::LocationUnavailable(err.to_string())
    }
}

/// Durable key-value store failure. Never surfaced by the location store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Geocoding search failure, shown only to the location management commands.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("{0}")]
    Configuration(String),

    #[error("Failed to send search request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Search request failed with status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse search results: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SearchError {
    /// Short message for display next to the search box.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "API key is missing. Run `weather configure` first.",
            _ => "Could not fetch locations.",
        }
    }
}
