use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A user-curated place. Identity is the exact (lat, lon) pair.
///
/// The serialized shape is shared with geocoding search results, so a search
/// hit can be saved as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl SavedLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lon)
    }

    /// Exact coordinate equality, no rounding.
    pub fn same_place(&self, other: &SavedLocation) -> bool {
        self.lat == other.lat && self.lon == other.lon
    }

    /// "Name, State, CC" style label for listings.
    pub fn display_name(&self) -> String {
        match self.state.as_deref() {
            Some(state) if !state.is_empty() => {
                format!("{}, {}, {}", self.name, state, self.country)
            }
            _ => format!("{}, {}", self.name, self.country),
        }
    }
}

/// Upstream weather condition group (`weather[0].main`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    #[default]
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    Mist,
    Smoke,
    Haze,
    Dust,
    Fog,
    Sand,
    Ash,
    Squall,
    Tornado,
}

/// Coarse grouping used to pick a background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionCategory {
    Sunny,
    Cloudy,
    Rainy,
    Stormy,
    Snowy,
    Foggy,
    Windy,
}

impl Condition {
    pub const fn all() -> &'static [Condition] {
        &[
            Condition::Clear,
            Condition::Clouds,
            Condition::Rain,
            Condition::Drizzle,
            Condition::Thunderstorm,
            Condition::Snow,
            Condition::Mist,
            Condition::Smoke,
            Condition::Haze,
            Condition::Dust,
            Condition::Fog,
            Condition::Sand,
            Condition::Ash,
            Condition::Squall,
            Condition::Tornado,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Clear => "Clear",
            Condition::Clouds => "Clouds",
            Condition::Rain => "Rain",
            Condition::Drizzle => "Drizzle",
            Condition::Thunderstorm => "Thunderstorm",
            Condition::Snow => "Snow",
            Condition::Mist => "Mist",
            Condition::Smoke => "Smoke",
            Condition::Haze => "Haze",
            Condition::Dust => "Dust",
            Condition::Fog => "Fog",
            Condition::Sand => "Sand",
            Condition::Ash => "Ash",
            Condition::Squall => "Squall",
            Condition::Tornado => "Tornado",
        }
    }

    /// Parse an upstream condition string. Unknown values map to `Clear`.
    pub fn parse(value: &str) -> Self {
        Self::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == value)
            .unwrap_or_default()
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            Condition::Clear => "weather-sunny",
            Condition::Clouds => "weather-cloudy",
            Condition::Rain => "weather-rainy",
            Condition::Drizzle => "weather-partly-rainy",
            Condition::Thunderstorm => "weather-lightning",
            Condition::Snow => "weather-snowy",
            Condition::Mist
            | Condition::Smoke
            | Condition::Haze
            | Condition::Dust
            | Condition::Fog
            | Condition::Sand
            | Condition::Ash => "weather-fog",
            Condition::Squall => "weather-windy",
            Condition::Tornado => "weather-tornado",
        }
    }

    pub fn category(&self) -> ConditionCategory {
        match self {
            Condition::Clear => ConditionCategory::Sunny,
            Condition::Clouds => ConditionCategory::Cloudy,
            Condition::Rain | Condition::Drizzle => ConditionCategory::Rainy,
            Condition::Thunderstorm | Condition::Tornado => ConditionCategory::Stormy,
            Condition::Snow => ConditionCategory::Snowy,
            Condition::Mist
            | Condition::Smoke
            | Condition::Haze
            | Condition::Dust
            | Condition::Fog
            | Condition::Sand
            | Condition::Ash => ConditionCategory::Foggy,
            Condition::Squall => ConditionCategory::Windy,
        }
    }
}

impl From<String> for Condition {
    fn from(value: String) -> Self {
        Condition::parse(&value)
    }
}

impl From<Condition> for String {
    fn from(value: Condition) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions for one place at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub temperature: f64,
    pub feels_like: f64,
    pub humidity_pct: u8,
    pub wind_speed: f64,
    pub condition: Condition,
    pub description: String,
}

/// One forecast point. After normalization, one per day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub timestamp: DateTime<Utc>,
    /// Upstream `dt_txt`, e.g. "2024-01-01 12:00:00".
    pub time_text: String,
    pub temperature: f64,
    pub condition: Condition,
}

/// Snapshot and daily forecast produced by one fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub snapshot: WeatherSnapshot,
    pub forecast: Vec<ForecastEntry>,
}
