//! Flow-level error taxonomy.
//!
//! Every failure is caught at its flow boundary and kept as state; these
//! types carry enough to render a user-facing message.

use thiserror::Error;

/// Failures of the geocode-and-forecast search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Location not found")]
    LocationNotFound,

    #[error("Weather data unavailable")]
    WeatherUnavailable,

    #[error("Request failed: {0}")]
    Request(String),
}

impl SearchError {
    pub fn user_message(&self) -> String {
        match self {
            Self::LocationNotFound => {
                "Location not found. Check the spelling and search again.".to_string()
            }
            Self::WeatherUnavailable => {
                "Weather data is unavailable for this location right now.".to_string()
            }
            Self::Request(_) => "Could not reach the weather service. Try again.".to_string(),
        }
    }
}

/// Why the device position could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    #[error("Geolocation unsupported")]
    Unsupported,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    PositionUnavailable,

    #[error("Timed out")]
    Timeout,

    #[error("Unknown geolocation error: {0}")]
    Unknown(String),
}

impl GeoError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Unsupported => "Geolocation is not supported on this device.".to_string(),
            Self::PermissionDenied => "Location access was denied.".to_string(),
            Self::PositionUnavailable => "Location information is unavailable.".to_string(),
            Self::Timeout => "The request to get your location timed out.".to_string(),
            Self::Unknown(_) => "An unknown error occurred while locating you.".to_string(),
        }
    }
}

/// Failure of the coordinate-based current conditions call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("No API key configured for the current conditions provider")]
    MissingApiKey,

    #[error("Request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Provider reported status {0}")]
    EmbeddedStatus(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn user_message(&self) -> String {
        "Error fetching the location data.".to_string()
    }
}

/// End of the current-location flow with nothing to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TerminalError {
    #[error("No cached data")]
    NoCachedData,

    #[error("Cached data too stale")]
    CacheStale,
}

impl TerminalError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NoCachedData => "No cached data available. Please connect to the internet.",
            Self::CacheStale => {
                "Cached data is too old. Please connect to the internet to get the latest weather information."
            }
        }
    }
}
