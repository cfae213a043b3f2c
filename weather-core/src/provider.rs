use crate::{
    Config,
    error::{FetchError, GeoError},
    model::{Coordinates, CurrentConditions, ForecastResponse, GeocodeResult},
    provider::{ipapi::IpGeolocator, openmeteo::OpenMeteoProvider, openweather::OpenWeatherProvider},
};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use std::{convert::TryFrom, fmt::Debug, time::Duration};

pub mod ipapi;
pub mod openmeteo;
pub mod openweather;

const USER_AGENT: &str = concat!("weather-dashboard/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenMeteo,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "openmeteo",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenMeteo, ProviderId::OpenWeather]
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => openmeteo::FORECAST_BASE_URL,
            ProviderId::OpenWeather => openweather::BASE_URL,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openmeteo" | "open-meteo" => Ok(ProviderId::OpenMeteo),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openmeteo, openweather."
            )),
        }
    }
}

/// Place-name lookup.
#[async_trait]
pub trait GeocodingProvider: Send + Sync + Debug {
    /// All matches for `query`, best first. Empty when nothing matched.
    async fn search(&self, query: &str) -> anyhow::Result<Vec<GeocodeResult>>;
}

#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn forecast(&self, place: &GeocodeResult) -> anyhow::Result<ForecastResponse>;
}

/// Current conditions at a coordinate.
#[async_trait]
pub trait ConditionsProvider: Send + Sync + Debug {
    async fn current(&self, at: Coordinates) -> Result<CurrentConditions, FetchError>;
}

/// Source of the device position.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, GeoError>;
}

/// Always answers with the same coordinates.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinates);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeoError> {
        Ok(self.0)
    }
}

/// No position source on this device.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedGeolocator;

#[async_trait]
impl Geolocator for UnsupportedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeoError> {
        Err(GeoError::Unsupported)
    }
}

/// Shared HTTP client with the configured timeout.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")
}

/// Open-Meteo serves both geocoding and forecasts.
pub fn open_meteo_from_config(config: &Config) -> anyhow::Result<OpenMeteoProvider> {
    Ok(OpenMeteoProvider::new(
        http_client(config)?,
        config.geocoding_base_url(),
        config.base_url(ProviderId::OpenMeteo),
    ))
}

/// A missing key is not an error here; the provider reports it per call so
/// the current-location flow can still fall back to its snapshot.
pub fn conditions_provider_from_config(config: &Config) -> anyhow::Result<OpenWeatherProvider> {
    if !config.is_provider_configured(ProviderId::OpenWeather) {
        tracing::warn!(
            "No API key configured for provider 'openweather'. \
             Hint: run `weather configure openweather` and enter your API key."
        );
    }

    Ok(OpenWeatherProvider::new(
        http_client(config)?,
        config.base_url(ProviderId::OpenWeather),
        config.provider_api_key(ProviderId::OpenWeather).map(str::to_owned),
    ))
}

/// Pick the geolocation source named in config.
///
/// `fixed` without both coordinates degrades to unsupported.
pub fn geolocator_from_config(config: &Config) -> anyhow::Result<Box<dyn Geolocator>> {
    use crate::config::GeolocationSource;

    let geo = &config.geolocation;
    let boxed: Box<dyn Geolocator> = match geo.source {
        GeolocationSource::Ip => {
            let base_url = geo.base_url.clone().unwrap_or_else(|| ipapi::BASE_URL.to_string());
            Box::new(IpGeolocator::new(http_client(config)?, base_url))
        }
        GeolocationSource::Fixed => match (geo.latitude, geo.longitude) {
            (Some(lat), Some(lon)) => Box::new(FixedGeolocator(Coordinates::new(lat, lon))),
            _ => {
                tracing::warn!("geolocation source is 'fixed' but latitude/longitude are not set");
                Box::new(UnsupportedGeolocator)
            }
        },
        GeolocationSource::None => Box::new(UnsupportedGeolocator),
    };

    Ok(boxed)
}

/// Cut long error bodies down for messages.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
