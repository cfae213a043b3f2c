use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::model::{DailyForecast, ForecastResponse, GeocodeResult, HourlyForecast};

use super::{ForecastProvider, GeocodingProvider, truncate_body};

pub const GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com";
pub const FORECAST_BASE_URL: &str = "https://api.open-meteo.com";

const DAILY_FIELDS: &str = "weathercode,temperature_2m_max,temperature_2m_min";
const HOURLY_FIELDS: &str = "temperature_2m,weathercode";

/// Open-Meteo geocoding and forecast client. No API key.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    geocoding_base_url: String,
    forecast_base_url: String,
}

impl OpenMeteoProvider {
    pub fn new(http: Client, geocoding_base_url: String, forecast_base_url: String) -> Self {
        Self {
            http,
            geocoding_base_url: geocoding_base_url.trim_end_matches('/').to_string(),
            forecast_base_url: forecast_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned + Send>(
        &self,
        what: &str,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        tracing::debug!(url, what, "requesting Open-Meteo");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to Open-Meteo ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read Open-Meteo {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo {} request failed with status {}: {}",
                what,
                status,
                truncate_body(&body),
            ));
        }

        serde_json::from_str(&body).with_context(|| format!("Failed to parse Open-Meteo {what} JSON"))
    }
}

#[derive(Debug, Deserialize)]
struct OmGeocodeResponse {
    results: Option<Vec<OmPlace>>,
}

#[derive(Debug, Deserialize)]
struct OmPlace {
    name: String,
    latitude: f64,
    longitude: f64,
    timezone: Option<String>,
    country_code: Option<String>,
}

impl From<OmPlace> for GeocodeResult {
    fn from(p: OmPlace) -> Self {
        GeocodeResult {
            name: p.name,
            country_code: p.country_code,
            latitude: p.latitude,
            longitude: p.longitude,
            // Open-Meteo resolves "auto" from the coordinates.
            timezone: p.timezone.unwrap_or_else(|| "auto".to_string()),
        }
    }
}

/// Open-Meteo sends `null` for missing values and may omit a whole series.
type OmSeries<T> = Option<Vec<Option<T>>>;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmDaily {
    time: OmSeries<String>,
    weathercode: OmSeries<i32>,
    temperature_2m_max: OmSeries<f64>,
    temperature_2m_min: OmSeries<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OmHourly {
    time: OmSeries<String>,
    temperature_2m: OmSeries<f64>,
    weathercode: OmSeries<i32>,
}

/// Every value present, or nothing.
fn complete<T>(series: OmSeries<T>) -> Option<Vec<T>> {
    series?.into_iter().collect()
}

impl OmDaily {
    fn into_forecast(self) -> Option<DailyForecast> {
        Some(DailyForecast {
            dates: complete(self.time)?,
            temp_max: complete(self.temperature_2m_max)?,
            temp_min: complete(self.temperature_2m_min)?,
            weather_code: complete(self.weathercode)?,
        })
    }
}

impl OmHourly {
    fn into_forecast(self) -> Option<HourlyForecast> {
        Some(HourlyForecast {
            times: complete(self.time)?,
            temperature: complete(self.temperature_2m)?,
            weather_code: complete(self.weathercode)?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    daily: Option<OmDaily>,
    hourly: Option<OmHourly>,
}

#[async_trait]
impl GeocodingProvider for OpenMeteoProvider {
    async fn search(&self, query: &str) -> Result<Vec<GeocodeResult>> {
        let url = format!("{}/v1/search", self.geocoding_base_url);
        let parsed: OmGeocodeResponse = self.get_json("geocoding", &url, &[("name", query)]).await?;

        Ok(parsed.results.unwrap_or_default().into_iter().map(GeocodeResult::from).collect())
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    async fn forecast(&self, place: &GeocodeResult) -> Result<ForecastResponse> {
        let url = format!("{}/v1/forecast", self.forecast_base_url);
        let latitude = place.latitude.to_string();
        let longitude = place.longitude.to_string();

        let parsed: OmForecastResponse = self
            .get_json(
                "forecast",
                &url,
                &[
                    ("latitude", latitude.as_str()),
                    ("longitude", longitude.as_str()),
                    ("timezone", place.timezone.as_str()),
                    ("daily", DAILY_FIELDS),
                    ("hourly", HOURLY_FIELDS),
                ],
            )
            .await?;

        let daily = parsed.daily.and_then(OmDaily::into_forecast);
        let hourly = parsed.hourly.and_then(OmHourly::into_forecast);
        if daily.is_none() || hourly.is_none() {
            tracing::debug!(
                daily = daily.is_some(),
                hourly = hourly.is_some(),
                "Open-Meteo forecast is missing series or values"
            );
        }

        Ok(ForecastResponse { daily, hourly })
    }
}
