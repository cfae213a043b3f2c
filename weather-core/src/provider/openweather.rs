use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::FetchError,
    model::{Coordinates, CurrentConditions},
};

use super::{ConditionsProvider, truncate_body};

pub const BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(http: Client, base_url: String, api_key: Option<String>) -> Self {
        Self { api_key, base_url: base_url.trim_end_matches('/').to_string(), http }
    }
}

/// `cod` arrives as a number on success and often as a string on errors.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OwCode {
    Number(i64),
    Text(String),
}

impl OwCode {
    fn is_ok(&self) -> bool {
        match self {
            OwCode::Number(n) => *n == 200,
            OwCode::Text(s) => s.trim() == "200",
        }
    }

    fn describe(&self) -> String {
        match self {
            OwCode::Number(n) => n.to_string(),
            OwCode::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwEnvelope {
    cod: Option<OwCode>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

/// Validate the embedded status, then map the payload.
fn parse_current(body: &str) -> Result<CurrentConditions, FetchError> {
    let envelope: OwEnvelope =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    if let Some(cod) = envelope.cod.as_ref().filter(|c| !c.is_ok()) {
        let detail = match envelope.message {
            Some(m) => format!("{} ({m})", cod.describe()),
            None => cod.describe(),
        };
        return Err(FetchError::EmbeddedStatus(detail));
    }

    let parsed: OwCurrentResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Parse(e.to_string()))?;

    let (description, icon) = parsed
        .weather
        .into_iter()
        .next()
        .map(|w| (w.description, w.icon))
        .unwrap_or_else(|| ("Unknown".to_string(), String::new()));

    Ok(CurrentConditions {
        name: parsed.name,
        weather_description: description,
        icon_id: icon,
        temperature_celsius: parsed.main.temp,
        humidity: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
    })
}

#[async_trait]
impl ConditionsProvider for OpenWeatherProvider {
    async fn current(&self, at: Coordinates) -> Result<CurrentConditions, FetchError> {
        let api_key = self.api_key.as_deref().ok_or(FetchError::MissingApiKey)?;
        let url = format!("{}/data/2.5/weather", self.base_url);

        let lat = at.latitude.to_string();
        let lon = at.longitude.to_string();

        tracing::debug!(%lat, %lon, "requesting OpenWeather current conditions");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("appid", api_key),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| FetchError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16(), body: truncate_body(&body) });
        }

        parse_current(&body)
    }
}
