//! Approximate device position from the public IP address (ip-api.com).

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::{error::GeoError, model::Coordinates};

use super::Geolocator;

pub const BASE_URL: &str = "http://ip-api.com";

#[derive(Debug, Clone)]
pub struct IpGeolocator {
    http: Client,
    base_url: String,
}

impl IpGeolocator {
    pub fn new(http: Client, base_url: String) -> Self {
        Self { http, base_url: base_url.trim_end_matches('/').to_string() }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

fn classify_transport(err: &reqwest::Error) -> GeoError {
    if err.is_timeout() {
        GeoError::Timeout
    } else {
        GeoError::Unknown(err.to_string())
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeoError> {
        let url = format!("{}/json", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(|e| classify_transport(&e))?;

        match res.status() {
            s if s.is_success() => {}
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
                return Err(GeoError::PermissionDenied);
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                return Err(GeoError::Timeout);
            }
            s => return Err(GeoError::Unknown(format!("ip-api returned status {s}"))),
        }

        let body: IpApiResponse = res.json().await.map_err(|e| {
            if e.is_timeout() { GeoError::Timeout } else { GeoError::Unknown(e.to_string()) }
        })?;

        if body.status != "success" {
            tracing::debug!(message = ?body.message, "ip-api could not place this address");
            return Err(GeoError::PositionUnavailable);
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(GeoError::PositionUnavailable),
        }
    }
}
