//! IP geolocation error classification.

use std::time::Duration;

use weather_core::{Coordinates, GeoError, Geolocator, provider::ipapi::IpGeolocator};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn geolocator(server: &MockServer, timeout: Duration) -> IpGeolocator {
    let http = reqwest::Client::builder().timeout(timeout).build().expect("client");
    IpGeolocator::new(http, server.uri())
}

async fn mount(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/json"))
        .and(query_param("fields", "status,message,lat,lon"))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn success_yields_coordinates() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "status": "success", "lat": 38.72, "lon": -9.14 })),
    )
    .await;

    let at = geolocator(&server, Duration::from_secs(5)).locate().await;
    assert_eq!(at, Ok(Coordinates::new(38.72, -9.14)));
}

#[tokio::test]
async fn fail_status_is_position_unavailable() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "status": "fail", "message": "private range" })),
    )
    .await;

    let err = geolocator(&server, Duration::from_secs(5)).locate().await;
    assert_eq!(err, Err(GeoError::PositionUnavailable));
}

#[tokio::test]
async fn forbidden_is_permission_denied() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(403)).await;

    let err = geolocator(&server, Duration::from_secs(5)).locate().await;
    assert_eq!(err, Err(GeoError::PermissionDenied));
}

#[tokio::test]
async fn slow_response_is_timeout() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200)
            .set_delay(Duration::from_millis(500))
            .set_body_json(serde_json::json!({ "status": "success", "lat": 1.0, "lon": 2.0 })),
    )
    .await;

    let err = geolocator(&server, Duration::from_millis(50)).locate().await;
    assert_eq!(err, Err(GeoError::Timeout));
}

#[tokio::test]
async fn server_error_is_unknown() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(500)).await;

    let err = geolocator(&server, Duration::from_secs(5)).locate().await;
    assert!(matches!(err, Err(GeoError::Unknown(_))));
}
