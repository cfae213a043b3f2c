//! Current-location flow against a mock OpenWeather server.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use weather_core::{
    CachedSnapshot, Coordinates, CurrentConditions, CurrentLocationResolver, CurrentLocationState,
    GeoError, Geolocator, MemoryStore, SnapshotCache, TemperatureUnit, TerminalError,
    location::ConditionsSource,
    provider::{FixedGeolocator, openweather::OpenWeatherProvider},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

const NOW_MS: i64 = 1_700_000_000_000;

fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(NOW_MS).expect("valid timestamp")
}

#[derive(Debug)]
struct DeniedGeolocator;

#[async_trait]
impl Geolocator for DeniedGeolocator {
    async fn locate(&self) -> Result<Coordinates, GeoError> {
        Err(GeoError::PermissionDenied)
    }
}

fn lisbon_payload() -> serde_json::Value {
    serde_json::json!({
        "coord": { "lon": -9.14, "lat": 38.72 },
        "weather": [{ "id": 800, "main": "Clear", "description": "clear sky", "icon": "01d" }],
        "main": { "temp": 25.0, "feels_like": 24.6, "humidity": 45 },
        "wind": { "speed": 4.1 },
        "name": "Lisbon",
        "cod": 200
    })
}

fn cached(name: &str, age: Duration) -> CachedSnapshot {
    CachedSnapshot {
        location: CurrentConditions {
            name: name.into(),
            weather_description: "overcast clouds".into(),
            icon_id: "04d".into(),
            temperature_celsius: 10.0,
            humidity: 80,
            wind_speed: 5.0,
        },
        timestamp: NOW_MS - age.num_milliseconds(),
    }
}

fn resolver(
    server: &MockServer,
    geolocator: Arc<dyn Geolocator>,
    cache: SnapshotCache,
) -> CurrentLocationResolver {
    let conditions = Arc::new(OpenWeatherProvider::new(
        reqwest::Client::new(),
        server.uri(),
        Some("TEST_KEY".into()),
    ));
    CurrentLocationResolver::new(geolocator, conditions, cache).with_clock(fixed_now)
}

fn lisbon_geo() -> Arc<dyn Geolocator> {
    Arc::new(FixedGeolocator(Coordinates::new(38.72, -9.14)))
}

#[tokio::test]
async fn live_fetch_resolves_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("appid", "TEST_KEY"))
        .and(query_param("units", "metric"))
        .and(query_param("lat", "38.72"))
        .and(query_param("lon", "-9.14"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lisbon_payload()))
        .expect(1)
        .mount(&server)
        .await;

    let cache = SnapshotCache::new(Arc::new(MemoryStore::new()));
    let mut flow = resolver(&server, lisbon_geo(), cache.clone());

    let state = flow.run().await;
    let resolved = state.resolved().expect("live conditions");
    assert_eq!(resolved.source, ConditionsSource::Live);
    assert_eq!(resolved.conditions.name, "Lisbon");
    assert_eq!(resolved.display_temperature(TemperatureUnit::Fahrenheit), 77.0);

    let snapshot = cache.read().unwrap().expect("snapshot written");
    assert_eq!(snapshot.timestamp, NOW_MS);
    assert_eq!(snapshot.location.name, "Lisbon");
}

#[tokio::test]
async fn permission_denied_without_cache_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lisbon_payload()))
        .expect(0)
        .mount(&server)
        .await;

    let cache = SnapshotCache::new(Arc::new(MemoryStore::new()));
    let mut flow = resolver(&server, Arc::new(DeniedGeolocator), cache);

    let state = flow.run().await;
    let error = state.terminal().expect("terminal state");
    assert_eq!(error, TerminalError::NoCachedData);
    assert_eq!(
        error.user_message(),
        "No cached data available. Please connect to the internet."
    );
}

#[tokio::test]
async fn failed_fetch_uses_recent_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cache = SnapshotCache::new(Arc::new(MemoryStore::new()));
    cache.write(&cached("Porto", Duration::hours(2))).unwrap();

    let mut flow = resolver(&server, lisbon_geo(), cache.clone());
    let state = flow.run().await;

    let resolved = state.resolved().expect("cached conditions");
    assert_eq!(resolved.conditions.name, "Porto");
    assert_eq!(resolved.fahrenheit, 50.0);
    assert!(matches!(resolved.source, ConditionsSource::Cache { .. }));
    assert_eq!(state.notice(), Some("Error fetching the location data."));

    // The fallback does not refresh the snapshot.
    assert_eq!(cache.read().unwrap().unwrap().timestamp, NOW_MS - Duration::hours(2).num_milliseconds());
}

#[tokio::test]
async fn embedded_error_code_falls_back_to_stale_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "cod": "429", "message": "rate limited" })),
        )
        .mount(&server)
        .await;

    let cache = SnapshotCache::new(Arc::new(MemoryStore::new()));
    cache.write(&cached("Porto", Duration::hours(6))).unwrap();

    let mut flow = resolver(&server, lisbon_geo(), cache);
    let state = flow.run().await;

    assert_eq!(state.terminal(), Some(TerminalError::CacheStale));
    assert!(state.resolved().is_none());
}

#[tokio::test]
async fn run_can_be_repeated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(lisbon_payload()))
        .expect(2)
        .mount(&server)
        .await;

    let cache = SnapshotCache::new(Arc::new(MemoryStore::new()));
    let mut flow = resolver(&server, lisbon_geo(), cache);

    assert!(flow.run().await.resolved().is_some());
    assert!(flow.run().await.resolved().is_some());
}

#[tokio::test]
async fn observer_sees_loading_before_the_result() {
    let server = MockServer::start().await;
    let cache = SnapshotCache::new(Arc::new(MemoryStore::new()));
    let mut flow = resolver(&server, Arc::new(DeniedGeolocator), cache);

    let mut seen = Vec::new();
    let state = flow.run_observed(|s| seen.push(s.clone())).await.clone();

    assert_eq!(seen.first(), Some(&CurrentLocationState::Locating));
    assert_eq!(seen.last(), Some(&state));
    assert!(seen[..seen.len() - 1].iter().all(CurrentLocationState::is_loading));
    assert_eq!(state.terminal(), Some(TerminalError::NoCachedData));
}
