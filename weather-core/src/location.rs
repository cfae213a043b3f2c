//! Current-location flow with snapshot fallback.
//!
//! ```text
//! Idle -> Locating -> Fetching -> Resolved
//!            |           |
//!            v           v
//!        GeoError    FetchError
//!            \           /
//!             v         v
//!            CacheFallback -> Resolved | Terminal
//! ```
//!
//! [`transition`] is pure: it maps `(state, event)` to the next state and
//! one [`Effect`] for the driver to perform. [`CurrentLocationResolver`]
//! performs effects and feeds their results back as events.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    cache::{SnapshotCache, is_fresh},
    error::{FetchError, GeoError, TerminalError},
    format::celsius_to_fahrenheit,
    model::{CachedSnapshot, Coordinates, CurrentConditions, TemperatureUnit},
    provider::{ConditionsProvider, Geolocator},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionsSource {
    Live,
    /// Served from a snapshot captured at this epoch-millis time.
    Cache { captured_at: i64 },
}

/// Conditions ready for display in either unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConditions {
    pub conditions: CurrentConditions,
    pub fahrenheit: f64,
    pub source: ConditionsSource,
}

impl ResolvedConditions {
    fn new(conditions: CurrentConditions, source: ConditionsSource) -> Self {
        let fahrenheit = celsius_to_fahrenheit(conditions.temperature_celsius);
        Self { conditions, fahrenheit, source }
    }

    /// Selects the precomputed value; nothing is re-derived.
    pub fn display_temperature(&self, unit: TemperatureUnit) -> f64 {
        match unit {
            TemperatureUnit::Celsius => self.conditions.temperature_celsius,
            TemperatureUnit::Fahrenheit => self.fahrenheit,
        }
    }
}

/// Why the live path was abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    Geo(GeoError),
    Fetch(FetchError),
}

impl FallbackReason {
    pub fn user_message(&self) -> String {
        match self {
            FallbackReason::Geo(e) => e.user_message(),
            FallbackReason::Fetch(e) => e.user_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CurrentLocationState {
    #[default]
    Idle,
    Locating,
    Fetching {
        at: Coordinates,
    },
    GeoError(GeoError),
    FetchError(FetchError),
    CacheFallback {
        reason: FallbackReason,
    },
    Resolved {
        conditions: ResolvedConditions,
        /// Set when the conditions came from the snapshot.
        notice: Option<String>,
    },
    Terminal {
        error: TerminalError,
        notice: Option<String>,
    },
}

impl CurrentLocationState {
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            CurrentLocationState::Locating
                | CurrentLocationState::Fetching { .. }
                | CurrentLocationState::GeoError(_)
                | CurrentLocationState::FetchError(_)
                | CurrentLocationState::CacheFallback { .. }
        )
    }

    pub fn resolved(&self) -> Option<&ResolvedConditions> {
        match self {
            CurrentLocationState::Resolved { conditions, .. } => Some(conditions),
            _ => None,
        }
    }

    pub fn terminal(&self) -> Option<TerminalError> {
        match self {
            CurrentLocationState::Terminal { error, .. } => Some(*error),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&str> {
        match self {
            CurrentLocationState::Resolved { notice, .. }
            | CurrentLocationState::Terminal { notice, .. } => notice.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Start,
    Located(Coordinates),
    LocateFailed(GeoError),
    Fetched { conditions: CurrentConditions, now_ms: i64 },
    FetchFailed(FetchError),
    /// Leave an error state for the snapshot.
    Fallback,
    CacheLoaded { snapshot: Option<CachedSnapshot>, now_ms: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    RequestPosition,
    FetchConditions(Coordinates),
    /// Feed [`LocationEvent::Fallback`] next.
    EnterFallback,
    ReadCache,
    WriteCache(CachedSnapshot),
}

pub fn transition(
    state: CurrentLocationState,
    event: LocationEvent,
) -> (CurrentLocationState, Effect) {
    use CurrentLocationState as S;
    use LocationEvent as E;

    match (state, event) {
        (S::Idle, E::Start) => (S::Locating, Effect::RequestPosition),

        (S::Locating, E::Located(at)) => (S::Fetching { at }, Effect::FetchConditions(at)),

        // Unsupported skips the error taxonomy entirely.
        (S::Locating, E::LocateFailed(GeoError::Unsupported)) => (
            S::CacheFallback { reason: FallbackReason::Geo(GeoError::Unsupported) },
            Effect::ReadCache,
        ),
        (S::Locating, E::LocateFailed(err)) => (S::GeoError(err), Effect::EnterFallback),

        (S::Fetching { .. }, E::Fetched { conditions, now_ms }) => {
            let snapshot = SnapshotCache::capture(&conditions, now_ms);
            (
                S::Resolved {
                    conditions: ResolvedConditions::new(conditions, ConditionsSource::Live),
                    notice: None,
                },
                Effect::WriteCache(snapshot),
            )
        }
        (S::Fetching { .. }, E::FetchFailed(err)) => (S::FetchError(err), Effect::EnterFallback),

        (S::GeoError(err), E::Fallback) => {
            (S::CacheFallback { reason: FallbackReason::Geo(err) }, Effect::ReadCache)
        }
        (S::FetchError(err), E::Fallback) => {
            (S::CacheFallback { reason: FallbackReason::Fetch(err) }, Effect::ReadCache)
        }

        (S::CacheFallback { reason }, E::CacheLoaded { snapshot, now_ms }) => {
            let notice = Some(reason.user_message());
            match snapshot {
                None => (S::Terminal { error: TerminalError::NoCachedData, notice }, Effect::None),
                Some(s) if !is_fresh(s.timestamp, now_ms) => {
                    (S::Terminal { error: TerminalError::CacheStale, notice }, Effect::None)
                }
                Some(s) => (
                    S::Resolved {
                        conditions: ResolvedConditions::new(
                            s.location,
                            ConditionsSource::Cache { captured_at: s.timestamp },
                        ),
                        notice,
                    },
                    Effect::None,
                ),
            }
        }

        (state, event) => {
            tracing::debug!(?state, ?event, "ignoring event with no transition");
            (state, Effect::None)
        }
    }
}

/// Drives [`transition`] against real collaborators.
#[derive(Debug)]
pub struct CurrentLocationResolver {
    geolocator: Arc<dyn Geolocator>,
    conditions: Arc<dyn ConditionsProvider>,
    cache: SnapshotCache,
    clock: fn() -> DateTime<Utc>,
    state: CurrentLocationState,
}

impl CurrentLocationResolver {
    pub fn new(
        geolocator: Arc<dyn Geolocator>,
        conditions: Arc<dyn ConditionsProvider>,
        cache: SnapshotCache,
    ) -> Self {
        Self { geolocator, conditions, cache, clock: Utc::now, state: CurrentLocationState::Idle }
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> &CurrentLocationState {
        &self.state
    }

    /// Run one attempt from `Idle` to `Resolved` or `Terminal`.
    pub async fn run(&mut self) -> &CurrentLocationState {
        self.run_observed(|_| {}).await
    }

    /// Like [`run`](Self::run), calling `observe` after every transition.
    pub async fn run_observed<F>(&mut self, mut observe: F) -> &CurrentLocationState
    where
        F: FnMut(&CurrentLocationState),
    {
        self.state = CurrentLocationState::Idle;
        let mut event = Some(LocationEvent::Start);

        while let Some(ev) = event.take() {
            let (next, effect) = transition(std::mem::take(&mut self.state), ev);
            self.state = next;
            observe(&self.state);
            event = self.perform(effect).await;
        }

        match &self.state {
            CurrentLocationState::Resolved { conditions, .. } => {
                tracing::info!(location = %conditions.conditions.name, source = ?conditions.source, "current location resolved");
            }
            CurrentLocationState::Terminal { error, notice } => {
                tracing::warn!(%error, notice = ?notice, "current location flow ended without data");
            }
            other => tracing::debug!(state = ?other, "current location flow stopped"),
        }

        &self.state
    }

    async fn perform(&self, effect: Effect) -> Option<LocationEvent> {
        match effect {
            Effect::None => None,
            Effect::RequestPosition => Some(match self.geolocator.locate().await {
                Ok(at) => LocationEvent::Located(at),
                Err(e) => {
                    tracing::warn!(error = %e, "geolocation failed");
                    LocationEvent::LocateFailed(e)
                }
            }),
            Effect::FetchConditions(at) => Some(match self.conditions.current(at).await {
                Ok(conditions) => {
                    LocationEvent::Fetched { conditions, now_ms: self.now_ms() }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "current conditions fetch failed");
                    LocationEvent::FetchFailed(e)
                }
            }),
            Effect::EnterFallback => Some(LocationEvent::Fallback),
            Effect::ReadCache => {
                let snapshot = self.cache.read().unwrap_or_else(|e| {
                    tracing::warn!("ignoring unreadable snapshot: {e:#}");
                    None
                });
                Some(LocationEvent::CacheLoaded { snapshot, now_ms: self.now_ms() })
            }
            Effect::WriteCache(snapshot) => {
                if let Err(e) = self.cache.write(&snapshot) {
                    tracing::warn!("failed to write snapshot: {e:#}");
                }
                None
            }
        }
    }

    fn now_ms(&self) -> i64 {
        (self.clock)().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::SNAPSHOT_MAX_AGE_MS;

    const NOW: i64 = 1_700_000_000_000;

    fn conditions() -> CurrentConditions {
        CurrentConditions {
            name: "Lisbon".into(),
            weather_description: "clear sky".into(),
            icon_id: "01d".into(),
            temperature_celsius: 20.0,
            humidity: 50,
            wind_speed: 2.0,
        }
    }

    fn fallback(reason: FallbackReason) -> CurrentLocationState {
        CurrentLocationState::CacheFallback { reason }
    }

    #[test]
    fn start_requests_position() {
        let (s, e) = transition(CurrentLocationState::Idle, LocationEvent::Start);
        assert_eq!(s, CurrentLocationState::Locating);
        assert_eq!(e, Effect::RequestPosition);
    }

    #[test]
    fn located_fetches_conditions() {
        let at = Coordinates::new(1.0, 2.0);
        let (s, e) = transition(CurrentLocationState::Locating, LocationEvent::Located(at));
        assert_eq!(s, CurrentLocationState::Fetching { at });
        assert_eq!(e, Effect::FetchConditions(at));
    }

    #[test]
    fn unsupported_goes_straight_to_fallback() {
        let (s, e) = transition(
            CurrentLocationState::Locating,
            LocationEvent::LocateFailed(GeoError::Unsupported),
        );
        assert_eq!(s, fallback(FallbackReason::Geo(GeoError::Unsupported)));
        assert_eq!(e, Effect::ReadCache);
    }

    #[test]
    fn classified_geo_errors_pass_through_error_state() {
        for err in [GeoError::PermissionDenied, GeoError::PositionUnavailable, GeoError::Timeout] {
            let (s, e) = transition(
                CurrentLocationState::Locating,
                LocationEvent::LocateFailed(err.clone()),
            );
            assert_eq!(s, CurrentLocationState::GeoError(err.clone()));
            assert_eq!(e, Effect::EnterFallback);

            let (s, e) = transition(s, LocationEvent::Fallback);
            assert_eq!(s, fallback(FallbackReason::Geo(err)));
            assert_eq!(e, Effect::ReadCache);
        }
    }

    #[test]
    fn live_fetch_resolves_and_writes_snapshot() {
        let at = Coordinates::new(1.0, 2.0);
        let (s, e) = transition(
            CurrentLocationState::Fetching { at },
            LocationEvent::Fetched { conditions: conditions(), now_ms: NOW },
        );

        let resolved = s.resolved().unwrap();
        assert_eq!(resolved.source, ConditionsSource::Live);
        assert_eq!(resolved.fahrenheit, 68.0);
        assert_eq!(s.notice(), None);
        assert_eq!(
            e,
            Effect::WriteCache(CachedSnapshot { location: conditions(), timestamp: NOW })
        );
    }

    #[test]
    fn fetch_failure_falls_back() {
        let at = Coordinates::new(1.0, 2.0);
        let err = FetchError::Status { status: 500, body: String::new() };
        let (s, e) = transition(
            CurrentLocationState::Fetching { at },
            LocationEvent::FetchFailed(err.clone()),
        );
        assert_eq!(e, Effect::EnterFallback);
        let (s, _) = transition(s, LocationEvent::Fallback);
        assert_eq!(s, fallback(FallbackReason::Fetch(err)));
    }

    #[test]
    fn empty_cache_is_terminal() {
        let (s, e) = transition(
            fallback(FallbackReason::Geo(GeoError::PermissionDenied)),
            LocationEvent::CacheLoaded { snapshot: None, now_ms: NOW },
        );
        assert_eq!(s.terminal(), Some(TerminalError::NoCachedData));
        assert_eq!(s.notice(), Some("Location access was denied."));
        assert_eq!(e, Effect::None);
    }

    #[test]
    fn cache_age_boundary() {
        let fresh = CachedSnapshot { location: conditions(), timestamp: NOW - SNAPSHOT_MAX_AGE_MS + 1 };
        let (s, _) = transition(
            fallback(FallbackReason::Geo(GeoError::Timeout)),
            LocationEvent::CacheLoaded { snapshot: Some(fresh), now_ms: NOW },
        );
        let resolved = s.resolved().unwrap();
        assert_eq!(
            resolved.source,
            ConditionsSource::Cache { captured_at: NOW - SNAPSHOT_MAX_AGE_MS + 1 }
        );

        let stale = CachedSnapshot { location: conditions(), timestamp: NOW - SNAPSHOT_MAX_AGE_MS };
        let (s, _) = transition(
            fallback(FallbackReason::Geo(GeoError::Timeout)),
            LocationEvent::CacheLoaded { snapshot: Some(stale), now_ms: NOW },
        );
        assert_eq!(s.terminal(), Some(TerminalError::CacheStale));
        assert!(s.resolved().is_none());
    }

    #[test]
    fn corrupt_timestamp_is_stale_not_rendered() {
        let corrupt = CachedSnapshot { location: conditions(), timestamp: i64::MIN };
        let (s, _) = transition(
            fallback(FallbackReason::Geo(GeoError::Timeout)),
            LocationEvent::CacheLoaded { snapshot: Some(corrupt), now_ms: NOW },
        );
        assert_eq!(s.terminal(), Some(TerminalError::CacheStale));
    }

    #[test]
    fn unexpected_event_leaves_state() {
        let (s, e) = transition(CurrentLocationState::Idle, LocationEvent::Fallback);
        assert_eq!(s, CurrentLocationState::Idle);
        assert_eq!(e, Effect::None);
    }

    #[test]
    fn unit_toggle_selects_precomputed_value() {
        let resolved = ResolvedConditions::new(conditions(), ConditionsSource::Live);
        let unit = TemperatureUnit::Celsius;
        assert_eq!(resolved.display_temperature(unit), 20.0);
        assert_eq!(resolved.display_temperature(unit.toggled()), 68.0);
    }
}
