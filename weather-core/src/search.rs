//! Geocode-and-forecast search.
//!
//! [`SearchResolver`] performs the two sequential calls and nothing else.
//! [`SearchFlow`] owns the observable state and decides which completions
//! are committed: every attempt gets a [`Generation`], and only the most
//! recently issued generation may replace the state. An older request that
//! resolves late is dropped.

use chrono::Utc;
use std::sync::Arc;

use crate::{
    error::SearchError,
    format::flag_from_country_code,
    model::{DailyForecast, HourlyForecast},
    preference::PreferenceStore,
    provider::{ForecastProvider, GeocodingProvider},
};

/// Display-ready search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// The raw query that produced this outcome.
    pub query: String,
    pub name: String,
    pub flag: String,
    pub daily: DailyForecast,
    pub hourly: HourlyForecast,
}

impl SearchOutcome {
    /// "Lisbon 🇵🇹"
    pub fn display_location(&self) -> String {
        if self.flag.is_empty() {
            self.name.clone()
        } else {
            format!("{} {}", self.name, self.flag)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Loading {
        generation: Generation,
    },
    Loaded(SearchOutcome),
    Failed(SearchError),
}

impl SearchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Loading { .. })
    }

    pub fn outcome(&self) -> Option<&SearchOutcome> {
        match self {
            SearchState::Loaded(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&SearchError> {
        match self {
            SearchState::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Started(Generation),
    Completed(Generation, Result<SearchOutcome, SearchError>),
}

/// Pure transition. `latest` is the newest generation issued so far.
///
/// Starting clears any previous error. A completion is committed only when
/// it belongs to `latest`; anything else leaves the state untouched.
pub fn transition(state: SearchState, latest: Generation, event: SearchEvent) -> SearchState {
    match event {
        SearchEvent::Started(generation) => SearchState::Loading { generation },
        SearchEvent::Completed(generation, _) if generation != latest => state,
        SearchEvent::Completed(_, Ok(outcome)) => SearchState::Loaded(outcome),
        SearchEvent::Completed(_, Err(err)) => SearchState::Failed(err),
    }
}

/// Runs the geocoding call, then the forecast call for the first match.
#[derive(Debug, Clone)]
pub struct SearchResolver {
    geocoder: Arc<dyn GeocodingProvider>,
    forecaster: Arc<dyn ForecastProvider>,
}

impl SearchResolver {
    pub fn new(geocoder: Arc<dyn GeocodingProvider>, forecaster: Arc<dyn ForecastProvider>) -> Self {
        Self { geocoder, forecaster }
    }

    /// The query is forwarded as-is; there is no retry.
    pub async fn resolve(&self, query: &str) -> Result<SearchOutcome, SearchError> {
        let place = self
            .geocoder
            .search(query)
            .await
            .map_err(|e| SearchError::Request(format!("{e:#}")))?
            .into_iter()
            .next()
            .ok_or(SearchError::LocationNotFound)?;

        tracing::debug!(query, name = %place.name, "geocoded location");

        let forecast = self
            .forecaster
            .forecast(&place)
            .await
            .map_err(|e| SearchError::Request(format!("{e:#}")))?;

        let (Some(daily), Some(hourly)) = (forecast.daily, forecast.hourly) else {
            return Err(SearchError::WeatherUnavailable);
        };

        if !daily.is_aligned() || !hourly.is_aligned() {
            tracing::warn!(query, "forecast series have mismatched lengths");
            return Err(SearchError::WeatherUnavailable);
        }

        let flag = place.country_code.as_deref().map(flag_from_country_code).unwrap_or_default();

        Ok(SearchOutcome { query: query.to_string(), name: place.name, flag, daily, hourly })
    }
}

/// Observable search state plus generation bookkeeping.
#[derive(Debug)]
pub struct SearchFlow {
    resolver: SearchResolver,
    preferences: PreferenceStore,
    state: SearchState,
    latest: Generation,
}

impl SearchFlow {
    pub fn new(resolver: SearchResolver, preferences: PreferenceStore) -> Self {
        Self { resolver, preferences, state: SearchState::Idle, latest: Generation::default() }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    /// Issue a new generation and enter `Loading`.
    pub fn begin(&mut self) -> Generation {
        self.latest = self.latest.next();
        self.apply(SearchEvent::Started(self.latest));
        self.latest
    }

    /// Offer a finished attempt. Returns whether it was committed.
    ///
    /// A committed success also remembers its query for the next start.
    pub fn complete(
        &mut self,
        generation: Generation,
        result: Result<SearchOutcome, SearchError>,
    ) -> bool {
        if generation != self.latest {
            tracing::warn!(
                ?generation,
                latest = ?self.latest,
                "dropping stale search completion"
            );
            return false;
        }

        if let Ok(outcome) = &result {
            if let Err(e) = self.preferences.remember(&outcome.query, Utc::now()) {
                tracing::warn!("failed to persist location preference: {e:#}");
            }
            tracing::info!(location = %outcome.name, days = outcome.daily.len(), "search resolved");
        }

        self.apply(SearchEvent::Completed(generation, result));
        true
    }

    /// Begin, resolve and complete one attempt.
    pub async fn search(&mut self, query: &str) -> &SearchState {
        self.search_observed(query, |_| {}).await
    }

    /// Like [`search`](Self::search), calling `observe` with the `Loading`
    /// state before the request and with the final state after it.
    pub async fn search_observed<F>(&mut self, query: &str, mut observe: F) -> &SearchState
    where
        F: FnMut(&SearchState),
    {
        let generation = self.begin();
        observe(&self.state);

        let result = self.resolver.resolve(query).await;
        self.complete(generation, result);
        observe(&self.state);

        &self.state
    }

    fn apply(&mut self, event: SearchEvent) {
        let state = std::mem::take(&mut self.state);
        self.state = transition(state, self.latest, event);
    }
}
