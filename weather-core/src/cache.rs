//! Current-conditions snapshot: written after each live fetch, read on fallback.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::{
    model::{CachedSnapshot, CurrentConditions},
    store::Store,
};

pub const CURRENT_WEATHER_KEY: &str = "currentWeather";

/// Snapshots at or beyond this age are rejected.
pub const SNAPSHOT_MAX_AGE_MS: i64 = 6 * 60 * 60 * 1000;

/// An age that does not fit in `i64` counts as stale.
pub fn is_fresh(captured_at_ms: i64, now_ms: i64) -> bool {
    now_ms.checked_sub(captured_at_ms).is_some_and(|age| age < SNAPSHOT_MAX_AGE_MS)
}

#[derive(Debug, Clone)]
pub struct SnapshotCache {
    store: Arc<dyn Store>,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn capture(conditions: &CurrentConditions, now_ms: i64) -> CachedSnapshot {
        CachedSnapshot { location: conditions.clone(), timestamp: now_ms }
    }

    /// Overwrite the single snapshot slot.
    pub fn write(&self, snapshot: &CachedSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot).context("Failed to serialize snapshot")?;
        self.store.set(CURRENT_WEATHER_KEY, &json)
    }

    pub fn read(&self) -> Result<Option<CachedSnapshot>> {
        let Some(json) = self.store.get(CURRENT_WEATHER_KEY)? else {
            return Ok(None);
        };

        let snapshot = serde_json::from_str(&json).context("Failed to parse cached snapshot")?;
        Ok(Some(snapshot))
    }
}
