//! Last successful search term, kept for seven days.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::Store;

pub const LOCATION_KEY: &str = "location";

pub fn preference_ttl() -> Duration {
    Duration::days(7)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct StoredPreference {
    location: String,
    /// Epoch milliseconds.
    expires_at: i64,
}

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    store: Arc<dyn Store>,
}

impl PreferenceStore {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn remember(&self, location: &str, now: DateTime<Utc>) -> Result<()> {
        let entry = StoredPreference {
            location: location.to_string(),
            expires_at: (now + preference_ttl()).timestamp_millis(),
        };
        let json = serde_json::to_string(&entry).context("Failed to serialize preference")?;
        self.store.set(LOCATION_KEY, &json)
    }

    /// The remembered location, unless it has expired. An expired entry is
    /// cleared.
    pub fn recall(&self, now: DateTime<Utc>) -> Result<Option<String>> {
        let Some(json) = self.store.get(LOCATION_KEY)? else {
            return Ok(None);
        };

        let entry: StoredPreference =
            serde_json::from_str(&json).context("Failed to parse stored preference")?;

        if now.timestamp_millis() >= entry.expires_at {
            tracing::debug!(location = %entry.location, "stored location preference expired");
            self.store.remove(LOCATION_KEY)?;
            return Ok(None);
        }

        Ok(Some(entry.location))
    }
}
