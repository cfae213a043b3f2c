//! Core library for the `weather` dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Providers for geocoding, forecasts, current conditions and geolocation
//! - The search flow and the current-location flow with snapshot fallback
//! - Single-slot persistence and presentation helpers
//!
//! It is used by `weather-cli`, but the flows carry no rendering and can be
//! driven by any front end.

pub mod cache;
pub mod carousel;
pub mod config;
pub mod error;
pub mod format;
pub mod location;
pub mod model;
pub mod preference;
pub mod provider;
pub mod search;
pub mod store;

pub use cache::SnapshotCache;
pub use carousel::HourlyCarousel;
pub use config::{Config, GeolocationConfig, GeolocationSource, ProviderConfig};
pub use error::{FetchError, GeoError, SearchError, TerminalError};
pub use location::{CurrentLocationResolver, CurrentLocationState};
pub use model::{
    CachedSnapshot, Coordinates, CurrentConditions, DailyForecast, GeocodeResult, HourlyForecast,
    TemperatureUnit,
};
pub use preference::PreferenceStore;
pub use provider::{ConditionsProvider, ForecastProvider, GeocodingProvider, Geolocator, ProviderId};
pub use search::{SearchFlow, SearchOutcome, SearchResolver, SearchState};
pub use store::{FileStore, MemoryStore, Store};
