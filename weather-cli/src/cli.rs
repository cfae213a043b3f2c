use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use inquire::{CustomType, Password, Select};
use weather_core::{
    Config, Coordinates, CurrentLocationResolver, CurrentLocationState, FileStore,
    GeolocationSource, Geolocator, HourlyCarousel, MemoryStore, PreferenceStore, ProviderId,
    SearchFlow, SearchOutcome, SearchResolver, SearchState, SnapshotCache, Store, TemperatureUnit,
    provider::{
        FixedGeolocator, conditions_provider_from_config, geolocator_from_config,
        open_meteo_from_config,
    },
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather dashboard")]
pub struct Cli {
    /// Log flow details to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct UnitArgs {
    /// Show temperatures in Fahrenheit.
    #[arg(long, conflicts_with = "celsius")]
    fahrenheit: bool,

    /// Show temperatures in Celsius.
    #[arg(long)]
    celsius: bool,
}

impl UnitArgs {
    fn unit(&self, config: &Config) -> TemperatureUnit {
        if self.fahrenheit {
            TemperatureUnit::Fahrenheit
        } else if self.celsius {
            TemperatureUnit::Celsius
        } else {
            config.units
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials and settings for a provider.
    Configure {
        /// Provider short name: "openweather" or "openmeteo".
        provider: String,
    },

    /// Daily and hourly forecast for a place name.
    Search {
        /// Place name; defaults to the last successful search.
        query: Option<String>,

        #[command(flatten)]
        units: UnitArgs,

        /// Step through hourly entries interactively.
        #[arg(long)]
        browse: bool,

        /// Hourly entries to print.
        #[arg(long, default_value_t = 6)]
        hours: usize,
    },

    /// Current conditions where you are, falling back to the last snapshot.
    Here {
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        #[command(flatten)]
        units: UnitArgs,

        /// Offer a Celsius/Fahrenheit switch after rendering.
        #[arg(long)]
        interactive: bool,
    },

    /// Search and current location side by side.
    Dashboard {
        query: Option<String>,

        #[command(flatten)]
        units: UnitArgs,

        #[arg(long, default_value_t = 6)]
        hours: usize,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Search { query, units, browse, hours } => {
                let app = App::load()?;
                let unit = units.unit(&app.config);
                let query = app.initial_query(query);

                let mut flow = app.search_flow()?;
                let state = flow.search_observed(&query, announce_search).await;
                println!("{}", render::search(state, unit, if browse { 0 } else { hours }));

                if browse {
                    if let Some(outcome) = state.outcome() {
                        browse_hours(outcome, unit)?;
                    }
                }
                Ok(())
            }
            Command::Here { lat, lon, units, interactive } => {
                let app = App::load()?;
                let unit = units.unit(&app.config);
                let fixed = lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon));

                let mut resolver = app.current_location(fixed)?;
                let state = resolver.run_observed(announce_location).await;
                println!("{}", render::current_location(state, unit, Utc::now()));

                if interactive && state.resolved().is_some() {
                    toggle_units(state, unit)?;
                }
                Ok(())
            }
            Command::Dashboard { query, units, hours } => {
                let app = App::load()?;
                let unit = units.unit(&app.config);
                let query = app.initial_query(query);

                let mut flow = app.search_flow()?;
                let mut resolver = app.current_location(None)?;

                // Independent flows; neither waits on the other.
                let (search, here) = tokio::join!(
                    flow.search_observed(&query, announce_search),
                    resolver.run_observed(announce_location),
                );

                println!("{}", render::current_location(here, unit, Utc::now()));
                println!();
                println!("{}", render::search(search, unit, hours));
                Ok(())
            }
        }
    }
}

/// Config and persistence shared by the commands.
struct App {
    config: Config,
    store: Arc<dyn Store>,
}

impl App {
    fn load() -> anyhow::Result<Self> {
        let config = Config::load()?;

        let store: Arc<dyn Store> = match FileStore::from_project_dirs() {
            Ok(store) => Arc::new(store),
            Err(e) => {
                tracing::warn!("no data directory, nothing will persist: {e:#}");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self { config, store })
    }

    /// Explicit query, else the remembered one, else the configured default.
    fn initial_query(&self, query: Option<String>) -> String {
        if let Some(q) = query {
            return q;
        }

        match PreferenceStore::new(self.store.clone()).recall(Utc::now()) {
            Ok(Some(remembered)) => {
                tracing::debug!(location = %remembered, "repeating last search");
                remembered
            }
            Ok(None) => self.config.initial_location().to_string(),
            Err(e) => {
                tracing::warn!("ignoring unreadable location preference: {e:#}");
                self.config.initial_location().to_string()
            }
        }
    }

    fn search_flow(&self) -> anyhow::Result<SearchFlow> {
        let open_meteo = Arc::new(open_meteo_from_config(&self.config)?);
        Ok(SearchFlow::new(
            SearchResolver::new(open_meteo.clone(), open_meteo),
            PreferenceStore::new(self.store.clone()),
        ))
    }

    fn current_location(
        &self,
        fixed: Option<Coordinates>,
    ) -> anyhow::Result<CurrentLocationResolver> {
        let geolocator: Arc<dyn Geolocator> = match fixed {
            Some(at) => Arc::new(FixedGeolocator(at)),
            None => Arc::from(geolocator_from_config(&self.config)?),
        };
        let conditions = Arc::new(conditions_provider_from_config(&self.config)?);

        Ok(CurrentLocationResolver::new(
            geolocator,
            conditions,
            SnapshotCache::new(self.store.clone()),
        ))
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    match id {
        ProviderId::OpenMeteo => {
            println!("Open-Meteo does not require an API key.");
        }
        ProviderId::OpenWeather => {
            let key = Password::new("OpenWeather API key:")
                .without_confirmation()
                .prompt()
                .context("Failed to read API key")?;
            config.upsert_provider_api_key(id, key.trim().to_string());

            configure_geolocation(&mut config)?;
        }
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn configure_geolocation(config: &mut Config) -> anyhow::Result<()> {
    let choice = Select::new(
        "Where should `weather here` get your position?",
        vec!["ip", "fixed", "none"],
    )
    .prompt()
    .context("Failed to read geolocation source")?;

    config.geolocation.source = match choice {
        "fixed" => {
            let lat = CustomType::<f64>::new("Latitude:").prompt()?;
            let lon = CustomType::<f64>::new("Longitude:").prompt()?;
            config.geolocation.latitude = Some(lat);
            config.geolocation.longitude = Some(lon);
            GeolocationSource::Fixed
        }
        "none" => GeolocationSource::None,
        _ => GeolocationSource::Ip,
    };
    Ok(())
}

/// Loading indicators go to stderr; stdout only carries results.
fn announce_search(state: &SearchState) {
    if state.is_loading() {
        eprintln!("{}", render::search(state, TemperatureUnit::default(), 0));
    }
}

fn announce_location(state: &CurrentLocationState) {
    if matches!(state, CurrentLocationState::Locating) {
        eprintln!("{}", render::current_location(state, TemperatureUnit::default(), Utc::now()));
    }
}

fn browse_hours(outcome: &SearchOutcome, unit: TemperatureUnit) -> anyhow::Result<()> {
    let mut carousel = HourlyCarousel::new(&outcome.hourly);

    loop {
        let Some(current) = carousel.current() else {
            println!("No hourly data.");
            return Ok(());
        };
        println!(
            "[{}/{}] {}",
            carousel.position() + 1,
            carousel.len(),
            render::slide(current, unit)
        );

        match Select::new("Hourly", vec!["Next", "Previous", "Quit"]).prompt()? {
            "Next" => {
                carousel.next();
            }
            "Previous" => {
                carousel.previous();
            }
            _ => return Ok(()),
        }
    }
}

fn toggle_units(state: &CurrentLocationState, mut unit: TemperatureUnit) -> anyhow::Result<()> {
    loop {
        let switch = format!("Switch to {}", unit.toggled().label());
        match Select::new("Units", vec![switch.as_str(), "Quit"]).prompt()? {
            "Quit" => return Ok(()),
            _ => {
                unit = unit.toggled();
                println!("{}", render::current_location(state, unit, Utc::now()));
            }
        }
    }
}
