use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, Password, Select};
use std::{fmt, sync::Arc};
use weather_core::{
    Config, FileStore, IpGeolocator, LocationStore, OpenWeatherClient, SavedLocation, Units,
    ViewState, WeatherOrchestrator, WeatherReport, WeatherView,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key, units and device-location permission.
    Configure,

    /// Show current weather and a 5-day forecast.
    Show(ShowArgs),

    /// Manage saved locations.
    #[command(subcommand)]
    Locations(LocationsCommand),
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Latitude; requires --lon.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude; requires --lat.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Name of a saved location.
    #[arg(long, short, conflicts_with_all = ["lat", "lon"])]
    pub location: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum LocationsCommand {
    /// List saved locations.
    List,

    /// Search for places by city name.
    Search { query: String },

    /// Search for a place and save it.
    Add {
        query: String,

        /// 1-based index into the search results; prompts when absent.
        #[arg(long)]
        pick: Option<usize>,
    },

    /// Remove a saved location by name.
    Remove { name: String },
}

/// Search hit shown in the interactive picker.
struct Candidate(SavedLocation);

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.4}, {:.4})", self.0.display_name(), self.0.lat, self.0.lon)
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show(args) => show(args).await,
            Command::Locations(cmd) => locations(cmd).await,
        }
    }
}

fn load_config() -> Result<Config> {
    Ok(Config::load()?.with_env_overrides())
}

async fn open_store() -> Result<LocationStore> {
    let dir = Config::data_dir()?;
    Ok(LocationStore::initialize(Arc::new(FileStore::in_dir(&dir))).await)
}

fn configure() -> Result<()> {
    let mut cfg = Config::load()?;

    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    if api_key.trim().is_empty() {
        bail!("API key must not be empty");
    }
    cfg.set_api_key(api_key);

    cfg.units = Select::new("Units:", vec![Units::Metric, Units::Imperial, Units::Standard])
        .prompt()
        .context("Failed to read units")?;

    cfg.allow_location = Confirm::new("Allow looking up your location when none is given?")
        .with_default(cfg.allow_location)
        .prompt()
        .context("Failed to read location permission")?;

    cfg.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn show(args: ShowArgs) -> Result<()> {
    let cfg = load_config()?;

    let (lat, lon) = match args.location {
        Some(name) => {
            let store = open_store().await?;
            let saved = store.list().await;
            let found = find_saved(&saved, &name)
                .into_iter()
                .next()
                .ok_or_else(|| anyhow!("No saved location named '{name}'"))?;
            (Some(found.lat), Some(found.lon))
        }
        None => (args.lat, args.lon),
    };

    let api = OpenWeatherClient::from_config(&cfg);
    let geo = IpGeolocator::new(cfg.ip_locator_url.clone(), cfg.allow_location);
    let view = WeatherView::new(WeatherOrchestrator::new(Arc::new(api), Arc::new(geo)));

    match view.load(lat, lon).await {
        ViewState::Ready { report, notice } => {
            print!("{}", render_report(&report, cfg.units));
            if let Some(notice) = notice {
                eprintln!("{notice}");
            }
            Ok(())
        }
        ViewState::Error(msg) => Err(anyhow!(msg)),
        ViewState::Loading => Err(anyhow!("Weather is still loading")),
    }
}

async fn locations(cmd: LocationsCommand) -> Result<()> {
    match cmd {
        LocationsCommand::List => {
            let store = open_store().await?;
            print!("{}", render_saved(&store.list().await));
        }
        LocationsCommand::Search { query } => {
            let cfg = load_config()?;
            let results = search(&cfg, &query).await?;
            for (i, hit) in results.iter().enumerate() {
                println!("{:>2}. {}", i + 1, Candidate(hit.clone()));
            }
        }
        LocationsCommand::Add { query, pick } => {
            let cfg = load_config()?;
            let results = search(&cfg, &query).await?;
            if results.is_empty() {
                return Ok(());
            }

            let chosen = match pick {
                Some(n) => results
                    .get(n.wrapping_sub(1))
                    .cloned()
                    .ok_or_else(|| anyhow!("--pick must be between 1 and {}", results.len()))?,
                None => {
                    let options = results.into_iter().map(Candidate).collect();
                    Select::new("Add which location?", options)
                        .prompt()
                        .context("No location selected")?
                        .0
                }
            };

            let store = open_store().await?;
            let label = chosen.display_name();
            let before = store.list().await.len();
            store.add(chosen).await;
            if store.list().await.len() == before {
                println!("{label} is already saved.");
            } else {
                println!("Saved {label}.");
            }
        }
        LocationsCommand::Remove { name } => {
            let store = open_store().await?;
            let saved = store.list().await;
            let mut matches = find_saved(&saved, &name);

            let target = match matches.len() {
                0 => bail!("No saved location named '{name}'"),
                1 => matches.remove(0).clone(),
                _ => {
                    let options = matches.into_iter().cloned().map(Candidate).collect();
                    Select::new("Remove which location?", options)
                        .prompt()
                        .context("No location selected")?
                        .0
                }
            };

            store.remove(&target).await;
            println!("Removed {}.", target.display_name());
        }
    }

    Ok(())
}

async fn search(cfg: &Config, query: &str) -> Result<Vec<SavedLocation>> {
    let client = OpenWeatherClient::from_config(cfg);
    let results = client.search(query).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch locations");
        anyhow!(e.user_message())
    })?;

    if results.is_empty() {
        if query.trim().chars().count() < weather_core::provider::openweather::MIN_QUERY_LEN {
            println!("Type at least 3 characters to search.");
        } else {
            println!("No locations found for your query.");
        }
    }
    Ok(results)
}

/// Saved entries whose name or full label matches, case-insensitively.
fn find_saved<'a>(saved: &'a [SavedLocation], name: &str) -> Vec<&'a SavedLocation> {
    let needle = name.trim().to_lowercase();
    saved
        .iter()
        .filter(|l| {
            l.name.to_lowercase() == needle || l.display_name().to_lowercase() == needle
        })
        .collect()
}

fn render_saved(saved: &[SavedLocation]) -> String {
    if saved.is_empty() {
        return "You have no saved locations.\n".to_string();
    }
    saved
        .iter()
        .map(|l| format!("{}, {}\n", l.name, l.country))
        .collect()
}

fn render_report(report: &WeatherReport, units: Units) -> String {
    let suffix = units.temperature_suffix();
    let snap = &report.snapshot;

    let mut out = format!(
        "{}\n{} ({}) [{}]\n{}{suffix}, feels like {}{suffix}\nHumidity {}%, wind {:.1}\n",
        snap.location_name,
        snap.condition,
        snap.description,
        snap.condition.icon_name(),
        snap.temperature.round(),
        snap.feels_like.round(),
        snap.humidity_pct,
        snap.wind_speed,
    );

    if !report.forecast.is_empty() {
        out.push_str("\nForecast:\n");
        for day in &report.forecast {
            out.push_str(&format!(
                "  {}  {:>4}{suffix}  {}\n",
                day.timestamp.format("%a %d %b"),
                day.temperature.round(),
                day.condition,
            ));
        }
    }

    out
}
