use std::sync::Arc;

use anyhow::{Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use inquire::{Select, Text};

use skydash_core::{
    AVAILABLE_LOCATIONS, Config, CwaClient, Dashboard, FileSelectionStore, Moment, SelectionStore,
    WeatherViewModel, find_location,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skydash", version, about = "Day/night-aware weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the dashboard for a city (defaults to the saved one).
    Show {
        /// Canonical city name, e.g. "臺北市"; a unique fragment also works.
        city: Option<String>,

        /// Print the raw view-model as JSON instead of the dashboard.
        #[arg(long)]
        json: bool,

        /// Re-issue both feed calls once more before rendering.
        #[arg(long)]
        refresh: bool,
    },

    /// Remember a city as the default for future runs.
    SetCity {
        /// Canonical city name or a unique fragment of one.
        city: String,
    },

    /// List the cities the dashboard knows about.
    Locations,

    /// Configure the CWA open-data authorization key and default city.
    Configure,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Show {
                city,
                json,
                refresh,
            } => show(city, json, refresh).await,
            Command::SetCity { city } => set_city(&city),
            Command::Locations => {
                for location in AVAILABLE_LOCATIONS {
                    println!("{}", location.city_name);
                }
                Ok(())
            }
            Command::Configure => configure(),
        }
    }
}

async fn show(city: Option<String>, json: bool, refresh: bool) -> Result<()> {
    let config = Config::load()?;
    let api_key = config.api_key()?.to_string();

    let cwa = CwaClient::new(api_key);
    let store = FileSelectionStore::new()?;
    let mut dashboard = Dashboard::new(Arc::new(cwa.clone()), Arc::new(cwa), Box::new(store));

    let city = city.unwrap_or_else(|| dashboard.stored_city());
    let Some(tasks) = dashboard.set_city(&city) else {
        bail!("Unknown city '{city}'. Run `skydash locations` to list the known ones.");
    };
    tasks.finished().await;

    if refresh {
        if let Some(tasks) = dashboard.refetch() {
            tasks.finished().await;
        }
    }

    let view = dashboard.view();
    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    render(&dashboard, &view);
    Ok(())
}

fn render(dashboard: &Dashboard, view: &WeatherViewModel) {
    let (glyph, mood) = match dashboard.moment(Utc::now()) {
        Some(Moment::Day) => ('\u{2600}', "day"),
        Some(Moment::Night) => ('\u{263e}', "night"),
        None => ('\u{2601}', "unknown"),
    };

    println!("{glyph} {} · {mood}", dashboard.city_name());
    if !view.description.is_empty() || !view.comfortability.is_empty() {
        println!("{} {}", view.description, view.comfortability);
    }
    println!("  Temperature  {:>5.1} °C", view.temperature);
    println!("  Humidity     {:>5.0} %", view.humid * 100.0);
    println!("  Wind         {:>5.1} m/s", view.wind_speed);
    println!("  Rain chance  {:>5.0} %", view.rain_possibility);
    if let Some(observed) = view.observation_time {
        println!("  Observed at  {}", observed.format("%Y-%m-%d %H:%M"));
    }

    if let Some(error) = dashboard.last_error() {
        eprintln!("warning: some data could not be refreshed: {error}");
    }
}

fn set_city(city: &str) -> Result<()> {
    let Some(location) = find_location(city) else {
        bail!("Unknown city '{city}'. Run `skydash locations` to list the known ones.");
    };

    let store = FileSelectionStore::new()?;
    store.store(location.city_name)?;

    println!("Tracking {}", location.city_name);
    Ok(())
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_key = Text::new("CWA open-data authorization key:").prompt()?;

    let cities: Vec<&str> = AVAILABLE_LOCATIONS
        .iter()
        .map(|location| location.city_name)
        .collect();
    let city = Select::new("Default city:", cities).prompt()?;

    config.api_key = Some(api_key.trim().to_string());
    config.city_name = Some(city.to_string());
    config.save()?;

    println!("Saved to {}", Config::config_file_path()?.display());
    Ok(())
}
