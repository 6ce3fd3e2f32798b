//! Core library for the `skydash` weather dashboard.
//!
//! This crate defines:
//! - The canonical city table and free-text resolver
//! - Day/night classification from a bundled sunrise/sunset dataset
//! - The weather data client merging two CWA feeds into one view-model
//! - Configuration & persisted city selection
//!
//! It is used by `skydash-cli`, but can also be reused by other frontends.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod location;
pub mod model;
pub mod moment;
pub mod provider;

pub use client::{FetchTasks, WeatherClient};
pub use config::{Config, DEFAULT_CITY, FileSelectionStore, MemorySelectionStore, SelectionStore};
pub use dashboard::Dashboard;
pub use location::{AVAILABLE_LOCATIONS, LocationRecord, find_location};
pub use model::{CityForecast, CurrentObservation, WeatherViewModel};
pub use moment::{Moment, MomentCache, SunTable};
pub use provider::{FetchError, ForecastApi, ObservationApi, cwa::CwaClient};
