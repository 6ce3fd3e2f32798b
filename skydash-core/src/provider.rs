use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::model::{CityForecast, CurrentObservation};

pub mod cwa;

/// A single feed request gone wrong. Never fatal: the weather data client
/// logs it, counts it and keeps the previous field values.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {endpoint} failed")]
    Network {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse {endpoint} response")]
    Parse {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} response is missing {field}")]
    MissingData {
        endpoint: &'static str,
        field: &'static str,
    },
}

/// The current-observation feed: station identifier in, one reading out.
#[async_trait]
pub trait ObservationApi: Send + Sync + Debug {
    async fn current_observation(
        &self,
        location_name: &str,
    ) -> Result<CurrentObservation, FetchError>;
}

/// The 36-hour forecast feed, keyed independently of the observation feed.
#[async_trait]
pub trait ForecastApi: Send + Sync + Debug {
    async fn city_forecast(&self, station_id: &str) -> Result<CityForecast, FetchError>;
}

/// Error bodies go into messages; keep them short and safe to slice.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let cut: String = body.chars().take(MAX).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}
