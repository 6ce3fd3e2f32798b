//! The weather data client.
//!
//! Keeps one [`WeatherViewModel`] synchronized with the latest data for a
//! single tracked location. The observation and forecast feeds are fetched
//! concurrently and complete independently; each merges only its own field
//! subset. Every dispatch is tagged with a generation counter, and a
//! completion whose tag no longer matches the current generation is dropped
//! on arrival. That is the whole staleness story, for location changes and
//! overlapping refetches alike.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::location::LocationRecord;
use crate::model::{CityForecast, CurrentObservation, WeatherViewModel};
use crate::provider::{FetchError, ForecastApi, ObservationApi};

#[derive(Debug)]
pub struct WeatherClient {
    observation_api: Arc<dyn ObservationApi>,
    forecast_api: Arc<dyn ForecastApi>,
    state: Arc<Mutex<ClientState>>,
}

#[derive(Debug, Default)]
struct ClientState {
    view: WeatherViewModel,
    location: Option<LocationRecord>,
    generation: u64,
    observation_pending: bool,
    forecast_pending: bool,
    error_count: u64,
    last_error: Option<String>,
}

impl ClientState {
    fn sync_loading(&mut self) {
        self.view.is_loading = self.observation_pending || self.forecast_pending;
    }
}

/// The pair of in-flight feed tasks from one dispatch.
///
/// Dropping it detaches the tasks; they still run and their results are
/// still merged or discarded by generation. Await [`FetchTasks::finished`]
/// to know both feeds have completed.
pub struct FetchTasks {
    observation: JoinHandle<()>,
    forecast: JoinHandle<()>,
}

impl FetchTasks {
    pub async fn finished(self) {
        let _ = self.observation.await;
        let _ = self.forecast.await;
    }
}

impl WeatherClient {
    pub fn new(
        observation_api: Arc<dyn ObservationApi>,
        forecast_api: Arc<dyn ForecastApi>,
    ) -> Self {
        Self {
            observation_api,
            forecast_api,
            state: Arc::new(Mutex::new(ClientState::default())),
        }
    }

    /// Track a new location: the previous view-model is discarded, both
    /// feeds are marked loading before the requests go out, and any still
    /// in-flight responses for the old location are invalidated.
    pub fn set_location(&self, location: LocationRecord) -> FetchTasks {
        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.location = Some(location);
            state.view = WeatherViewModel::default();
            state.observation_pending = true;
            state.forecast_pending = true;
            state.sync_loading();
            state.generation
        };

        tracing::info!(city = location.city_name, "tracking location");
        self.spawn_fetches(location, generation)
    }

    /// Drop the tracked location, e.g. when a query resolved to nothing.
    /// The view-model returns to its defaults and is not loading.
    pub fn clear_location(&self) {
        let mut state = self.state.lock();
        state.generation += 1;
        state.location = None;
        state.view = WeatherViewModel::default();
        state.observation_pending = false;
        state.forecast_pending = false;
        state.sync_loading();
    }

    /// Re-issue both feed calls for the current location. Safe while a
    /// previous pair is still in flight: the newer pair wins, the older
    /// pair's late results are discarded. `None` when no location is set.
    pub fn refetch(&self) -> Option<FetchTasks> {
        let (location, generation) = {
            let mut state = self.state.lock();
            let Some(location) = state.location else {
                tracing::debug!("refetch requested with no tracked location");
                return None;
            };
            state.generation += 1;
            state.observation_pending = true;
            state.forecast_pending = true;
            state.sync_loading();
            (location, state.generation)
        };

        Some(self.spawn_fetches(location, generation))
    }

    fn spawn_fetches(&self, location: LocationRecord, generation: u64) -> FetchTasks {
        let observation = {
            let api = Arc::clone(&self.observation_api);
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let result = api.current_observation(location.location_name).await;
                apply_observation(&state, generation, result);
            })
        };

        let forecast = {
            let api = Arc::clone(&self.forecast_api);
            let state = Arc::clone(&self.state);
            tokio::spawn(async move {
                let result = api.city_forecast(location.station_id).await;
                apply_forecast(&state, generation, result);
            })
        };

        FetchTasks {
            observation,
            forecast,
        }
    }

    /// Snapshot of the current view-model.
    pub fn view(&self) -> WeatherViewModel {
        self.state.lock().view.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().view.is_loading
    }

    pub fn location(&self) -> Option<LocationRecord> {
        self.state.lock().location
    }

    pub fn error_count(&self) -> u64 {
        self.state.lock().error_count
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }
}

fn apply_observation(
    state: &Mutex<ClientState>,
    generation: u64,
    result: Result<CurrentObservation, FetchError>,
) {
    let mut state = state.lock();
    if state.generation != generation {
        tracing::debug!(
            generation,
            current = state.generation,
            "dropping stale observation result"
        );
        return;
    }

    match result {
        Ok(observation) => state.view.apply_observation(observation),
        Err(error) => {
            tracing::warn!(%error, "current observation fetch failed");
            state.error_count += 1;
            state.last_error = Some(error.to_string());
        }
    }

    state.observation_pending = false;
    state.sync_loading();
}

fn apply_forecast(
    state: &Mutex<ClientState>,
    generation: u64,
    result: Result<CityForecast, FetchError>,
) {
    let mut state = state.lock();
    if state.generation != generation {
        tracing::debug!(
            generation,
            current = state.generation,
            "dropping stale forecast result"
        );
        return;
    }

    match result {
        Ok(forecast) => state.view.apply_forecast(forecast),
        Err(error) => {
            tracing::warn!(%error, "city forecast fetch failed");
            state.error_count += 1;
            state.last_error = Some(error.to_string());
        }
    }

    state.forecast_pending = false;
    state.sync_loading();
}
