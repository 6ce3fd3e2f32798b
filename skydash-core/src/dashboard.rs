//! The surface the presentation layer consumes.
//!
//! A [`Dashboard`] bundles the resolver, the weather data client, the
//! sunrise dataset and the persisted city selection behind one small API:
//! feed it a city query, read back the view-model, the resolved location
//! and the day/night moment.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::client::{FetchTasks, WeatherClient};
use crate::config::{DEFAULT_CITY, SelectionStore};
use crate::location::{LocationRecord, find_location};
use crate::model::WeatherViewModel;
use crate::moment::{Moment, MomentCache, SunTable};
use crate::provider::{ForecastApi, ObservationApi};

#[derive(Debug)]
pub struct Dashboard {
    client: WeatherClient,
    store: Box<dyn SelectionStore>,
    sun_table: &'static SunTable,
    moment_cache: Mutex<MomentCache>,
    city_name: String,
}

impl Dashboard {
    pub fn new(
        observation_api: Arc<dyn ObservationApi>,
        forecast_api: Arc<dyn ForecastApi>,
        store: Box<dyn SelectionStore>,
    ) -> Self {
        Self {
            client: WeatherClient::new(observation_api, forecast_api),
            store,
            sun_table: SunTable::bundled(),
            moment_cache: Mutex::new(MomentCache::default()),
            city_name: String::new(),
        }
    }

    /// The city to show at startup: the persisted one, or the default.
    pub fn stored_city(&self) -> String {
        self.store
            .load()
            .unwrap_or_else(|| DEFAULT_CITY.to_string())
    }

    /// Switch the tracked city.
    ///
    /// On a resolver hit the selection is persisted, the day/night cache is
    /// invalidated and both feeds are dispatched; the returned tasks can be
    /// awaited or dropped. On a miss the dashboard falls back to an empty
    /// location and an empty, non-loading view-model, and returns `None`.
    pub fn set_city(&mut self, query: &str) -> Option<FetchTasks> {
        match find_location(query) {
            Some(location) => {
                self.city_name = location.city_name.to_string();
                if let Err(error) = self.store.store(location.city_name) {
                    tracing::warn!(%error, "failed to persist selected city");
                }
                self.moment_cache.lock().invalidate();
                Some(self.client.set_location(*location))
            }
            None => {
                tracing::info!(query, "no location matches the query");
                self.moment_cache.lock().invalidate();
                self.client.clear_location();
                None
            }
        }
    }

    /// Re-issue both feed calls for the current city.
    pub fn refetch(&self) -> Option<FetchTasks> {
        self.client.refetch()
    }

    pub fn view(&self) -> WeatherViewModel {
        self.client.view()
    }

    pub fn is_loading(&self) -> bool {
        self.client.is_loading()
    }

    pub fn resolved_location(&self) -> Option<LocationRecord> {
        self.client.location()
    }

    /// The canonical name of the tracked city; empty until a query resolves.
    pub fn city_name(&self) -> &str {
        &self.city_name
    }

    /// Day/night classification for the tracked city at `at`, memoized on
    /// the city's sunrise key so unrelated churn does not recompute it.
    pub fn moment(&self, at: DateTime<Utc>) -> Option<Moment> {
        let key = self
            .resolved_location()
            .map(|location| location.sunrise_city_name)
            .unwrap_or("");
        self.moment_cache.lock().moment(self.sun_table, key, at)
    }

    pub fn error_count(&self) -> u64 {
        self.client.error_count()
    }

    pub fn last_error(&self) -> Option<String> {
        self.client.last_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;

    use crate::config::MemorySelectionStore;
    use crate::model::{CityForecast, CurrentObservation};
    use crate::moment::taiwan_offset;
    use crate::provider::FetchError;

    #[derive(Debug)]
    struct StaticObservation(CurrentObservation);

    #[async_trait]
    impl ObservationApi for StaticObservation {
        async fn current_observation(
            &self,
            _location_name: &str,
        ) -> Result<CurrentObservation, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Debug)]
    struct StaticForecast(CityForecast);

    #[async_trait]
    impl ForecastApi for StaticForecast {
        async fn city_forecast(&self, _station_id: &str) -> Result<CityForecast, FetchError> {
            Ok(self.0.clone())
        }
    }

    fn dashboard() -> Dashboard {
        let observed = taiwan_offset()
            .with_ymd_and_hms(2026, 6, 21, 12, 0, 0)
            .unwrap();
        let observation = CurrentObservation {
            location_name: "臺北".to_string(),
            description: "晴".to_string(),
            weather_code: 1,
            wind_speed: 2.2,
            temperature: 31.0,
            humid: 0.6,
            observation_time: observed,
        };
        let forecast = CityForecast {
            rain_possibility: 10.0,
            comfortability: "舒適".to_string(),
            start_time: observed,
            end_time: observed,
        };

        Dashboard::new(
            Arc::new(StaticObservation(observation)),
            Arc::new(StaticForecast(forecast)),
            Box::new(MemorySelectionStore::default()),
        )
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        taiwan_offset()
            .with_ymd_and_hms(2026, 6, 21, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn resolving_a_city_tracks_and_persists_it() {
        let mut dashboard = dashboard();

        let tasks = dashboard.set_city("臺北").expect("resolves");
        tasks.finished().await;

        assert_eq!(dashboard.city_name(), "臺北市");
        assert_eq!(dashboard.stored_city(), "臺北市");
        assert_eq!(dashboard.view().location_name, "臺北");
        assert!(!dashboard.is_loading());
    }

    #[tokio::test]
    async fn unknown_city_falls_back_to_an_empty_view() {
        let mut dashboard = dashboard();

        assert!(dashboard.set_city("Atlantis").is_none());
        assert!(dashboard.resolved_location().is_none());
        assert_eq!(dashboard.view(), WeatherViewModel::default());
        assert!(!dashboard.is_loading());
        assert!(dashboard.refetch().is_none());
    }

    #[tokio::test]
    async fn stored_city_defaults_when_nothing_is_persisted() {
        let dashboard = dashboard();
        assert_eq!(dashboard.stored_city(), DEFAULT_CITY);
    }

    #[tokio::test]
    async fn moment_follows_the_tracked_city() {
        let mut dashboard = dashboard();
        assert_eq!(dashboard.moment(at(12, 0)), None);

        dashboard.set_city("臺北市");
        assert_eq!(dashboard.moment(at(12, 0)), Some(Moment::Day));

        // Memoized on the sunrise key: the instant alone does not recompute.
        assert_eq!(dashboard.moment(at(3, 0)), Some(Moment::Day));

        // A city change does.
        dashboard.set_city("高雄市");
        assert_eq!(dashboard.moment(at(3, 0)), Some(Moment::Night));
    }
}
