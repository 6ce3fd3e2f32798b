use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// The merged, UI-ready state for the tracked city.
///
/// Two feeds contribute to it: the current observation owns
/// `location_name`, `description`, `weather_code`, `wind_speed`,
/// `temperature`, `humid` and `observation_time`; the 36-hour forecast owns
/// `rain_possibility` and `comfortability`. The subsets are disjoint, so a
/// completion never overwrites the other feed's fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherViewModel {
    pub location_name: String,
    pub description: String,
    pub wind_speed: f64,
    pub temperature: f64,
    /// Relative humidity as a 0..1 fraction, as reported by the feed.
    pub humid: f64,
    /// Probability of precipitation in percent.
    pub rain_possibility: f64,
    pub comfortability: String,
    pub weather_code: i32,
    pub observation_time: Option<DateTime<FixedOffset>>,
    /// True from the moment a city is tracked until both feeds have
    /// completed at least once, success or failure.
    pub is_loading: bool,
}

/// The current-observation feed's contribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentObservation {
    pub location_name: String,
    pub description: String,
    pub weather_code: i32,
    pub wind_speed: f64,
    pub temperature: f64,
    pub humid: f64,
    pub observation_time: DateTime<FixedOffset>,
}

/// The forecast feed's contribution, with the validity window it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityForecast {
    pub rain_possibility: f64,
    pub comfortability: String,
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
}

impl WeatherViewModel {
    /// Merge the observation feed's fields, leaving the forecast's untouched.
    pub fn apply_observation(&mut self, observation: CurrentObservation) {
        self.location_name = observation.location_name;
        self.description = observation.description;
        self.weather_code = observation.weather_code;
        self.wind_speed = observation.wind_speed;
        self.temperature = observation.temperature;
        self.humid = observation.humid;
        self.observation_time = Some(observation.observation_time);
    }

    /// Merge the forecast feed's fields, leaving the observation's untouched.
    /// The validity window is informational and not carried into the view.
    pub fn apply_forecast(&mut self, forecast: CityForecast) {
        self.rain_possibility = forecast.rain_possibility;
        self.comfortability = forecast.comfortability;
    }
}
