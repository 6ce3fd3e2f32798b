//! CWA (Central Weather Administration) open-data implementation of the two
//! feed traits. Both datastores share the request shape (authorization key
//! and location name in the query string) but answer with different record
//! layouts, so each endpoint keeps its own response structs.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::model::{CityForecast, CurrentObservation};
use crate::moment::taiwan_offset;
use crate::provider::{FetchError, ForecastApi, ObservationApi, truncate_body};

const DEFAULT_BASE_URL: &str = "https://opendata.cwa.gov.tw/api";
const OBSERVATION_ENDPOINT: &str = "O-A0003-001";
const FORECAST_ENDPOINT: &str = "F-C0032-001";

#[derive(Debug, Clone)]
pub struct CwaClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl CwaClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Same client against a different host; used to point at a test server.
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    async fn get_datastore<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        location_name: &str,
    ) -> Result<T, FetchError> {
        let url = format!("{}/v1/rest/datastore/{}", self.base_url, endpoint);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("Authorization", self.api_key.as_str()),
                ("locationName", location_name),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Network { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| FetchError::Network { endpoint, source })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                endpoint,
                status,
                body: truncate_body(&body),
            });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Parse { endpoint, source })
    }
}

#[derive(Debug, Deserialize)]
struct ObsResponse {
    records: ObsRecords,
}

#[derive(Debug, Deserialize)]
struct ObsRecords {
    location: Vec<ObsLocation>,
}

#[derive(Debug, Deserialize)]
struct ObsLocation {
    #[serde(rename = "locationName")]
    location_name: String,
    time: ObsTime,
    #[serde(rename = "weatherElement")]
    weather_element: Vec<ObsElement>,
}

#[derive(Debug, Deserialize)]
struct ObsTime {
    #[serde(rename = "obsTime")]
    obs_time: String,
}

#[derive(Debug, Deserialize)]
struct ObsElement {
    #[serde(rename = "elementName")]
    element_name: String,
    #[serde(rename = "elementValue")]
    element_value: String,
}

fn element_value<'a>(elements: &'a [ObsElement], name: &str) -> Option<&'a str> {
    elements
        .iter()
        .find(|element| element.element_name == name)
        .map(|element| element.element_value.as_str())
}

fn element_f64(elements: &[ObsElement], name: &str) -> Option<f64> {
    element_value(elements, name)?.trim().parse().ok()
}

/// The feeds report Taiwan wall-clock time without an offset suffix.
fn parse_cwa_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok()?;
    naive.and_local_timezone(taiwan_offset()).single()
}

#[async_trait]
impl ObservationApi for CwaClient {
    async fn current_observation(
        &self,
        location_name: &str,
    ) -> Result<CurrentObservation, FetchError> {
        let endpoint = OBSERVATION_ENDPOINT;
        let parsed: ObsResponse = self.get_datastore(endpoint, location_name).await?;

        let location = parsed.records.location.into_iter().next().ok_or(
            FetchError::MissingData {
                endpoint,
                field: "records.location",
            },
        )?;

        let elements = &location.weather_element;
        let wind_speed = element_f64(elements, "WDSD").ok_or(FetchError::MissingData {
            endpoint,
            field: "WDSD",
        })?;
        let temperature = element_f64(elements, "TEMP").ok_or(FetchError::MissingData {
            endpoint,
            field: "TEMP",
        })?;
        let humid = element_f64(elements, "HUMD").ok_or(FetchError::MissingData {
            endpoint,
            field: "HUMD",
        })?;

        // Stations without a weather observer omit these two.
        let description = element_value(elements, "Weather").unwrap_or_default().to_string();
        let weather_code = element_f64(elements, "WxCode").map(|code| code as i32).unwrap_or(0);

        let observation_time =
            parse_cwa_time(&location.time.obs_time).ok_or(FetchError::MissingData {
                endpoint,
                field: "obsTime",
            })?;

        Ok(CurrentObservation {
            location_name: location.location_name,
            description,
            weather_code,
            wind_speed,
            temperature,
            humid,
            observation_time,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FcResponse {
    records: FcRecords,
}

#[derive(Debug, Deserialize)]
struct FcRecords {
    location: Vec<FcLocation>,
}

#[derive(Debug, Deserialize)]
struct FcLocation {
    #[serde(rename = "weatherElement")]
    weather_element: Vec<FcElement>,
}

#[derive(Debug, Deserialize)]
struct FcElement {
    #[serde(rename = "elementName")]
    element_name: String,
    time: Vec<FcWindow>,
}

#[derive(Debug, Deserialize)]
struct FcWindow {
    #[serde(rename = "startTime")]
    start_time: String,
    #[serde(rename = "endTime")]
    end_time: String,
    parameter: FcParameter,
}

#[derive(Debug, Deserialize)]
struct FcParameter {
    #[serde(rename = "parameterName")]
    parameter_name: String,
}

fn first_window<'a>(location: &'a FcLocation, name: &str) -> Option<&'a FcWindow> {
    location
        .weather_element
        .iter()
        .find(|element| element.element_name == name)?
        .time
        .first()
}

#[async_trait]
impl ForecastApi for CwaClient {
    async fn city_forecast(&self, station_id: &str) -> Result<CityForecast, FetchError> {
        let endpoint = FORECAST_ENDPOINT;
        let parsed: FcResponse = self.get_datastore(endpoint, station_id).await?;

        let location = parsed.records.location.into_iter().next().ok_or(
            FetchError::MissingData {
                endpoint,
                field: "records.location",
            },
        )?;

        let pop = first_window(&location, "PoP").ok_or(FetchError::MissingData {
            endpoint,
            field: "PoP",
        })?;
        let ci = first_window(&location, "CI").ok_or(FetchError::MissingData {
            endpoint,
            field: "CI",
        })?;

        let rain_possibility =
            pop.parameter
                .parameter_name
                .trim()
                .parse()
                .map_err(|_| FetchError::MissingData {
                    endpoint,
                    field: "PoP value",
                })?;
        let start_time = parse_cwa_time(&pop.start_time).ok_or(FetchError::MissingData {
            endpoint,
            field: "startTime",
        })?;
        let end_time = parse_cwa_time(&pop.end_time).ok_or(FetchError::MissingData {
            endpoint,
            field: "endTime",
        })?;

        Ok(CityForecast {
            rain_possibility,
            comfortability: ci.parameter.parameter_name.clone(),
            start_time,
            end_time,
        })
    }
}
