//! Day/night classification from the bundled sunrise/sunset dataset.
//!
//! The dataset covers one calendar year of per-city sunrise and sunset
//! wall-clock times. Lookup is exact on `(city key, calendar date)`: a date
//! outside the dataset yields no classification rather than the nearest
//! entry, since the table is expected to cover the operating range.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};

const SUNRISE_SUNSET_JSON: &str = include_str!("../data/sunrise-sunset.json");

static BUNDLED: LazyLock<SunTable> = LazyLock::new(|| {
    SunTable::from_json(SUNRISE_SUNSET_JSON).expect("bundled sunrise dataset is valid")
});

/// The dataset's wall-clock times are Taiwan local time.
pub(crate) fn taiwan_offset() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid offset")
}

/// Whether an instant falls inside the sunrise–sunset window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moment {
    Day,
    Night,
}

#[derive(Debug, Deserialize)]
struct SunLocation {
    #[serde(rename = "locationName")]
    location_name: String,
    time: Vec<SunRecord>,
}

#[derive(Debug, Deserialize)]
struct SunRecord {
    #[serde(rename = "dataTime")]
    data_time: NaiveDate,
    #[serde(deserialize_with = "clock_time")]
    sunrise: NaiveTime,
    #[serde(deserialize_with = "clock_time")]
    sunset: NaiveTime,
}

/// The dataset stores times as `HH:MM`; chrono's serde impl wants seconds.
fn clock_time<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(&raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
        .map_err(serde::de::Error::custom)
}

/// Exact-match lookup over per-city, per-date sunrise/sunset windows.
#[derive(Debug, Default)]
pub struct SunTable {
    windows: HashMap<String, HashMap<NaiveDate, (NaiveTime, NaiveTime)>>,
}

impl SunTable {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let locations: Vec<SunLocation> = serde_json::from_str(raw)?;

        let mut windows = HashMap::new();
        for location in locations {
            let days = location
                .time
                .into_iter()
                .map(|record| (record.data_time, (record.sunrise, record.sunset)))
                .collect();
            windows.insert(location.location_name, days);
        }

        Ok(Self { windows })
    }

    /// The dataset shipped with the crate, parsed once per process.
    pub fn bundled() -> &'static SunTable {
        &BUNDLED
    }

    /// Classify `at` as day or night for the given sunrise key.
    ///
    /// Returns `None` when the key is empty or unknown, or when the dataset
    /// has no entry for `at`'s calendar date. The window is inclusive on
    /// both ends: an instant exactly at sunrise or sunset is `Day`.
    pub fn moment_for(&self, sunrise_city_name: &str, at: DateTime<Utc>) -> Option<Moment> {
        if sunrise_city_name.is_empty() {
            return None;
        }
        let days = self.windows.get(sunrise_city_name)?;

        let local = at.with_timezone(&taiwan_offset()).naive_local();
        let (sunrise, sunset) = days.get(&local.date()).copied()?;

        let sunrise = local.date().and_time(sunrise);
        let sunset = local.date().and_time(sunset);

        if sunrise <= local && local <= sunset {
            Some(Moment::Day)
        } else {
            Some(Moment::Night)
        }
    }
}

/// Memoizes the last classification by sunrise key.
///
/// The tracked city changes rarely while the surrounding state churns often,
/// so the classification is recomputed only when the key actually changes.
#[derive(Debug, Default)]
pub struct MomentCache {
    entry: Option<(String, Option<Moment>)>,
}

impl MomentCache {
    pub fn moment(
        &mut self,
        table: &SunTable,
        sunrise_city_name: &str,
        at: DateTime<Utc>,
    ) -> Option<Moment> {
        if let Some((key, value)) = &self.entry {
            if key == sunrise_city_name {
                return *value;
            }
        }

        let value = table.moment_for(sunrise_city_name, at);
        self.entry = Some((sunrise_city_name.to_string(), value));
        value
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FIXTURE: &str = r#"[
        {
            "locationName": "臺北",
            "time": [
                { "dataTime": "2024-06-21", "sunrise": "05:04", "sunset": "18:47" }
            ]
        }
    ]"#;

    fn table() -> SunTable {
        SunTable::from_json(FIXTURE).expect("fixture parses")
    }

    fn taipei(h: u32, m: u32) -> DateTime<Utc> {
        taiwan_offset()
            .with_ymd_and_hms(2024, 6, 21, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn midday_is_day() {
        assert_eq!(table().moment_for("臺北", taipei(12, 0)), Some(Moment::Day));
    }

    #[test]
    fn small_hours_are_night() {
        assert_eq!(table().moment_for("臺北", taipei(3, 0)), Some(Moment::Night));
    }

    #[test]
    fn window_is_inclusive_at_both_ends() {
        assert_eq!(table().moment_for("臺北", taipei(5, 4)), Some(Moment::Day));
        assert_eq!(table().moment_for("臺北", taipei(18, 47)), Some(Moment::Day));
    }

    #[test]
    fn just_outside_the_window_is_night() {
        assert_eq!(table().moment_for("臺北", taipei(5, 3)), Some(Moment::Night));
        assert_eq!(table().moment_for("臺北", taipei(18, 48)), Some(Moment::Night));
    }

    #[test]
    fn unknown_key_has_no_moment() {
        assert_eq!(table().moment_for("Atlantis", taipei(12, 0)), None);
        assert_eq!(table().moment_for("", taipei(12, 0)), None);
    }

    #[test]
    fn date_outside_the_table_has_no_moment() {
        let off_range = taiwan_offset()
            .with_ymd_and_hms(2031, 6, 21, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(table().moment_for("臺北", off_range), None);
    }

    #[test]
    fn date_is_derived_in_dataset_local_time() {
        // 2024-06-21 23:30 UTC is already 06-22 in Taiwan, which the
        // fixture does not cover.
        let utc_late = Utc.with_ymd_and_hms(2024, 6, 21, 23, 30, 0).unwrap();
        assert_eq!(table().moment_for("臺北", utc_late), None);
    }

    #[test]
    fn bundled_dataset_parses_and_covers_taipei() {
        let bundled = SunTable::bundled();
        let noon = taiwan_offset()
            .with_ymd_and_hms(2026, 6, 21, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let night = taiwan_offset()
            .with_ymd_and_hms(2026, 6, 21, 3, 0, 0)
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(bundled.moment_for("臺北", noon), Some(Moment::Day));
        assert_eq!(bundled.moment_for("臺北", night), Some(Moment::Night));
    }

    #[test]
    fn cache_recomputes_only_when_the_key_changes() {
        let table = table();
        let mut cache = MomentCache::default();

        assert_eq!(cache.moment(&table, "臺北", taipei(12, 0)), Some(Moment::Day));
        // Same key: the cached value is returned even though this instant
        // would classify as night.
        assert_eq!(cache.moment(&table, "臺北", taipei(3, 0)), Some(Moment::Day));

        cache.invalidate();
        assert_eq!(cache.moment(&table, "臺北", taipei(3, 0)), Some(Moment::Night));
    }

    #[test]
    fn cache_tracks_key_changes() {
        let table = table();
        let mut cache = MomentCache::default();

        assert_eq!(cache.moment(&table, "臺北", taipei(12, 0)), Some(Moment::Day));
        assert_eq!(cache.moment(&table, "Atlantis", taipei(12, 0)), None);
        assert_eq!(cache.moment(&table, "臺北", taipei(12, 0)), Some(Moment::Day));
    }
}
