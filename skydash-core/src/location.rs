//! The canonical city table and the free-text resolver over it.
//!
//! Each of the two CWA feeds is keyed by its own identifier, and the sunrise
//! dataset uses yet another naming convention, so a single canonical record
//! carries all of them.

use serde::Serialize;

/// One canonical city and the identifiers it maps to.
///
/// `city_name` is the display name and the primary key users type.
/// `location_name` keys the observation feed, `station_id` keys the forecast
/// feed, and `sunrise_city_name` keys the bundled sunrise/sunset dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocationRecord {
    pub city_name: &'static str,
    pub location_name: &'static str,
    pub station_id: &'static str,
    pub sunrise_city_name: &'static str,
}

/// Every city the dashboard can track, in priority order: `find_location`
/// returns the first match, so more specific entries must come first.
pub const AVAILABLE_LOCATIONS: &[LocationRecord] = &[
    LocationRecord { city_name: "宜蘭縣", location_name: "宜蘭", station_id: "宜蘭縣", sunrise_city_name: "宜蘭" },
    LocationRecord { city_name: "嘉義市", location_name: "嘉義", station_id: "嘉義市", sunrise_city_name: "嘉義" },
    LocationRecord { city_name: "屏東縣", location_name: "恆春", station_id: "屏東縣", sunrise_city_name: "屏東" },
    LocationRecord { city_name: "苗栗縣", location_name: "竹南", station_id: "苗栗縣", sunrise_city_name: "苗栗" },
    LocationRecord { city_name: "雲林縣", location_name: "斗六", station_id: "雲林縣", sunrise_city_name: "斗六" },
    LocationRecord { city_name: "臺東縣", location_name: "臺東", station_id: "臺東縣", sunrise_city_name: "臺東" },
    LocationRecord { city_name: "臺北市", location_name: "臺北", station_id: "臺北市", sunrise_city_name: "臺北" },
    LocationRecord { city_name: "金門縣", location_name: "金門", station_id: "金門縣", sunrise_city_name: "金城" },
    LocationRecord { city_name: "桃園市", location_name: "新屋", station_id: "桃園市", sunrise_city_name: "桃園" },
    LocationRecord { city_name: "彰化縣", location_name: "員林", station_id: "彰化縣", sunrise_city_name: "彰化" },
    LocationRecord { city_name: "嘉義縣", location_name: "朴子", station_id: "嘉義縣", sunrise_city_name: "嘉義" },
    LocationRecord { city_name: "高雄市", location_name: "高雄", station_id: "高雄市", sunrise_city_name: "高雄" },
    LocationRecord { city_name: "基隆市", location_name: "基隆", station_id: "基隆市", sunrise_city_name: "基隆" },
    LocationRecord { city_name: "臺南市", location_name: "南區中心", station_id: "臺南市", sunrise_city_name: "臺南" },
    LocationRecord { city_name: "南投縣", location_name: "日月潭", station_id: "南投縣", sunrise_city_name: "南投" },
    LocationRecord { city_name: "臺中市", location_name: "臺中", station_id: "臺中市", sunrise_city_name: "臺中" },
    LocationRecord { city_name: "新竹縣", location_name: "竹北", station_id: "新竹縣", sunrise_city_name: "新竹" },
    LocationRecord { city_name: "新竹市", location_name: "新竹", station_id: "新竹市", sunrise_city_name: "新竹" },
    LocationRecord { city_name: "花蓮縣", location_name: "花蓮", station_id: "花蓮縣", sunrise_city_name: "花蓮" },
    LocationRecord { city_name: "連江縣", location_name: "馬祖", station_id: "連江縣", sunrise_city_name: "馬祖" },
    LocationRecord { city_name: "澎湖縣", location_name: "澎湖", station_id: "澎湖縣", sunrise_city_name: "馬公" },
    LocationRecord { city_name: "新北市", location_name: "板橋", station_id: "新北市", sunrise_city_name: "板橋" },
];

/// Resolve a (possibly partial) city name to its canonical record.
///
/// Matching is a case-sensitive substring scan over `city_name` in table
/// order; the first hit wins. Returns `None` for an empty query or when
/// nothing matches. Callers fall back to an empty location, this is not
/// an error.
pub fn find_location(query: &str) -> Option<&'static LocationRecord> {
    if query.is_empty() {
        return None;
    }

    AVAILABLE_LOCATIONS
        .iter()
        .find(|record| record.city_name.contains(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_resolves_to_its_own_record() {
        for record in AVAILABLE_LOCATIONS {
            let found = find_location(record.city_name).expect("every city resolves");
            assert_eq!(found.city_name, record.city_name);
        }
    }

    #[test]
    fn substring_matches_in_table_order() {
        // Both 嘉義市 and 嘉義縣 contain the fragment; 嘉義市 is listed first.
        let found = find_location("嘉義").expect("fragment should match");
        assert_eq!(found.city_name, "嘉義市");
    }

    #[test]
    fn taipei_resolves() {
        let found = find_location("臺北市").expect("Taipei is in the table");
        assert_eq!(found.location_name, "臺北");
        assert_eq!(found.sunrise_city_name, "臺北");
    }

    #[test]
    fn empty_query_is_not_found() {
        assert!(find_location("").is_none());
    }

    #[test]
    fn unknown_city_is_not_found() {
        assert!(find_location("Atlantis").is_none());
    }
}
