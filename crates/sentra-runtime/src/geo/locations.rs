//! Static location table and great-circle distance

use sentra_core::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A known location with display names
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnownLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub city: &'static str,
    pub country: &'static str,
}

const fn known(latitude: f64, longitude: f64, city: &'static str, country: &'static str) -> KnownLocation {
    KnownLocation {
        latitude,
        longitude,
        city,
        country,
    }
}

/// Normalized name -> coordinates
static KNOWN_LOCATIONS: &[(&str, KnownLocation)] = &[
    ("ny", known(40.7128, -74.006, "New York", "United States")),
    ("newyork", known(40.7128, -74.006, "New York", "United States")),
    ("ca", known(36.7783, -119.4179, "California", "United States")),
    ("california", known(36.7783, -119.4179, "California", "United States")),
    ("tx", known(31.9686, -99.9018, "Texas", "United States")),
    ("texas", known(31.9686, -99.9018, "Texas", "United States")),
    ("fl", known(27.6648, -81.5158, "Florida", "United States")),
    ("florida", known(27.6648, -81.5158, "Florida", "United States")),
    ("wa", known(47.7511, -120.7401, "Washington", "United States")),
    ("washington", known(47.7511, -120.7401, "Washington", "United States")),
    ("london", known(51.5072, -0.1276, "London", "United Kingdom")),
    ("delhi", known(28.6139, 77.209, "Delhi", "India")),
    ("tokyo", known(35.6762, 139.6503, "Tokyo", "Japan")),
    ("dubai", known(25.2048, 55.2708, "Dubai", "United Arab Emirates")),
    ("sydney", known(-33.8688, 151.2093, "Sydney", "Australia")),
];

/// Display names accepted by the table, one per distinct place
pub const SAMPLE_LOCATIONS: &[&str] = &[
    "NY", "CA", "TX", "FL", "WA", "London", "Delhi", "Tokyo", "Dubai", "Sydney",
];

/// Trim, lowercase and drop all whitespace
pub fn normalize_location(location: &str) -> String {
    location
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Look up a free-text location in the static table
pub fn geocode_location(location: &str) -> Option<KnownLocation> {
    let key = normalize_location(location);
    KNOWN_LOCATIONS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, entry)| *entry)
}

/// Haversine distance in kilometres
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat_delta = (to.latitude - from.latitude).to_radians();
    let lon_delta = (to.longitude - from.longitude).to_radians();
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();

    let a = (lat_delta / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (lon_delta / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}
