//! Geo resolution
//!
//! Turns a source IP and a free-text location into coordinates. Public IPs
//! go through the geo-IP collaborator first; anything that fails there
//! falls back to the static location table. Resolution never fails, it
//! only returns fewer fields.

mod cache;
mod locations;
mod lookup;

pub use cache::{GeoCache, DEFAULT_GEO_CACHE_TTL};
pub use locations::{
    geocode_location, haversine_km, normalize_location, KnownLocation, SAMPLE_LOCATIONS,
};
pub use lookup::{GeoIpResponse, GeoLookup, HttpGeoLookup, DEFAULT_GEO_TIMEOUT};

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

/// Partial geo resolution result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedGeo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

impl ResolvedGeo {
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    fn from_lookup(response: GeoIpResponse) -> Self {
        Self {
            latitude: response.latitude.filter(|v| v.is_finite()),
            longitude: response.longitude.filter(|v| v.is_finite()),
            city: non_blank(response.city),
            country: non_blank(response.country),
        }
    }
}

impl From<KnownLocation> for ResolvedGeo {
    fn from(entry: KnownLocation) -> Self {
        Self {
            latitude: Some(entry.latitude),
            longitude: Some(entry.longitude),
            city: Some(entry.city.to_string()),
            country: Some(entry.country.to_string()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Whether an address is loopback or in a private range
///
/// Unparseable input other than `localhost` is treated as public and left
/// for the lookup to reject.
pub fn is_private_ip(ip_address: &str) -> bool {
    let trimmed = ip_address.trim();
    if trimmed.eq_ignore_ascii_case("localhost") {
        return true;
    }
    match trimmed.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.is_loopback() || v4.is_private(),
        Ok(IpAddr::V6(v6)) => v6.is_loopback(),
        Err(_) => false,
    }
}

/// Geo resolver with cache and static-table fallback
pub struct GeoResolver {
    lookup: Option<Arc<dyn GeoLookup>>,
    cache: GeoCache,
    timeout: Duration,
}

impl GeoResolver {
    pub fn new(lookup: Arc<dyn GeoLookup>, cache: GeoCache) -> Self {
        Self {
            lookup: Some(lookup),
            cache,
            timeout: DEFAULT_GEO_TIMEOUT,
        }
    }

    /// Resolver that only uses the static table
    pub fn offline() -> Self {
        Self {
            lookup: None,
            cache: GeoCache::default(),
            timeout: DEFAULT_GEO_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve coordinates for a transaction
    pub async fn resolve(&self, ip_address: &str, location: &str) -> ResolvedGeo {
        if let Some(resolved) = self.resolve_by_ip(ip_address).await {
            return resolved;
        }
        self.resolve_by_location(location)
    }

    async fn resolve_by_ip(&self, ip_address: &str) -> Option<ResolvedGeo> {
        if is_private_ip(ip_address) {
            return None;
        }
        let lookup = self.lookup.as_ref()?;

        let cache_key = format!("geo:ip:{}", ip_address);
        if let Some(cached) = self.cache.get(&cache_key) {
            return Some(cached);
        }

        let response = match tokio::time::timeout(self.timeout, lookup.lookup(ip_address)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                tracing::warn!("geo lookup for {} failed, using location table: {}", ip_address, e);
                return None;
            }
            Err(_) => {
                tracing::warn!("geo lookup for {} timed out, using location table", ip_address);
                return None;
            }
        };

        if response.success == Some(false) {
            tracing::debug!("geo lookup reported no result for {}", ip_address);
            return None;
        }

        let resolved = ResolvedGeo::from_lookup(response);
        if !resolved.has_coordinates() {
            return None;
        }
        self.cache.set(cache_key, resolved.clone());
        Some(resolved)
    }

    fn resolve_by_location(&self, location: &str) -> ResolvedGeo {
        let cache_key = format!("geo:location:{}", normalize_location(location));
        if let Some(cached) = self.cache.get(&cache_key) {
            return cached;
        }

        match geocode_location(location) {
            Some(entry) => {
                let resolved = ResolvedGeo::from(entry);
                self.cache.set(cache_key, resolved.clone());
                resolved
            }
            None => {
                tracing::debug!("no coordinates known for location {:?}", location);
                ResolvedGeo::default()
            }
        }
    }
}
