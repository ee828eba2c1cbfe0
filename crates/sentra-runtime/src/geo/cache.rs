//! TTL cache for resolved locations

use super::ResolvedGeo;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Default time-to-live for cached lookups (24h)
pub const DEFAULT_GEO_CACHE_TTL: Duration = Duration::from_secs(86_400);

#[derive(Debug, Clone)]
struct CachedGeo {
    value: ResolvedGeo,
    cached_at: Instant,
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<String, CachedGeo>,
    last_sweep: Instant,
}

/// In-memory geo cache with a single TTL for all entries
///
/// Expired entries are swept on insert, at most once per TTL period, so the
/// map never holds more than one period's worth of stale keys.
pub struct GeoCache {
    state: RwLock<CacheState>,
    ttl: Duration,
}

impl GeoCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            ttl,
        }
    }

    /// Get a live entry
    pub fn get(&self, key: &str) -> Option<ResolvedGeo> {
        let state = self.state.read().ok()?;
        state
            .entries
            .get(key)
            .filter(|entry| entry.cached_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: String, value: ResolvedGeo) {
        let ttl = self.ttl;
        if let Ok(mut state) = self.state.write() {
            let now = Instant::now();
            if now.duration_since(state.last_sweep) >= ttl {
                state
                    .entries
                    .retain(|_, entry| now.duration_since(entry.cached_at) < ttl);
                state.last_sweep = now;
            }
            state.entries.insert(
                key,
                CachedGeo {
                    value,
                    cached_at: now,
                },
            );
        }
    }

    /// Remove expired entries
    pub fn cleanup(&self) {
        let ttl = self.ttl;
        if let Ok(mut state) = self.state.write() {
            state.entries.retain(|_, entry| entry.cached_at.elapsed() < ttl);
            state.last_sweep = Instant::now();
        }
    }

    pub fn size(&self) -> usize {
        self.state.read().map(|s| s.entries.len()).unwrap_or(0)
    }
}

impl Default for GeoCache {
    fn default() -> Self {
        Self::new(DEFAULT_GEO_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokyo() -> ResolvedGeo {
        ResolvedGeo {
            latitude: Some(35.6762),
            longitude: Some(139.6503),
            city: Some("Tokyo".to_string()),
            country: Some("Japan".to_string()),
        }
    }

    #[test]
    fn test_cache_validity() {
        let cache = GeoCache::new(Duration::from_millis(50));
        cache.set("geo:ip:1.2.3.4".to_string(), tokyo());
        assert_eq!(cache.get("geo:ip:1.2.3.4"), Some(tokyo()));

        std::thread::sleep(Duration::from_millis(80));
        assert!(cache.get("geo:ip:1.2.3.4").is_none());
    }

    #[test]
    fn test_cache_cleanup() {
        let cache = GeoCache::new(Duration::from_millis(20));
        cache.set("expired".to_string(), tokyo());
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(cache.size(), 1);
        cache.cleanup();
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_set_sweeps_expired_entries() {
        let cache = GeoCache::new(Duration::from_millis(20));
        for i in 0..10 {
            cache.set(format!("geo:ip:1.2.3.{}", i), tokyo());
        }
        assert_eq!(cache.size(), 10);

        std::thread::sleep(Duration::from_millis(40));
        cache.set("geo:ip:5.6.7.8".to_string(), tokyo());
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.get("geo:ip:5.6.7.8"), Some(tokyo()));
    }

    #[test]
    fn test_set_keeps_live_entries() {
        let cache = GeoCache::new(Duration::from_secs(60));
        cache.set("geo:location:newyork".to_string(), tokyo());
        cache.set("geo:location:tokyo".to_string(), tokyo());
        assert_eq!(cache.size(), 2);
        assert!(cache.get("geo:location:newyork").is_some());
    }
}
