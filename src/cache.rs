//! In-process TTL cache for slot queries.
//!
//! Values are stored as JSON so any serializable result can be cached under a
//! string key. Keys are namespaced with `slots_`.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

const KEY_PREFIX: &str = "slots_";

struct Entry {
    value: serde_json::Value,
    /// `None` when the TTL runs past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.expires_at.map_or(true, |at| at > Instant::now())
    }
}

pub struct SlotsCache {
    enabled: bool,
    default_ttl: Duration,
    entries: DashMap<String, Entry>,
}

impl SlotsCache {
    pub fn new(enabled: bool, default_ttl: Duration) -> Self {
        Self {
            enabled,
            default_ttl,
            entries: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn full_key(key: &str) -> String {
        format!("{KEY_PREFIX}{key}")
    }

    /// Cached value for `key`. Expired entries are evicted and read as a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        if !self.enabled {
            return None;
        }
        let full = Self::full_key(key);
        let value = {
            let entry = self.entries.get(&full)?;
            if entry.is_live() {
                Some(entry.value.clone())
            } else {
                None
            }
        };
        match value {
            Some(v) => serde_json::from_value(v).ok(),
            None => {
                self.entries.remove(&full);
                None
            }
        }
    }

    /// Store `value` with the default TTL. Returns false when caching is off.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> bool {
        self.set_with_ttl(key, value, self.default_ttl)
    }

    pub fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> bool {
        if !self.enabled {
            return false;
        }
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Cache serialization failed for {key}: {e}");
                return false;
            }
        };
        self.entries.insert(
            Self::full_key(key),
            Entry {
                value,
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        true
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(&Self::full_key(key)).is_some()
    }

    pub fn clear_all(&self) {
        let count = self.entries.len();
        self.entries.clear();
        if count > 0 {
            tracing::debug!("Cleared {count} cached entries");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_cache_never_stores() {
        let cache = SlotsCache::new(false, Duration::from_secs(60));
        assert!(!cache.set("grid_recent_12", &vec![1, 2, 3]));
        assert_eq!(cache.get::<Vec<i32>>("grid_recent_12"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn round_trips_values() {
        let cache = SlotsCache::new(true, Duration::from_secs(60));
        assert!(cache.set("detail_SLOT000001", &"cached".to_string()));
        assert_eq!(cache.get::<String>("detail_SLOT000001").as_deref(), Some("cached"));
        assert_eq!(cache.get::<String>("detail_SLOT000002"), None);
    }

    #[test]
    fn expired_entries_are_evicted() {
        let cache = SlotsCache::new(true, Duration::from_secs(60));
        cache.set_with_ttl("short", &1u32, Duration::ZERO);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<u32>("short"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn oversized_ttl_never_expires() {
        let cache = SlotsCache::new(true, Duration::from_secs(u64::MAX));
        assert!(cache.set("grid_recent_12", &vec![7u32]));
        assert_eq!(cache.get::<Vec<u32>>("grid_recent_12"), Some(vec![7]));
        assert!(cache.set_with_ttl("detail_9", &9u32, Duration::MAX));
        assert_eq!(cache.get::<u32>("detail_9"), Some(9));
    }

    #[test]
    fn delete_and_clear() {
        let cache = SlotsCache::new(true, Duration::from_secs(60));
        cache.set("a", &1u32);
        cache.set("b", &2u32);
        assert!(cache.delete("a"));
        assert!(!cache.delete("a"));
        cache.clear_all();
        assert_eq!(cache.get::<u32>("b"), None);
    }
}
