//! TTL cache for container listings
//!
//! Expired entries are evicted lazily: on `get` for the probed key and on
//! `size` for every key. All access goes through one mutex.

use crate::models::Container;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// A cached listing with the moment it was written and its lifetime
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Vec<Container>,
    pub timestamp: Instant,
    pub ttl: Duration,
}

impl CacheEntry {
    pub fn new(data: Vec<Container>, ttl: Duration) -> Self {
        Self {
            data,
            timestamp: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) > self.ttl
    }
}

/// Build the cache key for a listing scope.
///
/// Distinct combinations of present/absent location and workload never
/// collide: `gvc`, `gvc|loc:L`, `gvc|wl:W`, `gvc|loc:L|wl:W`. Backslashes
/// and `|` inside the parts are escaped so a name can never forge a
/// separator.
pub fn cache_key(gvc: &str, location: Option<&str>, workload: Option<&str>) -> String {
    let mut key = String::with_capacity(gvc.len() + 16);
    push_escaped(&mut key, gvc);
    if let Some(location) = location {
        key.push_str("|loc:");
        push_escaped(&mut key, location);
    }
    if let Some(workload) = workload {
        key.push_str("|wl:");
        push_escaped(&mut key, workload);
    }
    key
}

fn push_escaped(key: &mut String, part: &str) {
    for c in part.chars() {
        if c == '\\' || c == '|' {
            key.push('\\');
        }
        key.push(c);
    }
}

/// Mutex-guarded map of listing results with per-entry TTL
#[derive(Debug, Default)]
pub struct ContainerCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ContainerCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached containers for `key`, evicting the entry if it has expired
    pub fn get(&self, key: &str) -> Option<Vec<Container>> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                debug!(key = %key, "Evicting expired cache entry");
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.data.clone()),
            None => None,
        }
    }

    pub fn set(&self, key: impl Into<String>, data: Vec<Container>, ttl: Duration) {
        self.lock().insert(key.into(), CacheEntry::new(data, ttl));
    }

    /// Returns true if an entry was present
    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of live entries. Sweeps expired entries before counting.
    pub fn size(&self) -> usize {
        let mut entries = self.lock();
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        entries.len()
    }
}
