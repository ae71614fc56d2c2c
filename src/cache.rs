//! # TTL Cache
//! Small time-bounded cache for external-call results. Entries expire after
//! a fixed window; expired entries are dropped lazily on access. Concurrent
//! callers missing the same key may each trigger a fresh fetch — there is no
//! single-flight here, staleness within the window is acceptable upstream.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug)]
pub struct TtlCache<K, V> {
    inner: RwLock<HashMap<K, (u64, V)>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Lookup against the current clock.
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, now_unix())
    }

    /// Insert against the current clock.
    pub fn insert(&self, key: K, value: V) {
        self.insert_at(key, value, now_unix());
    }

    /// Lookup with an explicit `now` (unix seconds). Expired entries are
    /// removed on the spot.
    pub fn get_at(&self, key: &K, now: u64) -> Option<V> {
        {
            let guard = self.inner.read().expect("ttl cache rwlock poisoned");
            match guard.get(key) {
                Some((expires, v)) if *expires > now => return Some(v.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Entry exists but is stale; evict it.
        let mut guard = self.inner.write().expect("ttl cache rwlock poisoned");
        if let Some((expires, _)) = guard.get(key) {
            if *expires <= now {
                guard.remove(key);
            }
        }
        None
    }

    /// Insert with an explicit `now` (unix seconds).
    pub fn insert_at(&self, key: K, value: V, now: u64) {
        let expires = now.saturating_add(self.ttl.as_secs());
        let mut guard = self.inner.write().expect("ttl cache rwlock poisoned");
        guard.insert(key, (expires, value));
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl.as_secs()
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_else(|_| Duration::from_secs(0))
        .as_secs()
}
