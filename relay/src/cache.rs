//! Time-bounded cache for search payloads.
//!
//! Entries expire a fixed TTL after insertion. A background sweep runs at
//! the TTL period and removes expired entries; reads also check expiry, so
//! an entry is never visible past its deadline regardless of sweep timing.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct ResultCache {
    entries: Arc<RwLock<HashMap<String, CacheEntry>>>,
    ttl: Duration,
    sweeper: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            sweeper: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the cached payload for `key`, or `None` if absent or expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.read().expect("cache lock poisoned");
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key` with a fresh TTL.
    pub fn insert(&self, key: &str, value: Value) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(key.to_string(), entry);
    }

    /// Returns the cached payload for `key`, computing and storing it on a
    /// miss. If the compute future fails the key is left unset and an empty
    /// JSON object is returned.
    ///
    /// Not single-flight: two concurrent misses for the same key may both
    /// invoke `compute` and both write; each write is a complete entry and
    /// the later one wins.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &str, compute: F) -> Value
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
        E: std::fmt::Display,
    {
        if let Some(cached) = self.get(key) {
            debug!(key, "cache hit");
            return cached;
        }

        match compute().await {
            Ok(value) => {
                debug!(key, "cache miss, storing computed payload");
                self.insert(key, value.clone());
                value
            }
            Err(e) => {
                warn!(key, error = %e, "cache compute failed, returning neutral payload");
                Value::Object(serde_json::Map::new())
            }
        }
    }

    /// Removes every entry whose TTL has elapsed.
    pub fn sweep(&self) {
        sweep_entries(&self.entries);
    }

    /// Starts the background sweep at the TTL period. Calling it again while
    /// a sweeper is running is a no-op.
    pub fn start_sweep(&self) {
        let mut guard = self.sweeper.lock().expect("sweeper lock poisoned");
        if guard.is_some() {
            return;
        }
        let entries = self.entries.clone();
        let period = self.ttl;
        *guard = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick is immediate; skip it
            loop {
                interval.tick().await;
                sweep_entries(&entries);
            }
        }));
    }

    /// Stops the background sweep. Idempotent.
    pub fn stop_sweep(&self) {
        if let Some(handle) = self.sweeper.lock().expect("sweeper lock poisoned").take() {
            handle.abort();
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.read().expect("cache lock poisoned").len()
    }
}

impl Drop for ResultCache {
    fn drop(&mut self) {
        // Last clone going away takes the sweeper with it.
        if Arc::strong_count(&self.sweeper) == 1 {
            self.stop_sweep();
        }
    }
}

fn sweep_entries(entries: &Arc<RwLock<HashMap<String, CacheEntry>>>) {
    let now = Instant::now();
    let mut entries = entries.write().expect("cache lock poisoned");
    entries.retain(|key, entry| {
        let expired = entry.expires_at <= now;
        if expired {
            debug!(key, "sweeping expired cache entry");
        }
        !expired
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn insert_then_get_returns_value() {
        let cache = ResultCache::new(Duration::from_secs(5));
        cache.insert("cats", json!({"items": []}));
        assert_eq!(cache.get("cats"), Some(json!({"items": []})));
        assert_eq!(cache.get("dogs"), None);
    }

    #[tokio::test]
    async fn expired_entry_is_absent_on_read() {
        let cache = ResultCache::new(Duration::from_millis(20));
        cache.insert("cats", json!(1));
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(cache.get("cats"), None);
    }

    #[tokio::test]
    async fn sweep_removes_expired_entries() {
        let cache = ResultCache::new(Duration::from_millis(20));
        cache.insert("cats", json!(1));
        assert_eq!(cache.len(), 1);
        tokio::time::sleep(Duration::from_millis(40)).await;
        cache.sweep();
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn background_sweep_evicts_after_ttl() {
        let cache = ResultCache::new(Duration::from_millis(30));
        cache.start_sweep();
        cache.insert("cats", json!(1));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.len(), 0);
        cache.stop_sweep();
    }

    #[tokio::test]
    async fn get_or_compute_skips_compute_on_hit() {
        let cache = ResultCache::new(Duration::from_secs(5));
        cache.insert("cats", json!({"cached": true}));

        let invocations = AtomicUsize::new(0);
        let value = cache
            .get_or_compute("cats", || {
                invocations.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, std::convert::Infallible>(json!({"computed": true})) }
            })
            .await;

        assert_eq!(value, json!({"cached": true}));
        assert_eq!(invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn get_or_compute_stores_on_miss() {
        let cache = ResultCache::new(Duration::from_secs(5));
        let value = cache
            .get_or_compute("cats", || async {
                Ok::<_, std::convert::Infallible>(json!({"computed": true}))
            })
            .await;
        assert_eq!(value, json!({"computed": true}));
        assert_eq!(cache.get("cats"), Some(json!({"computed": true})));
    }

    #[tokio::test]
    async fn failed_compute_returns_neutral_payload_and_caches_nothing() {
        let cache = ResultCache::new(Duration::from_secs(5));
        let value = cache
            .get_or_compute("cats", || async { Err::<Value, _>("upstream down") })
            .await;
        assert_eq!(value, json!({}));
        assert_eq!(cache.get("cats"), None);
    }

    #[tokio::test]
    async fn stop_sweep_is_idempotent() {
        let cache = ResultCache::new(Duration::from_millis(50));
        cache.start_sweep();
        cache.stop_sweep();
        cache.stop_sweep();
    }
}
