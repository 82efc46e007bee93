//! Per-session search history.
//!
//! Queries are recorded newest first and the list is capped; every record
//! returns the serialized history so callers can log or persist it.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use tracing::debug;

#[derive(Clone)]
pub struct SearchHistory {
    entries: Arc<RwLock<HashMap<String, VecDeque<String>>>>,
    cap: usize,
}

impl SearchHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            cap,
        }
    }

    /// Prepends `query` to the session's history, trims to the cap, and
    /// returns the updated history serialized as a JSON array.
    pub fn record(&self, session_key: &str, query: &str) -> String {
        let mut entries = self.entries.write().expect("history lock poisoned");
        let history = entries.entry(session_key.to_string()).or_default();
        history.push_front(query.to_string());
        history.truncate(self.cap);
        let serialized = serde_json::to_string(history).unwrap_or_else(|_| "[]".to_string());
        debug!(session = session_key, history = %serialized, "recorded search query");
        serialized
    }

    /// The session's recorded queries, newest first.
    pub fn queries(&self, session_key: &str) -> Vec<String> {
        let entries = self.entries.read().expect("history lock poisoned");
        entries
            .get(session_key)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default()
    }
}
