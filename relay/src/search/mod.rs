//! Video-search collaborator boundary.
//!
//! [`SearchProvider`] is the seam to the upstream API; [`SearchService`]
//! fronts it with the TTL cache and turns raw payloads into typed items.

pub mod youtube;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use shared_types::VideoItem;

use crate::cache::ResultCache;

pub use youtube::YouTubeClient;

/// Upstream search/channel API, keyed the way the provider keys it.
///
/// Transport and parse failures are `Err`; upstream non-success statuses
/// come back as `{"error": ...}` payloads so they can flow through the
/// cache like any other response.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search_videos(&self, query: &str, max_results: u32) -> Result<Value, ProviderError>;
    async fn channel_details(&self, channel_id: &str) -> Result<Value, ProviderError>;
    async fn channel_videos(&self, channel_id: &str, max_results: u32)
        -> Result<Value, ProviderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("response parse failed: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SearchError {
    #[error("{0}")]
    Upstream(String),
}

/// Cache-fronted access to the search provider.
#[derive(Clone)]
pub struct SearchService {
    provider: Arc<dyn SearchProvider>,
    cache: ResultCache,
    max_results: u32,
}

impl SearchService {
    pub fn new(provider: Arc<dyn SearchProvider>, cache: ResultCache, max_results: u32) -> Self {
        Self {
            provider,
            cache,
            max_results,
        }
    }

    pub fn provider(&self) -> Arc<dyn SearchProvider> {
        self.provider.clone()
    }

    /// Fetches the result batch for `query`, reusing a cached payload when
    /// one is still live.
    pub async fn fetch_videos(&self, query: &str) -> Result<Vec<VideoItem>, SearchError> {
        let provider = self.provider.clone();
        let max_results = self.max_results;
        let payload = self
            .cache
            .get_or_compute(query, || async move {
                provider.search_videos(query, max_results).await
            })
            .await;
        parse_search_payload(&payload)
    }
}

/// Maps a raw search payload to typed items, treating error-marked and
/// item-less payloads as upstream failures. Items without a video id are
/// dropped.
pub fn parse_search_payload(payload: &Value) -> Result<Vec<VideoItem>, SearchError> {
    if let Some(message) = payload.get("error").and_then(Value::as_str) {
        return Err(SearchError::Upstream(message.to_string()));
    }

    let items = payload
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::Upstream("video search returned no usable payload".to_string()))?;

    Ok(items
        .iter()
        .filter_map(|item| {
            let id = item
                .pointer("/id/videoId")
                .or_else(|| item.get("id"))
                .and_then(Value::as_str)?;
            let snippet = item.get("snippet")?;
            let text = |field: &str| {
                snippet
                    .get(field)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            Some(VideoItem {
                id: id.to_string(),
                title: text("title"),
                channel_id: text("channelId"),
                channel_title: text("channelTitle"),
                description: text("description"),
                thumbnail_url: snippet
                    .pointer("/thumbnails/default/url")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            })
        })
        .collect())
}
