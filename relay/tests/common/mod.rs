//! Shared test fixtures: a configurable stub provider and wiring helpers.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use relay::cache::ResultCache;
use relay::history::SearchHistory;
use relay::search::{ProviderError, SearchProvider, SearchService};
use relay::supervisor::RelaySupervisorArgs;

#[derive(Default)]
pub struct StubProvider {
    /// (video id, description) pairs returned by every search
    pub items: Vec<(String, String)>,
    pub search_calls: AtomicUsize,
    pub fail_search: bool,
    /// Return an error-marked payload instead of failing the transport
    pub search_error_payload: Option<String>,
    pub fail_channel_details: bool,
    pub fail_channel_videos: bool,
    pub channel_details_error_payload: bool,
}

impl StubProvider {
    pub fn with_items(items: &[(&str, &str)]) -> Self {
        Self {
            items: items
                .iter()
                .map(|(id, desc)| (id.to_string(), desc.to_string()))
                .collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl SearchProvider for StubProvider {
    async fn search_videos(&self, _query: &str, _max_results: u32) -> Result<Value, ProviderError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_search {
            return Err(ProviderError::Request("stub search down".to_string()));
        }
        if let Some(message) = &self.search_error_payload {
            return Ok(json!({"error": message}));
        }
        let items: Vec<Value> = self
            .items
            .iter()
            .map(|(id, description)| {
                json!({
                    "id": {"videoId": id},
                    "snippet": {
                        "title": format!("video {id}"),
                        "channelId": "chan1",
                        "channelTitle": "Channel One",
                        "description": description,
                        "thumbnails": {"default": {"url": "http://img/default.jpg"}},
                    }
                })
            })
            .collect();
        Ok(json!({"items": items}))
    }

    async fn channel_details(&self, channel_id: &str) -> Result<Value, ProviderError> {
        if self.fail_channel_details {
            return Err(ProviderError::Request("stub details down".to_string()));
        }
        if self.channel_details_error_payload {
            return Ok(json!({"error": "Failed to fetch channel details."}));
        }
        Ok(json!({
            "items": [{"id": channel_id, "snippet": {"title": "Channel One"}}]
        }))
    }

    async fn channel_videos(
        &self,
        channel_id: &str,
        _max_results: u32,
    ) -> Result<Value, ProviderError> {
        if self.fail_channel_videos {
            return Err(ProviderError::Request("stub videos down".to_string()));
        }
        Ok(json!({
            "items": [{"id": {"videoId": "recent1"}, "snippet": {"channelId": channel_id}}]
        }))
    }
}

pub fn search_service(provider: Arc<dyn SearchProvider>) -> SearchService {
    SearchService::new(provider, ResultCache::new(Duration::from_millis(2800)), 10)
}

pub fn supervisor_args(provider: Arc<dyn SearchProvider>) -> RelaySupervisorArgs {
    RelaySupervisorArgs {
        search: search_service(provider),
        history: SearchHistory::new(10),
        channel_videos_max: 10,
    }
}
