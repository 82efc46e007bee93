//! reqwest-backed provider for the YouTube Data API.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{ProviderError, SearchProvider};
use crate::config::Config;

pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        Ok(Self {
            http,
            api_key: config.youtube_api_key.clone(),
            base_url: config.youtube_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `path` with `params`, returning the body as JSON. Non-success
    /// statuses become an error payload so callers can cache and inspect
    /// them like the original service did.
    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, ProviderError> {
        let url = format!("{}/{path}", self.base_url);
        debug!(%url, "video API request");
        let response = self
            .http
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Ok(json!({
                "error": format!("API returned error code: {}", status.as_u16()),
            }));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl SearchProvider for YouTubeClient {
    async fn search_videos(&self, query: &str, max_results: u32) -> Result<Value, ProviderError> {
        self.get_json(
            "search",
            &[
                ("part", "snippet"),
                ("maxResults", &max_results.to_string()),
                ("q", query),
            ],
        )
        .await
    }

    async fn channel_details(&self, channel_id: &str) -> Result<Value, ProviderError> {
        self.get_json(
            "channels",
            &[("part", "snippet,statistics"), ("id", channel_id)],
        )
        .await
    }

    async fn channel_videos(
        &self,
        channel_id: &str,
        max_results: u32,
    ) -> Result<Value, ProviderError> {
        self.get_json(
            "search",
            &[
                ("part", "snippet"),
                ("channelId", channel_id),
                ("maxResults", &max_results.to_string()),
                ("order", "date"),
                ("type", "video"),
            ],
        )
        .await
    }
}
