use std::time::Duration;

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the relay listens on
    pub port: u16,
    /// API key for the video-search provider
    pub youtube_api_key: String,
    /// Base URL of the video-search provider
    pub youtube_base_url: String,
    /// Maximum results requested per search
    pub search_max_results: u32,
    /// Maximum videos requested per channel profile
    pub channel_videos_max: u32,
    /// Time-to-live for cached search payloads
    pub cache_ttl: Duration,
    /// Maximum queries retained per session history
    pub history_cap: usize,
    /// Timeout applied to every outbound provider request
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: env_parse("RELAY_PORT", 8080)?,
            youtube_api_key: std::env::var("YOUTUBE_API_KEY").unwrap_or_default(),
            youtube_base_url: std::env::var("YOUTUBE_BASE_URL")
                .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".to_string()),
            search_max_results: env_parse("SEARCH_MAX_RESULTS", 10)?,
            channel_videos_max: env_parse("CHANNEL_VIDEOS_MAX", 10)?,
            cache_ttl: Duration::from_millis(env_parse("CACHE_TTL_MS", 2800u64)?),
            history_cap: env_parse("SEARCH_HISTORY_CAP", 10usize)?,
            request_timeout: Duration::from_millis(env_parse("REQUEST_TIMEOUT_MS", 10_000u64)?),
        })
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid {key} '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}
