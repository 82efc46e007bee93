use std::sync::Arc;

use axum::http::{header, Method};
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

use relay::api;
use relay::app_state::AppState;
use relay::cache::ResultCache;
use relay::config::Config;
use relay::history::SearchHistory;
use relay::search::{SearchService, YouTubeClient};

/// Load the first `.env` found in the current directory or an ancestor, so
/// running from `relay/` still picks up a repo-root file.
fn load_env_file() {
    let Ok(cwd) = std::env::current_dir() else {
        tracing::warn!("Could not determine current directory for .env lookup");
        return;
    };

    for dir in cwd.ancestors() {
        let candidate = dir.join(".env");
        if !candidate.exists() {
            continue;
        }
        match dotenvy::from_path(&candidate) {
            Ok(()) => {
                tracing::info!(path = %candidate.display(), "Loaded environment from .env");
            }
            Err(e) => {
                tracing::warn!(path = %candidate.display(), error = %e, "Failed to load .env file");
            }
        }
        return;
    }

    tracing::info!(cwd = %cwd.display(), "No .env file found; using process environment only");
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    // Load .env values early so the API key is available before any
    // provider client is built.
    load_env_file();

    tracing::info!("Starting StreamLens relay");

    let config = Config::from_env().expect("Failed to load configuration");
    if config.youtube_api_key.is_empty() {
        tracing::warn!("YOUTUBE_API_KEY is not set; upstream searches will be rejected");
    }

    let provider = Arc::new(YouTubeClient::new(&config).expect("Failed to build provider client"));
    let cache = ResultCache::new(config.cache_ttl);
    cache.start_sweep();

    let search = SearchService::new(provider, cache.clone(), config.search_max_results);
    let history = SearchHistory::new(config.history_cap);

    let app_state = AppState::new(search, history, config.channel_videos_max);
    let _ = app_state
        .ensure_supervisor()
        .await
        .expect("Failed to spawn relay supervisor");

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let app = api::router().layer(cors).with_state(app_state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Listening on http://{addr}");
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    cache.stop_sweep();
    Ok(())
}
