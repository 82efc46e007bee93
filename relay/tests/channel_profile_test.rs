//! Channel profile combination tests: both halves or neither.

mod common;

use std::sync::Arc;

use ractor::Actor;

use common::StubProvider;
use relay::supervisor::{self, RelaySupervisor};

#[tokio::test]
async fn profile_combines_details_and_videos() {
    let provider = Arc::new(StubProvider::default());
    let (supervisor, _) = Actor::spawn(None, RelaySupervisor, common::supervisor_args(provider))
        .await
        .expect("Failed to spawn supervisor");

    let profile = supervisor::fetch_channel_profile(&supervisor, "chan1")
        .await
        .expect("fetch failed");

    assert_eq!(profile.channel_id, "chan1");
    let details = profile.profile.expect("details missing");
    assert_eq!(details["items"][0]["id"], "chan1");
    let videos = profile.videos.expect("videos missing");
    assert_eq!(videos["items"][0]["id"]["videoId"], "recent1");
}

#[tokio::test]
async fn failed_videos_call_degrades_the_whole_profile() {
    let provider = Arc::new(StubProvider {
        fail_channel_videos: true,
        ..StubProvider::default()
    });
    let (supervisor, _) = Actor::spawn(None, RelaySupervisor, common::supervisor_args(provider))
        .await
        .expect("Failed to spawn supervisor");

    let profile = supervisor::fetch_channel_profile(&supervisor, "chan1")
        .await
        .expect("fetch failed");

    assert_eq!(profile.channel_id, "chan1");
    assert!(profile.profile.is_none());
    assert!(profile.videos.is_none());
}

#[tokio::test]
async fn error_marked_details_payload_degrades_the_whole_profile() {
    let provider = Arc::new(StubProvider {
        channel_details_error_payload: true,
        ..StubProvider::default()
    });
    let (supervisor, _) = Actor::spawn(None, RelaySupervisor, common::supervisor_args(provider))
        .await
        .expect("Failed to spawn supervisor");

    let profile = supervisor::fetch_channel_profile(&supervisor, "chan1")
        .await
        .expect("fetch failed");

    assert!(profile.profile.is_none());
    assert!(profile.videos.is_none());
}

#[tokio::test]
async fn repeated_fetches_reuse_the_channel_worker() {
    let provider = Arc::new(StubProvider::default());
    let (supervisor, _) = Actor::spawn(None, RelaySupervisor, common::supervisor_args(provider))
        .await
        .expect("Failed to spawn supervisor");

    let first = supervisor::fetch_channel_profile(&supervisor, "chan1")
        .await
        .expect("first fetch failed");
    let second = supervisor::fetch_channel_profile(&supervisor, "chan1")
        .await
        .expect("second fetch failed");

    assert_eq!(first, second);
}
