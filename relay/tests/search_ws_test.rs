//! Wire-level tests: a bound server, a real WebSocket client, and the
//! JSON frame shapes clients actually see.

mod common;

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use common::StubProvider;
use relay::api;
use relay::app_state::AppState;
use relay::history::SearchHistory;

const HAPPY_DESCRIPTION: &str = "A happy video full of joy and love. Everyone smiles!";

async fn serve(provider: Arc<StubProvider>) -> String {
    let search = common::search_service(provider);
    let app_state = AppState::new(search, SearchHistory::new(10), 10);
    let app = api::router().with_state(app_state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr.to_string()
}

async fn recv_json(
    ws: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin),
) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("no message before timeout")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("frame is not JSON");
        }
    }
}

#[tokio::test]
async fn search_round_trip_over_the_wire() {
    let provider = Arc::new(StubProvider::with_items(&[("vid1", HAPPY_DESCRIPTION)]));
    let addr = serve(provider).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws/search?session=wire-1"))
        .await
        .expect("ws connect failed");

    ws.send(Message::Text(
        r#"{"type":"search","query":"cats"}"#.to_string(),
    ))
    .await
    .expect("send failed");

    let batch = recv_json(&mut ws).await;
    assert_eq!(batch["firstResponse"], Value::Bool(true));
    assert_eq!(batch["query"], "cats");
    assert_eq!(batch["items"][0]["id"], "vid1");
    assert_eq!(batch["items"][0]["channelTitle"], "Channel One");

    // Readability and sentiment frames follow in either order.
    let mut saw_readability = false;
    let mut saw_sentiment = false;
    for _ in 0..2 {
        let frame = recv_json(&mut ws).await;
        if frame.get("fkGrade").is_some() {
            assert!(frame.get("readingEase").is_some());
            saw_readability = true;
        } else if let Some(sentiment) = frame.get("finalSentiment") {
            assert_eq!(sentiment, ":-)");
            saw_sentiment = true;
        }
    }
    assert!(saw_readability, "no readability frame seen");
    assert!(saw_sentiment, "no sentiment frame seen");
}

#[tokio::test]
async fn unknown_payload_gets_an_unhandled_error_frame() {
    let provider = Arc::new(StubProvider::with_items(&[]));
    let addr = serve(provider).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws/search?session=wire-2"))
        .await
        .expect("ws connect failed");

    ws.send(Message::Text(r#"{"type":"dance"}"#.to_string()))
        .await
        .expect("send failed");

    let frame = recv_json(&mut ws).await;
    assert_eq!(frame["error"], "Unhandled message: dance");
}

#[tokio::test]
async fn empty_query_is_rejected_at_the_boundary() {
    let provider = Arc::new(StubProvider::with_items(&[]));
    let addr = serve(provider).await;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws/search?session=wire-3"))
        .await
        .expect("ws connect failed");

    ws.send(Message::Text(
        r#"{"type":"search","query":"   "}"#.to_string(),
    ))
    .await
    .expect("send failed");

    let frame = recv_json(&mut ws).await;
    assert_eq!(frame["error"], "Search query must not be empty");
}

#[tokio::test]
async fn health_and_channel_routes_respond() {
    let provider = Arc::new(StubProvider::default());
    let addr = serve(provider).await;

    let health: Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .expect("health request failed")
        .json()
        .await
        .expect("health body not JSON");
    assert_eq!(health["status"], "ok");

    let profile: Value = reqwest::get(format!("http://{addr}/channel/chan1"))
        .await
        .expect("channel request failed")
        .json()
        .await
        .expect("channel body not JSON");
    assert_eq!(profile["channelId"], "chan1");
    assert_eq!(profile["profile"]["items"][0]["id"], "chan1");
    assert_eq!(profile["videos"]["items"][0]["id"]["videoId"], "recent1");
}
