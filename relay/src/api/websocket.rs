//! Search WebSocket endpoint.
//!
//! Each connection opens (or reuses) the session worker for its key and
//! relays frames in both directions: inbound client requests become casts
//! to the session actor, outbound frames flow through an unbounded channel
//! drained by a writer task.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::Value;
use shared_types::{ClientFrame, ClientRequest};
use tokio::sync::mpsc;
use tracing::info;

use crate::actors::session::SessionMsg;
use crate::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchWsQuery {
    session: Option<String>,
}

pub async fn search_websocket(
    ws: WebSocketUpgrade,
    Query(query): Query<SearchWsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let session_key = query
        .session
        .filter(|key| !key.is_empty())
        .unwrap_or_else(|| format!("anonymous-{}", ulid::Ulid::new()));
    ws.on_upgrade(move |socket| handle_search_socket(socket, state, session_key))
}

async fn handle_search_socket(socket: WebSocket, state: AppState, session_key: String) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ClientFrame>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&frame) else {
                continue;
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let session = match state.open_session(session_key.clone(), tx.clone()).await {
        Ok(session) => session,
        Err(e) => {
            let _ = tx.send(ClientFrame::error(format!("Failed to open session: {e}")));
            drop(tx);
            let _ = writer.await;
            return;
        }
    };

    info!(session = %session_key, "search socket connected");

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientRequest>(&text) {
                Ok(ClientRequest::Search { query }) => {
                    if query.trim().is_empty() {
                        let _ = tx.send(ClientFrame::error("Search query must not be empty"));
                        continue;
                    }
                    let _ = session.cast(SessionMsg::Search { query });
                }
                Err(_) => {
                    // Unrecognized payloads are answered, never dropped.
                    let kind = serde_json::from_str::<Value>(&text)
                        .ok()
                        .and_then(|value| {
                            value
                                .get("type")
                                .and_then(Value::as_str)
                                .map(str::to_string)
                        })
                        .unwrap_or_else(|| "unknown".to_string());
                    let _ = session.cast(SessionMsg::Unsupported { kind });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!(session = %session_key, "search socket closed");
    state.close_session(session_key).await;
    writer.abort();
}
