use std::sync::Arc;

use ractor::{Actor, ActorRef};
use shared_types::{ChannelProfile, ClientFrame};
use tokio::sync::{mpsc, Mutex};

use crate::actors::session::SessionMsg;
use crate::history::SearchHistory;
use crate::search::SearchService;
use crate::supervisor::{self, RelaySupervisor, RelaySupervisorArgs, RelaySupervisorMsg};

/// Shared handle the API layer carries; the supervisor is spawned lazily
/// on first use.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    search: SearchService,
    history: SearchHistory,
    channel_videos_max: u32,
    supervisor: Mutex<Option<ActorRef<RelaySupervisorMsg>>>,
}

impl AppState {
    pub fn new(search: SearchService, history: SearchHistory, channel_videos_max: u32) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                search,
                history,
                channel_videos_max,
                supervisor: Mutex::new(None),
            }),
        }
    }

    pub async fn ensure_supervisor(&self) -> Result<ActorRef<RelaySupervisorMsg>, String> {
        let mut guard = self.inner.supervisor.lock().await;
        if let Some(supervisor) = guard.as_ref() {
            return Ok(supervisor.clone());
        }

        let (supervisor, _) = Actor::spawn(
            Some(format!("relay_supervisor:{}", ulid::Ulid::new())),
            RelaySupervisor,
            RelaySupervisorArgs {
                search: self.inner.search.clone(),
                history: self.inner.history.clone(),
                channel_videos_max: self.inner.channel_videos_max,
            },
        )
        .await
        .map_err(|e| e.to_string())?;

        *guard = Some(supervisor.clone());
        Ok(supervisor)
    }

    pub async fn open_session(
        &self,
        session_key: String,
        outbound: mpsc::UnboundedSender<ClientFrame>,
    ) -> Result<ActorRef<SessionMsg>, String> {
        let supervisor = self.ensure_supervisor().await?;
        supervisor::open_session(&supervisor, session_key, outbound).await
    }

    pub async fn close_session(&self, session_key: String) {
        if let Ok(supervisor) = self.ensure_supervisor().await {
            let _ = supervisor::remove_session(&supervisor, session_key);
        }
    }

    pub async fn fetch_channel_profile(&self, channel_id: String) -> Result<ChannelProfile, String> {
        let supervisor = self.ensure_supervisor().await?;
        supervisor::fetch_channel_profile(&supervisor, channel_id)
            .await
            .map_err(|e| e.to_string())
    }
}
