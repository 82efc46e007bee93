//! Relay supervisor - the single owner of the worker registries.
//!
//! Creates and looks up per-session orchestrators (each paired with its
//! own readability scorer) and per-channel profile workers. All registry
//! mutation happens inside this actor's message loop, which makes
//! get-or-create an atomic check-or-insert. Failed children are restarted
//! with fresh state under the same registry key, up to a bounded number of
//! restarts per rolling window; past the budget the child is dropped and
//! its registry entry invalidated.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SupervisionEvent};
use shared_types::{ChannelProfile, ClientFrame};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::actors::channel_profile::{
    ChannelProfileActor, ChannelProfileArguments, ChannelProfileMsg,
};
use crate::actors::readability::{ReadabilityActor, ReadabilityMsg};
use crate::actors::session::{SessionActor, SessionArguments, SessionMsg};
use crate::history::SearchHistory;
use crate::search::SearchService;

/// Maximum restarts allowed per child within the period
const MAX_RESTARTS: u32 = 10;
/// Rolling window for restart intensity tracking
const RESTART_PERIOD: Duration = Duration::from_secs(60);

/// Bound on registry creation/lookup calls
pub const REGISTRY_CALL_TIMEOUT_MS: u64 = 5_000;
/// Bound on a channel-profile round trip
pub const CHANNEL_PROFILE_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Default)]
pub struct RelaySupervisor;

#[derive(Clone)]
pub struct RelaySupervisorArgs {
    pub search: SearchService,
    pub history: SearchHistory,
    pub channel_videos_max: u32,
}

#[derive(Clone)]
pub struct SessionInfo {
    pub actor_ref: ActorRef<SessionMsg>,
    pub scorer: ActorRef<ReadabilityMsg>,
    /// Arguments used to spawn the session (reused on restarts)
    args: SessionArguments,
}

#[derive(Clone)]
struct ChannelWorkerInfo {
    actor_ref: ActorRef<ChannelProfileMsg>,
    args: ChannelProfileArguments,
}

pub struct RelaySupervisorState {
    sessions: HashMap<String, SessionInfo>,
    channel_workers: HashMap<String, ChannelWorkerInfo>,
    /// Registry key -> (restart_count, window_start)
    restart_counts: HashMap<String, (u32, Instant)>,
    search: SearchService,
    history: SearchHistory,
    channel_videos_max: u32,
}

#[derive(Debug)]
pub enum RelaySupervisorMsg {
    /// Idempotent get-or-create of the session worker for a key. An
    /// existing worker is returned unchanged; new collaborator arguments
    /// are ignored.
    OpenSession {
        session_key: String,
        outbound: mpsc::UnboundedSender<ClientFrame>,
        reply: RpcReplyPort<Result<ActorRef<SessionMsg>, String>>,
    },
    GetSession {
        session_key: String,
        reply: RpcReplyPort<Option<ActorRef<SessionMsg>>>,
    },
    /// Teardown signal from the transport: stop and deregister the worker.
    RemoveSession {
        session_key: String,
    },
    /// Lookup-or-create the channel worker and forward the fetch; the
    /// reply port stays the original requester's.
    FetchChannelProfile {
        channel_id: String,
        reply: RpcReplyPort<ChannelProfile>,
    },
    Supervision(SupervisionEvent),
}

impl RelaySupervisor {
    /// Whether the child registered under `registry_key` may be restarted
    /// now, counting restarts in a rolling window.
    fn should_restart(&self, registry_key: &str, state: &mut RelaySupervisorState) -> bool {
        let now = Instant::now();
        match state.restart_counts.get_mut(registry_key) {
            Some((count, window_start)) => {
                if now.duration_since(*window_start) > RESTART_PERIOD {
                    *count = 1;
                    *window_start = now;
                    true
                } else if *count < MAX_RESTARTS {
                    *count += 1;
                    true
                } else {
                    warn!(
                        registry_key,
                        restarts = *count,
                        "restart intensity exceeded - dropping worker"
                    );
                    false
                }
            }
            None => {
                state
                    .restart_counts
                    .insert(registry_key.to_string(), (1, now));
                true
            }
        }
    }

    async fn handle_supervision_event(
        &self,
        myself: ActorRef<RelaySupervisorMsg>,
        event: SupervisionEvent,
        state: &mut RelaySupervisorState,
    ) -> Result<(), ActorProcessingErr> {
        match event {
            SupervisionEvent::ActorStarted(cell) => {
                debug!(child = %cell.get_id(), "child started");
            }
            SupervisionEvent::ActorFailed(cell, failure) => {
                let actor_id = cell.get_id();
                warn!(failed_actor = %actor_id, error = %failure, "child failed - evaluating restart");

                if let Some(session_key) = state
                    .sessions
                    .iter()
                    .find(|(_, info)| info.actor_ref.get_id() == actor_id)
                    .map(|(key, _)| key.clone())
                {
                    if self.should_restart(&format!("session:{session_key}"), state) {
                        self.restart_session(&myself, &session_key, state).await?;
                    } else {
                        self.drop_session(&session_key, state);
                    }
                } else if let Some(session_key) = state
                    .sessions
                    .iter()
                    .find(|(_, info)| info.scorer.get_id() == actor_id)
                    .map(|(key, _)| key.clone())
                {
                    if self.should_restart(&format!("scorer:{session_key}"), state) {
                        self.restart_scorer(&myself, &session_key, state).await?;
                    } else {
                        self.drop_session(&session_key, state);
                    }
                } else if let Some(channel_id) = state
                    .channel_workers
                    .iter()
                    .find(|(_, info)| info.actor_ref.get_id() == actor_id)
                    .map(|(id, _)| id.clone())
                {
                    if self.should_restart(&format!("channel:{channel_id}"), state) {
                        self.restart_channel_worker(&myself, &channel_id, state)
                            .await?;
                    } else {
                        state.channel_workers.remove(&channel_id);
                    }
                } else {
                    debug!(failed_actor = %actor_id, "failure from an untracked child");
                }
            }
            SupervisionEvent::ActorTerminated(cell, _, reason) => {
                let actor_id = cell.get_id();
                info!(terminated_actor = %actor_id, reason = ?reason, "child terminated");

                if let Some(session_key) = state
                    .sessions
                    .iter()
                    .find(|(_, info)| {
                        info.actor_ref.get_id() == actor_id || info.scorer.get_id() == actor_id
                    })
                    .map(|(key, _)| key.clone())
                {
                    self.drop_session(&session_key, state);
                } else {
                    state
                        .channel_workers
                        .retain(|_, info| info.actor_ref.get_id() != actor_id);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Replaces a failed session worker: fresh state (dedup set and
    /// first-search flag are lost), same registry key and scorer pairing.
    async fn restart_session(
        &self,
        myself: &ActorRef<RelaySupervisorMsg>,
        session_key: &str,
        state: &mut RelaySupervisorState,
    ) -> Result<(), ActorProcessingErr> {
        let Some(info) = state.sessions.get(session_key).cloned() else {
            warn!(session = session_key, "session info missing during restart");
            return Ok(());
        };

        info!(session = session_key, "restarting session worker");
        match Actor::spawn_linked(None, SessionActor, info.args.clone(), myself.get_cell()).await {
            Ok((new_ref, _)) => {
                state.sessions.insert(
                    session_key.to_string(),
                    SessionInfo {
                        actor_ref: new_ref,
                        scorer: info.scorer,
                        args: info.args,
                    },
                );
                Ok(())
            }
            Err(e) => {
                error!(session = session_key, error = %e, "failed to restart session worker");
                self.drop_session(session_key, state);
                Ok(())
            }
        }
    }

    /// Replaces a failed scorer and re-binds it into the paired session.
    async fn restart_scorer(
        &self,
        myself: &ActorRef<RelaySupervisorMsg>,
        session_key: &str,
        state: &mut RelaySupervisorState,
    ) -> Result<(), ActorProcessingErr> {
        let Some(info) = state.sessions.get(session_key).cloned() else {
            warn!(session = session_key, "session info missing during scorer restart");
            return Ok(());
        };

        info!(session = session_key, "restarting readability scorer");
        match Actor::spawn_linked(None, ReadabilityActor, (), myself.get_cell()).await {
            Ok((scorer, _)) => {
                let mut args = info.args.clone();
                args.readability = scorer.clone();
                let _ = info.actor_ref.cast(SessionMsg::ReadabilityRebound {
                    scorer: scorer.clone(),
                });
                state.sessions.insert(
                    session_key.to_string(),
                    SessionInfo {
                        actor_ref: info.actor_ref,
                        scorer,
                        args,
                    },
                );
                Ok(())
            }
            Err(e) => {
                error!(session = session_key, error = %e, "failed to restart scorer");
                self.drop_session(session_key, state);
                Ok(())
            }
        }
    }

    async fn restart_channel_worker(
        &self,
        myself: &ActorRef<RelaySupervisorMsg>,
        channel_id: &str,
        state: &mut RelaySupervisorState,
    ) -> Result<(), ActorProcessingErr> {
        let Some(info) = state.channel_workers.get(channel_id).cloned() else {
            warn!(channel = channel_id, "channel worker info missing during restart");
            return Ok(());
        };

        info!(channel = channel_id, "restarting channel profile worker");
        match Actor::spawn_linked(
            None,
            ChannelProfileActor,
            info.args.clone(),
            myself.get_cell(),
        )
        .await
        {
            Ok((new_ref, _)) => {
                state.channel_workers.insert(
                    channel_id.to_string(),
                    ChannelWorkerInfo {
                        actor_ref: new_ref,
                        args: info.args,
                    },
                );
                Ok(())
            }
            Err(e) => {
                error!(channel = channel_id, error = %e, "failed to restart channel worker");
                state.channel_workers.remove(channel_id);
                Ok(())
            }
        }
    }

    /// Invalidates a session's registry entry and stops whichever of the
    /// pair is still running.
    fn drop_session(&self, session_key: &str, state: &mut RelaySupervisorState) {
        if let Some(info) = state.sessions.remove(session_key) {
            info.actor_ref.stop(Some("session deregistered".to_string()));
            info.scorer.stop(Some("session deregistered".to_string()));
        }
        state
            .restart_counts
            .remove(&format!("session:{session_key}"));
        state
            .restart_counts
            .remove(&format!("scorer:{session_key}"));
    }
}

#[ractor::async_trait]
impl Actor for RelaySupervisor {
    type Msg = RelaySupervisorMsg;
    type State = RelaySupervisorState;
    type Arguments = RelaySupervisorArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(supervisor = %myself.get_id(), "relay supervisor starting");
        Ok(RelaySupervisorState {
            sessions: HashMap::new(),
            channel_workers: HashMap::new(),
            restart_counts: HashMap::new(),
            search: args.search,
            history: args.history,
            channel_videos_max: args.channel_videos_max,
        })
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        event: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        self.handle_supervision_event(myself, event, state).await
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            RelaySupervisorMsg::OpenSession {
                session_key,
                outbound,
                reply,
            } => {
                if let Some(info) = state.sessions.get(&session_key) {
                    debug!(session = %session_key, "reusing registered session worker");
                    let _ = reply.send(Ok(info.actor_ref.clone()));
                    return Ok(());
                }

                info!(session = %session_key, "creating session worker");
                let scorer =
                    match Actor::spawn_linked(None, ReadabilityActor, (), myself.get_cell()).await
                    {
                        Ok((scorer, _)) => scorer,
                        Err(e) => {
                            error!(session = %session_key, error = %e, "failed to spawn scorer");
                            let _ = reply.send(Err(e.to_string()));
                            return Ok(());
                        }
                    };

                let args = SessionArguments {
                    session_key: session_key.clone(),
                    outbound,
                    search: state.search.clone(),
                    history: state.history.clone(),
                    readability: scorer.clone(),
                };
                match Actor::spawn_linked(None, SessionActor, args.clone(), myself.get_cell())
                    .await
                {
                    Ok((actor_ref, _)) => {
                        state.sessions.insert(
                            session_key,
                            SessionInfo {
                                actor_ref: actor_ref.clone(),
                                scorer,
                                args,
                            },
                        );
                        let _ = reply.send(Ok(actor_ref));
                    }
                    Err(e) => {
                        error!(session = %session_key, error = %e, "failed to spawn session worker");
                        scorer.stop(Some("session spawn failed".to_string()));
                        let _ = reply.send(Err(e.to_string()));
                    }
                }
            }
            RelaySupervisorMsg::GetSession { session_key, reply } => {
                let _ = reply.send(
                    state
                        .sessions
                        .get(&session_key)
                        .map(|info| info.actor_ref.clone()),
                );
            }
            RelaySupervisorMsg::RemoveSession { session_key } => {
                info!(session = %session_key, "removing session worker");
                self.drop_session(&session_key, state);
            }
            RelaySupervisorMsg::FetchChannelProfile { channel_id, reply } => {
                let worker = match state.channel_workers.get(&channel_id) {
                    Some(info) => info.actor_ref.clone(),
                    None => {
                        info!(channel = %channel_id, "creating channel profile worker");
                        let args = ChannelProfileArguments {
                            channel_id: channel_id.clone(),
                            provider: state.search.provider(),
                            videos_max: state.channel_videos_max,
                        };
                        match Actor::spawn_linked(
                            None,
                            ChannelProfileActor,
                            args.clone(),
                            myself.get_cell(),
                        )
                        .await
                        {
                            Ok((actor_ref, _)) => {
                                state.channel_workers.insert(
                                    channel_id.clone(),
                                    ChannelWorkerInfo {
                                        actor_ref: actor_ref.clone(),
                                        args,
                                    },
                                );
                                actor_ref
                            }
                            Err(e) => {
                                // Dropping the reply port surfaces the
                                // creation fault to the caller as a failed
                                // call rather than a degraded profile.
                                error!(channel = %channel_id, error = %e, "failed to spawn channel worker");
                                return Ok(());
                            }
                        }
                    }
                };
                let _ = worker.cast(ChannelProfileMsg::Fetch { reply });
            }
            RelaySupervisorMsg::Supervision(event) => {
                self.handle_supervision_event(myself, event, state).await?;
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        info!(
            supervisor = %myself.get_id(),
            sessions = state.sessions.len(),
            channel_workers = state.channel_workers.len(),
            "relay supervisor stopping"
        );
        Ok(())
    }
}

/// Get or create the session worker for `session_key`, bounded at the
/// registry timeout.
pub async fn open_session(
    supervisor: &ActorRef<RelaySupervisorMsg>,
    session_key: impl Into<String>,
    outbound: mpsc::UnboundedSender<ClientFrame>,
) -> Result<ActorRef<SessionMsg>, String> {
    ractor::call_t!(
        supervisor,
        |reply| RelaySupervisorMsg::OpenSession {
            session_key: session_key.into(),
            outbound,
            reply,
        },
        REGISTRY_CALL_TIMEOUT_MS
    )
    .map_err(|e| e.to_string())?
}

pub async fn get_session(
    supervisor: &ActorRef<RelaySupervisorMsg>,
    session_key: impl Into<String>,
) -> Result<Option<ActorRef<SessionMsg>>, ractor::RactorErr<RelaySupervisorMsg>> {
    ractor::call_t!(
        supervisor,
        |reply| RelaySupervisorMsg::GetSession {
            session_key: session_key.into(),
            reply,
        },
        REGISTRY_CALL_TIMEOUT_MS
    )
}

pub fn remove_session(
    supervisor: &ActorRef<RelaySupervisorMsg>,
    session_key: impl Into<String>,
) -> Result<(), ractor::RactorErr<RelaySupervisorMsg>> {
    supervisor
        .cast(RelaySupervisorMsg::RemoveSession {
            session_key: session_key.into(),
        })
        .map_err(ractor::RactorErr::from)
}

/// Fetch a channel profile through the supervisor, bounded at the profile
/// round-trip timeout.
pub async fn fetch_channel_profile(
    supervisor: &ActorRef<RelaySupervisorMsg>,
    channel_id: impl Into<String>,
) -> Result<ChannelProfile, ractor::RactorErr<RelaySupervisorMsg>> {
    ractor::call_t!(
        supervisor,
        |reply| RelaySupervisorMsg::FetchChannelProfile {
            channel_id: channel_id.into(),
            reply,
        },
        CHANNEL_PROFILE_TIMEOUT_MS
    )
}
