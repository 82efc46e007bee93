//! Per-session search orchestrator.
//!
//! One actor per client session. A search is recorded to the session
//! history, fetched through the cache-fronted search service in a spawned
//! task (the actor keeps processing while the upstream call is in flight),
//! then fanned out to the readability and sentiment workers. The batch
//! frame goes out immediately; analysis frames arrive whenever the workers
//! finish, with no ordering guarantee.

use std::collections::HashSet;

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SupervisionEvent};
use shared_types::{
    ClientFrame, ReadabilityScores, SearchBatch, Sentiment, SentimentVerdict, VideoItem,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::actors::readability::ReadabilityMsg;
use crate::actors::sentiment::{SentimentActor, SentimentMsg};
use crate::history::SearchHistory;
use crate::search::{SearchError, SearchService};

#[derive(Debug, Default)]
pub struct SessionActor;

#[derive(Clone)]
pub struct SessionArguments {
    pub session_key: String,
    pub outbound: mpsc::UnboundedSender<ClientFrame>,
    pub search: SearchService,
    pub history: SearchHistory,
    pub readability: ActorRef<ReadabilityMsg>,
}

pub struct SessionState {
    session_key: String,
    outbound: mpsc::UnboundedSender<ClientFrame>,
    search: SearchService,
    history: SearchHistory,
    readability: ActorRef<ReadabilityMsg>,
    sentiment: ActorRef<SentimentMsg>,
    /// Every video id this session has been shown. Informational only:
    /// the current batch is never filtered against it.
    seen_video_ids: HashSet<String>,
    /// True until the first successful search completes.
    first_search: bool,
}

#[derive(Debug)]
pub enum SessionMsg {
    Search {
        query: String,
    },
    SearchCompleted {
        query: String,
        result: Result<Vec<VideoItem>, SearchError>,
    },
    ReadabilityResult {
        fk_grade: f64,
        reading_ease: f64,
    },
    SentimentResult {
        sentiment: Sentiment,
    },
    AnalysisError {
        error: String,
    },
    /// A client payload the decode boundary did not recognize.
    Unsupported {
        kind: String,
    },
    /// The supervisor replaced this session's scorer after a failure.
    ReadabilityRebound {
        scorer: ActorRef<ReadabilityMsg>,
    },
    GetSeenVideoIds {
        reply: RpcReplyPort<Vec<String>>,
    },
}

fn emit(state: &SessionState, frame: ClientFrame) {
    if state.outbound.send(frame).is_err() {
        debug!(
            session = %state.session_key,
            "outbound channel closed; dropping frame"
        );
    }
}

#[ractor::async_trait]
impl Actor for SessionActor {
    type Msg = SessionMsg;
    type State = SessionState;
    type Arguments = SessionArguments;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(session = %args.session_key, "session starting");

        let (sentiment, _) = Actor::spawn_linked(None, SentimentActor, (), myself.get_cell())
            .await
            .map_err(ActorProcessingErr::from)?;

        Ok(SessionState {
            session_key: args.session_key,
            outbound: args.outbound,
            search: args.search,
            history: args.history,
            readability: args.readability,
            sentiment,
            seen_video_ids: HashSet::new(),
            first_search: true,
        })
    }

    async fn handle_supervisor_evt(
        &self,
        myself: ActorRef<Self::Msg>,
        event: SupervisionEvent,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if let SupervisionEvent::ActorFailed(cell, error) = &event {
            warn!(
                session = %state.session_key,
                failed_actor = %cell.get_id(),
                error = %error,
                "session child failed"
            );
            if cell.get_id() == state.sentiment.get_id() {
                let (sentiment, _) =
                    Actor::spawn_linked(None, SentimentActor, (), myself.get_cell())
                        .await
                        .map_err(ActorProcessingErr::from)?;
                state.sentiment = sentiment;
            }
        }
        Ok(())
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SessionMsg::Search { query } => {
                // Fire-and-forget history recording; failures never block
                // the search itself.
                state.history.record(&state.session_key, &query);
                info!(session = %state.session_key, query = %query, "search requested");

                let search = state.search.clone();
                let session = myself.clone();
                tokio::spawn(async move {
                    let result = search.fetch_videos(&query).await;
                    let _ = session.cast(SessionMsg::SearchCompleted { query, result });
                });
            }
            SessionMsg::SearchCompleted {
                query,
                result: Ok(items),
            } => {
                let descriptions: Vec<String> =
                    items.iter().map(|item| item.description.clone()).collect();

                let _ = state.readability.cast(ReadabilityMsg::Score {
                    descriptions: descriptions.clone(),
                    reply_to: myself.clone(),
                });
                let _ = state.sentiment.cast(SentimentMsg::Classify {
                    descriptions,
                    reply_to: myself.clone(),
                });

                for item in &items {
                    state.seen_video_ids.insert(item.id.clone());
                }

                emit(
                    state,
                    ClientFrame::SearchBatch(SearchBatch {
                        first_response: state.first_search,
                        query,
                        items,
                    }),
                );
                state.first_search = false;
            }
            SessionMsg::SearchCompleted {
                query,
                result: Err(e),
            } => {
                warn!(session = %state.session_key, query = %query, error = %e, "search failed");
                emit(state, ClientFrame::error(e.to_string()));
            }
            SessionMsg::ReadabilityResult {
                fk_grade,
                reading_ease,
            } => {
                emit(
                    state,
                    ClientFrame::Readability(ReadabilityScores {
                        fk_grade,
                        reading_ease,
                    }),
                );
            }
            SessionMsg::SentimentResult { sentiment } => {
                emit(
                    state,
                    ClientFrame::Sentiment(SentimentVerdict {
                        final_sentiment: sentiment,
                    }),
                );
            }
            SessionMsg::AnalysisError { error } => {
                emit(state, ClientFrame::error(error));
            }
            SessionMsg::Unsupported { kind } => {
                emit(state, ClientFrame::error(format!("Unhandled message: {kind}")));
            }
            SessionMsg::ReadabilityRebound { scorer } => {
                state.readability = scorer;
            }
            SessionMsg::GetSeenVideoIds { reply } => {
                let _ = reply.send(state.seen_video_ids.iter().cloned().collect());
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        info!(session = %state.session_key, "session stopping");
        Ok(())
    }
}
