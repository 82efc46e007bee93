//! Per-channel profile fetch orchestrator.
//!
//! Joins the channel-metadata and channel-videos calls concurrently and
//! replies with a combined result. Any fault or unusable payload on either
//! side degrades the whole response: both halves come back null, never a
//! half-filled profile.

use std::sync::Arc;

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use serde_json::Value;
use shared_types::ChannelProfile;
use tracing::{info, warn};

use crate::search::SearchProvider;

#[derive(Debug, Default)]
pub struct ChannelProfileActor;

#[derive(Clone)]
pub struct ChannelProfileArguments {
    pub channel_id: String,
    pub provider: Arc<dyn SearchProvider>,
    pub videos_max: u32,
}

pub struct ChannelProfileState {
    channel_id: String,
    provider: Arc<dyn SearchProvider>,
    videos_max: u32,
}

#[derive(Debug)]
pub enum ChannelProfileMsg {
    /// The reply port belongs to the original requester, so forwarding
    /// through the supervisor stays transparent.
    Fetch { reply: RpcReplyPort<ChannelProfile> },
}

fn usable(payload: Value) -> Option<Value> {
    if payload.get("error").is_some() {
        return None;
    }
    Some(payload)
}

#[ractor::async_trait]
impl Actor for ChannelProfileActor {
    type Msg = ChannelProfileMsg;
    type State = ChannelProfileState;
    type Arguments = ChannelProfileArguments;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(channel = %args.channel_id, "channel profile worker starting");
        Ok(ChannelProfileState {
            channel_id: args.channel_id,
            provider: args.provider,
            videos_max: args.videos_max,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            ChannelProfileMsg::Fetch { reply } => {
                let (details, videos) = tokio::join!(
                    state.provider.channel_details(&state.channel_id),
                    state.provider.channel_videos(&state.channel_id, state.videos_max),
                );

                let profile = match (details, videos) {
                    (Ok(details), Ok(videos)) => {
                        match (usable(details), usable(videos)) {
                            (Some(profile), Some(videos)) => ChannelProfile {
                                channel_id: state.channel_id.clone(),
                                profile: Some(profile),
                                videos: Some(videos),
                            },
                            _ => ChannelProfile::empty(&state.channel_id),
                        }
                    }
                    (details, videos) => {
                        if let Err(e) = &details {
                            warn!(channel = %state.channel_id, error = %e, "channel details call failed");
                        }
                        if let Err(e) = &videos {
                            warn!(channel = %state.channel_id, error = %e, "channel videos call failed");
                        }
                        ChannelProfile::empty(&state.channel_id)
                    }
                };

                let _ = reply.send(profile);
            }
        }
        Ok(())
    }
}
