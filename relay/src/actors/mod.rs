pub mod channel_profile;
pub mod readability;
pub mod sentiment;
pub mod session;

pub use channel_profile::{ChannelProfileActor, ChannelProfileArguments, ChannelProfileMsg};
pub use readability::{ReadabilityActor, ReadabilityMsg};
pub use sentiment::{SentimentActor, SentimentMsg};
pub use session::{SessionActor, SessionArguments, SessionMsg};
