//! Shared wire types for StreamLens.
//!
//! Everything the relay writes to (or reads from) a client socket lives
//! here, so the server and any front end agree on one schema.

use serde::{Deserialize, Serialize};

/// One upstream search result, immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub description: String,
    pub thumbnail_url: String,
}

/// Messages a client may send over the search socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    Search { query: String },
}

/// Frames the relay writes to the client socket.
///
/// Each frame keeps the flat JSON shape of the original protocol
/// (`{firstResponse, query, items}`, `{fkGrade, readingEase}`,
/// `{finalSentiment}`, `{error}`), so the enum serializes untagged.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClientFrame {
    SearchBatch(SearchBatch),
    Readability(ReadabilityScores),
    Sentiment(SentimentVerdict),
    Error(ErrorFrame),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBatch {
    pub first_response: bool,
    pub query: String,
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityScores {
    pub fk_grade: f64,
    pub reading_ease: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentVerdict {
    pub final_sentiment: Sentiment,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorFrame {
    pub error: String,
}

/// Aggregate sentiment of a result batch, rendered as the fixed glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Happy,
    Sad,
    Neutral,
}

impl Sentiment {
    pub fn glyph(&self) -> &'static str {
        match self {
            Sentiment::Happy => ":-)",
            Sentiment::Sad => ":-(",
            Sentiment::Neutral => ":-|",
        }
    }
}

impl Serialize for Sentiment {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.glyph())
    }
}

/// Combined channel lookup result. Both halves are populated together or
/// not at all: any partial failure degrades the whole response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelProfile {
    pub channel_id: String,
    pub profile: Option<serde_json::Value>,
    pub videos: Option<serde_json::Value>,
}

impl ChannelProfile {
    /// The degraded response used whenever either underlying call fails.
    pub fn empty(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            profile: None,
            videos: None,
        }
    }
}

impl ClientFrame {
    pub fn error(message: impl Into<String>) -> Self {
        ClientFrame::Error(ErrorFrame {
            error: message.into(),
        })
    }
}
