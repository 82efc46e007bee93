//! Stateless sentiment classifier.
//!
//! Classifies each description against fixed happy/sad vocabularies and
//! casts the aggregate verdict back to the requesting session. One run
//! never affects another.

use ractor::{Actor, ActorProcessingErr, ActorRef};
use shared_types::Sentiment;
use tracing::debug;

use crate::actors::session::SessionMsg;

#[derive(Debug, Default)]
pub struct SentimentActor;

#[derive(Debug)]
pub enum SentimentMsg {
    Classify {
        descriptions: Vec<String>,
        reply_to: ActorRef<SessionMsg>,
    },
}

const HAPPY_TERMS: &[&str] = &[
    "happy", "good", "joy", ":)", "😊", "love", "awesome", "fantastic", "great", "wonderful",
    "amazing", "cheerful", "delighted", "excited", "pleased", "blessed", "smile", "fun", "best",
    "fantabulous", "grateful", "victorious", "content", "elated", "positive", "optimistic",
    "thrilled", "bright", "sunny", "jolly", "merry", "peaceful", "euphoric", "hopeful", "blissful",
    "radiant", "overjoyed", "satisfied",
];

const SAD_TERMS: &[&str] = &[
    "sad", "bad", "angry", ":(", "☹️", "hate", "terrible", "awful", "depressed", "heartbroken",
    "mourn", "unhappy", "disappointed", "gloomy", "down", "sorrow", "grief", "misery", "angst",
    "pain", "regret", "distressed", "lost", "lonely", "blue", "melancholy", "despair", "downcast",
    "hopeless", "forlorn", "tragic", "hurt", "shattered", "anguish", "tears", "unfortunate",
    "dismal", "isolated", "cold", "disheartened", "empty", "sick",
];

/// Share of one polarity's terms required to label a single description.
const POLARITY_THRESHOLD: f64 = 0.7;

#[ractor::async_trait]
impl Actor for SentimentActor {
    type Msg = SentimentMsg;
    type State = ();
    type Arguments = ();

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        _args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        Ok(())
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        _state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            SentimentMsg::Classify {
                descriptions,
                reply_to,
            } => {
                let sentiment = overall_sentiment(&descriptions);
                debug!(count = descriptions.len(), verdict = sentiment.glyph(), "classified batch");
                let _ = reply_to.cast(SessionMsg::SentimentResult { sentiment });
            }
        }
        Ok(())
    }
}

fn count_terms(text: &str, terms: &[&str]) -> usize {
    terms.iter().filter(|term| text.contains(*term)).count()
}

/// Polarity of one description, or `None` when it carries no sentiment
/// terms at all (such descriptions are skipped entirely).
pub fn classify_description(text: &str) -> Option<Sentiment> {
    let lowered = text.to_lowercase();
    let happy = count_terms(&lowered, HAPPY_TERMS);
    let sad = count_terms(&lowered, SAD_TERMS);
    let total = happy + sad;
    if total == 0 {
        return None;
    }

    let happy_share = happy as f64 / total as f64;
    let sad_share = sad as f64 / total as f64;
    if happy_share > POLARITY_THRESHOLD {
        Some(Sentiment::Happy)
    } else if sad_share > POLARITY_THRESHOLD {
        Some(Sentiment::Sad)
    } else {
        Some(Sentiment::Neutral)
    }
}

/// Majority verdict across the batch, happy winning ties with sad and
/// either polarity winning ties with neutral.
pub fn overall_sentiment(descriptions: &[String]) -> Sentiment {
    let mut happy = 0usize;
    let mut sad = 0usize;
    let mut neutral = 0usize;

    for description in descriptions {
        match classify_description(description) {
            Some(Sentiment::Happy) => happy += 1,
            Some(Sentiment::Sad) => sad += 1,
            Some(Sentiment::Neutral) => neutral += 1,
            None => {}
        }
    }

    if happy >= sad && happy >= neutral {
        Sentiment::Happy
    } else if sad > happy && sad >= neutral {
        Sentiment::Sad
    } else {
        Sentiment::Neutral
    }
}
