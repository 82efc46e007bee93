//! Stateless readability scorer.
//!
//! Computes Flesch-Kincaid grade and reading-ease scores for a batch of
//! descriptions and casts the batch average back to the requesting session.
//! Faults never reach the caller as crashes; they come back as error
//! payloads addressed to the same reply target.

use ractor::{Actor, ActorProcessingErr, ActorRef};
use tracing::debug;

use crate::actors::session::SessionMsg;

#[derive(Debug, Default)]
pub struct ReadabilityActor;

#[derive(Debug)]
pub enum ReadabilityMsg {
    Score {
        descriptions: Vec<String>,
        reply_to: ActorRef<SessionMsg>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ReadabilityError {
    #[error("Missing description")]
    MissingDescriptions,
    #[error("no scoreable text")]
    Unscorable,
}

#[ractor::async_trait]
impl Actor for ReadabilityActor {
    type Msg = ReadabilityMsg;
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
            ReadabilityMsg::Score {
                descriptions,
                reply_to,
            } => {
                let reply = match batch_readability(&descriptions) {
                    Ok((fk_grade, reading_ease)) => {
                        debug!(fk_grade, reading_ease, "scored description batch");
                        SessionMsg::ReadabilityResult {
                            fk_grade,
                            reading_ease,
                        }
                    }
                    Err(e) => SessionMsg::AnalysisError {
                        error: format!("Error calculating readability: {e}"),
                    },
                };
                let _ = reply_to.cast(reply);
            }
        }
        Ok(())
    }
}

/// Average (grade, ease) over the scoreable descriptions in the batch.
pub fn batch_readability(descriptions: &[String]) -> Result<(f64, f64), ReadabilityError> {
    if descriptions.is_empty() {
        return Err(ReadabilityError::MissingDescriptions);
    }

    let scores: Vec<(f64, f64)> = descriptions
        .iter()
        .filter_map(|text| readability_scores(text))
        .collect();
    if scores.is_empty() {
        return Err(ReadabilityError::Unscorable);
    }

    let n = scores.len() as f64;
    let (grade_sum, ease_sum) = scores
        .iter()
        .fold((0.0, 0.0), |(g, e), (grade, ease)| (g + grade, e + ease));
    Ok((grade_sum / n, ease_sum / n))
}

/// Flesch-Kincaid grade and reading ease for one text, or `None` when the
/// text has no sentences or no words.
pub fn readability_scores(text: &str) -> Option<(f64, f64)> {
    let sentences = count_sentences(text);
    let words = count_words(text);
    if sentences == 0 || words == 0 {
        return None;
    }
    let syllables = count_syllables(text);

    let words_per_sentence = words as f64 / sentences as f64;
    let syllables_per_word = syllables as f64 / words as f64;

    let fk_grade = 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59;
    let reading_ease = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;
    Some((fk_grade, reading_ease))
}

/// Segments after splitting on sentence terminators, with trailing empty
/// segments dropped ("One. Two!" counts 2).
pub fn count_sentences(text: &str) -> usize {
    let mut segments: Vec<&str> = text.split(['.', '!', '?']).collect();
    while segments.last().is_some_and(|segment| segment.is_empty()) {
        segments.pop();
    }
    segments.len()
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn count_syllables(text: &str) -> usize {
    text.split_whitespace().map(count_syllables_in_word).sum()
}

/// Maximal runs of vowels (y included), minimum one per word.
pub fn count_syllables_in_word(word: &str) -> usize {
    let mut count = 0;
    let mut in_vowel_run = false;
    for c in word.to_lowercase().chars() {
        if "aeiouy".contains(c) {
            if !in_vowel_run {
                count += 1;
                in_vowel_run = true;
            }
        } else {
            in_vowel_run = false;
        }
    }
    count.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_sentences_on_terminators() {
        assert_eq!(count_sentences("This is a test. This is another sentence!"), 2);
        assert_eq!(count_sentences("This is a test."), 1);
        assert_eq!(count_sentences("No terminator at all"), 1);
        assert_eq!(count_sentences("One? Two. Three!"), 3);
    }

    #[test]
    fn counts_words_on_whitespace() {
        assert_eq!(count_words("This is a test sentence."), 5);
        assert_eq!(count_words("  spaced   out  "), 2);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn counts_syllables_by_vowel_runs() {
        assert_eq!(count_syllables("This is a test."), 4);
        assert_eq!(count_syllables_in_word("reading"), 2);
        assert_eq!(count_syllables_in_word("rthm"), 1);
        assert_eq!(count_syllables_in_word("syllables"), 3);
    }

    #[test]
    fn scores_match_the_formulas() {
        // 8 words, 2 sentences, 12 syllables.
        let (fk_grade, reading_ease) =
            readability_scores("This is a test. This is another sentence!").unwrap();
        let words_per_sentence = 8.0 / 2.0;
        let syllables_per_word = 12.0 / 8.0;
        let expected_grade = 0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59;
        let expected_ease = 206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word;
        assert!((fk_grade - expected_grade).abs() < 1e-9);
        assert!((reading_ease - expected_ease).abs() < 1e-9);
    }

    #[test]
    fn terminator_only_text_is_unscorable() {
        assert_eq!(readability_scores("..."), None);
        assert_eq!(readability_scores(""), None);
        assert_eq!(readability_scores("   "), None);
    }

    #[test]
    fn batch_average_skips_unscorable_descriptions() {
        let descriptions = vec![
            "This is a test. This is another sentence!".to_string(),
            "...".to_string(),
            "Reading is fun.".to_string(),
        ];
        let (grade, ease) = batch_readability(&descriptions).unwrap();

        let (g1, e1) = readability_scores(&descriptions[0]).unwrap();
        let (g2, e2) = readability_scores(&descriptions[2]).unwrap();
        assert!((grade - (g1 + g2) / 2.0).abs() < 1e-9);
        assert!((ease - (e1 + e2) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn empty_batch_is_a_missing_description() {
        let err = batch_readability(&[]).unwrap_err();
        assert!(matches!(err, ReadabilityError::MissingDescriptions));
    }

    #[test]
    fn all_unscorable_batch_is_an_error() {
        let err = batch_readability(&["!!!".to_string()]).unwrap_err();
        assert!(matches!(err, ReadabilityError::Unscorable));
    }
}
