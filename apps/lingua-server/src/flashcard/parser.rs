//! Tagged reply parsing
//!
//! The language model is asked to answer in a line-tagged format:
//!
//! ```text
//! PHRASE: Me encanta jugar al fútbol
//! NOT_SUPPORTED: Klingon is a fictional language
//! CORRECT: yes
//! FEEDBACK: Great job! That's a perfect translation.
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::FlashcardError;

const NOT_SUPPORTED_TAG: &str = "NOT_SUPPORTED:";

// Patterns are literals; compiling them cannot fail.
static PHRASE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"PHRASE:\s*(.+)").unwrap());
static CORRECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)CORRECT:\s*(yes|no)").unwrap());
static FEEDBACK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)FEEDBACK:\s*(.+)").unwrap());

/// Parsed reply to a phrase generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratedPhrase {
    Phrase(String),
    Unsupported { message: String },
}

/// Parsed reply to a translation check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub correct: bool,
    pub feedback: String,
}

fn capture<'a>(pattern: &Regex, text: &'a str) -> Option<&'a str> {
    pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
}

pub fn parse_generation(reply: &str) -> Result<GeneratedPhrase, FlashcardError> {
    let reply = reply.trim();

    if let Some(rest) = reply.strip_prefix(NOT_SUPPORTED_TAG) {
        let message = rest.trim();
        let message = if message.is_empty() {
            "This language is not supported".to_string()
        } else {
            message.to_string()
        };
        return Ok(GeneratedPhrase::Unsupported { message });
    }

    capture(&PHRASE, reply)
        .filter(|phrase| !phrase.is_empty())
        .map(|phrase| GeneratedPhrase::Phrase(phrase.to_string()))
        .ok_or(FlashcardError::MalformedReply(
            "Failed to generate phrase. Please try again.",
        ))
}

pub fn parse_verdict(reply: &str) -> Result<Verdict, FlashcardError> {
    const MALFORMED: FlashcardError =
        FlashcardError::MalformedReply("Failed to validate translation. Please try again.");

    let reply = reply.trim();
    let correct = capture(&CORRECT, reply)
        .map(|answer| answer.eq_ignore_ascii_case("yes"))
        .ok_or(MALFORMED)?;
    let feedback = capture(&FEEDBACK, reply).ok_or(MALFORMED)?;

    Ok(Verdict {
        correct,
        feedback: feedback.to_string(),
    })
}
