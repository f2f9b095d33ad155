//! Translation flashcards
//!
//! A language model proposes a short phrase in the learner's target language
//! and later judges the learner's English translation. Replies come back in a
//! line-tagged text format handled by [`parser`].

pub mod parser;
mod service;

pub use parser::{GeneratedPhrase, Verdict};
pub use service::FlashcardService;

use crate::generation::GenerationError;

/// Flashcard error types
#[derive(Debug, thiserror::Error)]
pub enum FlashcardError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("{0}")]
    MalformedReply(&'static str),
}
