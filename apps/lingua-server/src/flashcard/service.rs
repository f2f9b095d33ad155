//! Flashcard service
//!
//! Generates practice phrases and checks the learner's translations.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use rand::Rng;

use super::parser::{self, GeneratedPhrase, Verdict};
use super::FlashcardError;
use crate::generation::TextGenerator;

/// Conversation topics rotated through for variety
pub const TOPICS: &[&str] = &[
    "introducing yourself",
    "ordering food at a restaurant",
    "asking for directions",
    "talking about the weather",
    "discussing hobbies like sports, music, or reading",
    "making weekend plans with friends",
    "shopping for clothes or groceries",
    "talking about family members",
    "expressing feelings or emotions",
    "discussing work or school",
    "talking about traveling or vacation",
    "commenting on daily routines",
    "asking about preferences",
    "talking about time or schedules",
    "expressing opinions about movies or books",
];

pub struct FlashcardService {
    generator: Arc<dyn TextGenerator>,
}

impl FlashcardService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Generate one beginner phrase in `language`
    #[tracing::instrument(skip(self))]
    pub async fn generate(&self, language: &str) -> Result<GeneratedPhrase, FlashcardError> {
        let (topic, request_id) = pick_topic();
        tracing::debug!("Generating {} phrase about '{}'", language, topic);

        let prompt = generation_prompt(language, topic, request_id);
        let reply = self.generator.generate(&prompt).await?;
        parser::parse_generation(&reply)
    }

    /// Check a learner's English translation of `original`
    #[tracing::instrument(skip(self, original, attempt))]
    pub async fn validate(
        &self,
        language: &str,
        original: &str,
        attempt: &str,
    ) -> Result<Verdict, FlashcardError> {
        let prompt = validation_prompt(language, original, attempt);
        let reply = self.generator.generate(&prompt).await?;
        parser::parse_verdict(&reply)
    }
}

fn pick_topic() -> (&'static str, u32) {
    let mut rng = rand::rng();
    let topic = TOPICS.choose(&mut rng).copied().unwrap_or(TOPICS[0]);
    (topic, rng.random())
}

fn generation_prompt(language: &str, topic: &str, request_id: u32) -> String {
    format!(
        "You are a language learning assistant. The user wants to practice translating \
         phrases from {language} to English.\n\n\
         Request ID: {request_id:08x}\n\
         Topic focus: {topic}\n\n\
         If you cannot support this language, respond with:\n\
         NOT_SUPPORTED: [brief explanation]\n\n\
         Otherwise generate ONE common, beginner-level phrase in {language} of 3-10 words \
         about \"{topic}\". Respond in this exact format:\n\
         PHRASE: [the phrase in {language}]"
    )
}

fn validation_prompt(language: &str, original: &str, attempt: &str) -> String {
    format!(
        "You are a language learning assistant. A user is practicing translating from \
         {language} to English.\n\n\
         Original phrase in {language}: \"{original}\"\n\
         User's translation attempt: \"{attempt}\"\n\n\
         Accept exact translations, reasonable interpretations and minor grammatical \
         variations; reject wrong meanings. Respond in this exact format:\n\
         CORRECT: yes/no\n\
         FEEDBACK: [1-2 sentences; if incorrect, give the correct translation]"
    )
}
