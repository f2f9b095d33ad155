//! Conversation practice
//!
//! A guarded conversation partner: off-topic requests get a fixed redirect
//! without reaching the model, only recent turns are sent as context, and
//! overlong replies are swapped for a short fallback.

use std::sync::{Arc, LazyLock};

use regex::RegexSet;
use serde::Deserialize;

use crate::generation::{GenerationError, TextGenerator};

/// Most recent turns included in the prompt
pub const MAX_HISTORY_TURNS: usize = 6;

/// Longest reply passed back to the learner, in characters
pub const MAX_REPLY_CHARS: usize = 500;

const DEFAULT_TARGET_LANGUAGE: &str = "the language of your choice";

const OVERLONG_FALLBACK: &str =
    "Let's keep our conversation simple and natural. What would you like to talk about?";

const SYSTEM_INSTRUCTION: &str = "\
You are a language practice conversation partner. Your ONLY purpose is to help \
users practice conversational skills in their target language.

Rules:
1. Keep responses SHORT (1-3 sentences) with simple to intermediate vocabulary.
2. Stay in character as a friendly conversation partner and ask follow-up questions.
3. Refuse anything that is not conversation practice (coding, math, essays, general \
knowledge) and redirect: \"I'm here only to help you practice conversational skills. \
Let's chat about everyday topics!\"
4. Suggest everyday topics: hobbies, daily routines, food, travel, weather, work, family.
5. Occasionally give gentle corrections when the user makes mistakes.
6. Respond in the target language. Only translate to English when the user asks.
7. If the user asks to switch languages, or starts speaking another one, acknowledge \
it and continue in the new language.";

/// Requests that are not conversation practice
static OFF_TOPIC: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)write.*code",
        r"(?i)solve.*equation",
        r"(?i)calculate",
        r"(?i)explain.*how.*works",
        r"(?i)create.*program",
        r"(?i)debug",
        r"(?i)function.*return",
        r"(?i)algorithm",
    ])
    .unwrap()
});

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

/// Who spoke a turn; anything other than `user` is the assistant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    #[serde(other)]
    Assistant,
}

/// One earlier turn of the conversation
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    #[serde(default)]
    pub content: String,
}

pub struct ChatService {
    generator: Arc<dyn TextGenerator>,
}

impl ChatService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Reply to `message` as a conversation partner in `target_language`
    #[tracing::instrument(skip(self, message, history), fields(turns = history.len()))]
    pub async fn reply(
        &self,
        message: &str,
        history: &[ChatTurn],
        target_language: Option<&str>,
    ) -> Result<String, ChatError> {
        if message.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let language = target_language
            .filter(|l| !l.trim().is_empty())
            .unwrap_or(DEFAULT_TARGET_LANGUAGE);

        if is_off_topic(message) {
            tracing::info!("Redirecting off-topic chat message");
            return Ok(redirect_reply(language));
        }

        let prompt = conversation_prompt(message, history, language);
        let reply = self
            .generator
            .generate_with_instruction(SYSTEM_INSTRUCTION, &prompt)
            .await?;

        if reply.chars().count() > MAX_REPLY_CHARS {
            tracing::warn!("Discarding overlong chat reply");
            return Ok(OVERLONG_FALLBACK.to_string());
        }

        Ok(reply)
    }
}

pub fn is_off_topic(message: &str) -> bool {
    OFF_TOPIC.is_match(message)
}

fn redirect_reply(language: &str) -> String {
    format!(
        "I'm here only to help you practice conversational skills in {}. Let's chat about \
         everyday topics like hobbies, food, travel, or daily life! What would you like to \
         talk about?",
        language
    )
}

fn conversation_prompt(message: &str, history: &[ChatTurn], language: &str) -> String {
    let mut prompt = format!(
        "Current target language: {}\n\n\
         IMPORTANT: Pay attention to any language switch requests in the user's message. \
         If they ask to switch languages or start speaking in a different language, \
         acknowledge it and continue in the new language.\n\n",
        language
    );

    if !history.is_empty() {
        prompt.push_str("Previous conversation:\n");
        let start = history.len().saturating_sub(MAX_HISTORY_TURNS);
        for turn in &history[start..] {
            let speaker = match turn.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            prompt.push_str(&format!("{}: {}\n", speaker, turn.content));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "User: {}\n\n\
         Respond as a friendly conversation partner. Keep it brief (1-3 sentences). If the \
         user is requesting a language switch, acknowledge it warmly and continue in the new \
         language. Otherwise, stay on topic about everyday conversational subjects suitable \
         for language practice.",
        message
    ));

    prompt
}
