//! Flashcard endpoint
//!
//! One route, two actions:
//! - `generate`: propose a phrase in the learner's target language
//! - `validate`: judge the learner's English translation

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::flashcard::GeneratedPhrase;
use crate::state::AppState;

/// Create the flashcard router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(flashcard))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub user_translation: Option<String>,
    #[serde(default)]
    pub original_phrase: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FlashcardResponse {
    Phrase {
        supported: bool,
        phrase: String,
        language: String,
    },
    Unsupported {
        supported: bool,
        message: String,
    },
    Verdict {
        correct: bool,
        feedback: String,
    },
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

async fn flashcard(
    State(state): State<AppState>,
    Json(request): Json<FlashcardRequest>,
) -> Result<Json<FlashcardResponse>> {
    let action = non_blank(&request.action)
        .ok_or_else(|| AppError::BadRequest("Action is required".to_string()))?;

    match action {
        "generate" => {
            let language = non_blank(&request.language)
                .ok_or_else(|| AppError::BadRequest("Language is required".to_string()))?;

            let response = match state.flashcards().generate(language).await? {
                GeneratedPhrase::Phrase(phrase) => FlashcardResponse::Phrase {
                    supported: true,
                    phrase,
                    language: language.to_string(),
                },
                GeneratedPhrase::Unsupported { message } => FlashcardResponse::Unsupported {
                    supported: false,
                    message,
                },
            };
            Ok(Json(response))
        }
        "validate" => {
            let (Some(language), Some(original), Some(attempt)) = (
                non_blank(&request.language),
                non_blank(&request.original_phrase),
                non_blank(&request.user_translation),
            ) else {
                return Err(AppError::BadRequest(
                    "Missing required fields for validation".to_string(),
                ));
            };

            let verdict = state
                .flashcards()
                .validate(language, original, attempt)
                .await?;
            Ok(Json(FlashcardResponse::Verdict {
                correct: verdict.correct,
                feedback: verdict.feedback,
            }))
        }
        _ => Err(AppError::BadRequest("Invalid action".to_string())),
    }
}
