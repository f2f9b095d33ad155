//! Error types for the Lingua server
//!
//! Every failure leaves the server as
//! `{ "success": false, "error": "...", "details": "..." }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::chat::ChatError;
use crate::flashcard::FlashcardError;
use crate::generation::GenerationError;
use crate::ocr::{OcrError, SubmissionFailure};
use crate::speech::SpeechError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    #[error("Flashcard error: {0}")]
    Flashcard(#[from] FlashcardError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            details,
        }
    }
}

/// Upstream status if it is a usable error status, else 500
fn upstream_or_internal(status: Option<u16>) -> StatusCode {
    status
        .and_then(|s| StatusCode::from_u16(s).ok())
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

impl AppError {
    fn parts(&self) -> (StatusCode, String, Option<String>) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::Ocr(e) => {
                tracing::error!("OCR error: {}", e);
                let message = match e {
                    OcrError::SubmissionFailed(SubmissionFailure::NoIdentifier { .. }) => {
                        "No PDF ID returned".to_string()
                    }
                    OcrError::SubmissionFailed(_) => "PDF submission failed".to_string(),
                    other => other.to_string(),
                };
                (upstream_or_internal(e.upstream_status()), message, e.details())
            }
            AppError::Speech(e) => {
                tracing::error!("Speech error: {}", e);
                let status = match e {
                    SpeechError::Upstream { status, .. } => upstream_or_internal(Some(*status)),
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string(), None)
            }
            AppError::Flashcard(e) => {
                tracing::error!("Flashcard error: {}", e);
                let message = match e {
                    FlashcardError::MalformedReply(msg) => msg.to_string(),
                    FlashcardError::Generation(GenerationError::NotConfigured) => e.to_string(),
                    FlashcardError::Generation(_) => {
                        "An error occurred while processing your request".to_string()
                    }
                };
                (StatusCode::INTERNAL_SERVER_ERROR, message, None)
            }
            AppError::Chat(ChatError::EmptyMessage) => {
                (StatusCode::BAD_REQUEST, ChatError::EmptyMessage.to_string(), None)
            }
            AppError::Chat(e) => {
                tracing::error!("Chat error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Sorry, I couldn't process your message. Let's try again!".to_string(),
                    None,
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.parts();
        // The chat client reads a bare `{ "error": ... }` body
        if matches!(self, AppError::Chat(_)) {
            return (status, Json(serde_json::json!({ "error": error }))).into_response();
        }
        (status, Json(ErrorResponse::new(error, details))).into_response()
    }
}
