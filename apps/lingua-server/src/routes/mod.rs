//! Route modules for Lingua Server

use axum::{extract::Multipart, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};
use crate::state::AppState;

pub mod chat;
pub mod flashcard;
pub mod health;
pub mod ocr;
pub mod speech;

/// Build the full application router
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/ocr", ocr::router())
        .nest("/api/speech-to-text", speech::router())
        .nest("/api/flashcard", flashcard::router())
        .nest("/api/gemini-ai-model", chat::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// A file pulled out of a multipart form
pub(crate) struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// Read the first multipart field whose name is in `names`
pub(crate) async fn read_upload(
    multipart: &mut Multipart,
    names: &[&str],
) -> Result<Option<Upload>> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        AppError::BadRequest("Failed to read upload".to_string())
    })? {
        let name = field.name().unwrap_or("").to_string();
        if !names.contains(&name.as_str()) {
            continue;
        }

        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await.map_err(|e| {
            tracing::error!("Failed to read file data: {}", e);
            AppError::BadRequest("Failed to read file data".to_string())
        })?;

        tracing::debug!(
            "Received field '{}': filename={:?}, content_type={:?}, {} bytes",
            name,
            file_name,
            content_type,
            data.len()
        );

        return Ok(Some(Upload {
            file_name,
            content_type,
            data: data.to_vec(),
        }));
    }

    Ok(None)
}
