//! Conversation practice endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::chat::ChatTurn;
use crate::error::Result;
use crate::state::AppState;

/// Create the chat router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(chat))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub target_language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub summary: String,
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let summary = state
        .chat()
        .reply(
            &request.text,
            &request.history,
            request.target_language.as_deref(),
        )
        .await?;

    Ok(Json(ChatResponse { summary }))
}
