//! Speech-to-text endpoint

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};

use super::read_upload;
use crate::error::{AppError, Result};
use crate::speech::Transcript;
use crate::state::AppState;

/// Create the speech router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(speech_to_text))
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
}

async fn speech_to_text(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Transcript>> {
    let audio = read_upload(&mut multipart, &["audio"])
        .await?
        .ok_or_else(|| AppError::BadRequest("No audio file provided".to_string()))?;

    tracing::debug!(
        "Audio file: {} bytes, type: {:?}",
        audio.data.len(),
        audio.content_type
    );

    let transcript = state.speech().transcribe(&audio.data).await?;
    Ok(Json(transcript))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::routes::test_support::{body_json, multipart_request, offline_services};
    use crate::speech::SpeechToText;
    use crate::state::Services;
    use axum::http::{HeaderMap, StatusCode};
    use tower::ServiceExt;

    async fn fake_transcribe(headers: HeaderMap, mut multipart: Multipart) -> (StatusCode, String) {
        if headers.get("xi-api-key").is_none() {
            return (StatusCode::UNAUTHORIZED, "missing key".to_string());
        }
        let mut bytes = 0;
        while let Ok(Some(field)) = multipart.next_field().await {
            if field.name() == Some("file") {
                bytes = field.bytes().await.map(|b| b.len()).unwrap_or(0);
            }
        }
        let reply = serde_json::json!({ "text": format!("heard {} bytes", bytes) });
        (StatusCode::OK, reply.to_string())
    }

    async fn test_app() -> Router {
        let fake = Router::new().route("/v1/speech-to-text", post(fake_transcribe));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, fake).await.unwrap();
        });

        let services = Services {
            speech: SpeechToText::new(
                reqwest::Client::new(),
                &format!("http://{}", addr),
                Some("xi-test".to_string()),
            ),
            ..offline_services()
        };
        crate::routes::app(AppState::with_services(Config::default(), services))
    }

    #[tokio::test]
    async fn test_transcript_through_router() {
        let response = test_app()
            .await
            .oneshot(multipart_request(
                "/api/speech-to-text",
                "audio",
                "clip.webm",
                "audio/webm",
                b"0123456789",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "text": "heard 10 bytes" }));
    }

    #[tokio::test]
    async fn test_missing_audio_is_bad_request() {
        let response = test_app()
            .await
            .oneshot(multipart_request(
                "/api/speech-to-text",
                "file",
                "clip.webm",
                "audio/webm",
                b"0123456789",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "No audio file provided");
    }

    #[tokio::test]
    async fn test_unconfigured_key_is_server_error() {
        let app = crate::routes::app(AppState::with_services(
            Config::default(),
            offline_services(),
        ));

        let response = app
            .oneshot(multipart_request(
                "/api/speech-to-text",
                "audio",
                "clip.webm",
                "audio/webm",
                b"0123456789",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "ElevenLabs API key not configured");
    }
}
