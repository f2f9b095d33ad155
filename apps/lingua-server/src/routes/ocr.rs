//! OCR API endpoints
//!
//! - `POST /api/ocr/pdf`: convert an uploaded PDF through an async job
//! - `POST /api/ocr/image`: recognize text in an uploaded image

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
    Json, Router,
};

use super::read_upload;
use crate::error::{AppError, Result};
use crate::ocr::{Credentials, ImageOcrResponse, PdfOcrResponse};
use crate::state::AppState;

/// Create the OCR router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pdf", post(pdf_ocr))
        .route("/image", post(image_ocr))
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
}

/// Convert an uploaded PDF to text
async fn pdf_ocr(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PdfOcrResponse>> {
    let upload = read_upload(&mut multipart, &["file"])
        .await?
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    tracing::info!(
        "Converting PDF {:?} ({} bytes)",
        upload.file_name,
        upload.data.len()
    );

    let ocr = &state.config().ocr;
    let response = state
        .pdf_converter()
        .convert(
            ocr.app_id.as_deref(),
            ocr.app_key.as_deref(),
            &upload.data,
            state.shutdown_token(),
        )
        .await?;

    Ok(Json(response))
}

/// Recognize text in an uploaded image
async fn image_ocr(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ImageOcrResponse>> {
    let upload = read_upload(&mut multipart, &["file"])
        .await?
        .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;

    let ocr = &state.config().ocr;
    let credentials = Credentials::new(ocr.app_id.as_deref(), ocr.app_key.as_deref())?;
    let mime_type = upload.content_type.as_deref().unwrap_or("image/png");

    let response = state
        .text_recognizer()
        .recognize(&credentials, &upload.data, mime_type)
        .await?;

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ocr::{
        ContentFormat, ConversionOptions, JobHandle, JobTransport, PollPolicy, ServiceReply,
        TextRecognizer, TransportError,
    };
    use crate::routes::test_support::{body_json, multipart_request, offline_services};
    use crate::state::Services;
    use async_trait::async_trait;
    use axum::http::{HeaderMap, StatusCode};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Completes on the second poll
    #[derive(Default)]
    struct TwoPollTransport {
        submits: AtomicU32,
        polls: AtomicU32,
    }

    #[async_trait]
    impl JobTransport for TwoPollTransport {
        async fn submit(
            &self,
            _credentials: &Credentials,
            _document: &[u8],
            _options: &ConversionOptions,
        ) -> std::result::Result<ServiceReply, TransportError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            Ok(ServiceReply::new(200, r#"{"id":"route_job"}"#))
        }

        async fn status(
            &self,
            _credentials: &Credentials,
            _handle: &JobHandle,
        ) -> std::result::Result<ServiceReply, TransportError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            let status = if n == 0 { "processing" } else { "completed" };
            Ok(ServiceReply::new(
                200,
                format!(r#"{{"status":"{}","num_pages":1}}"#, status),
            ))
        }

        async fn content(
            &self,
            _credentials: &Credentials,
            _handle: &JobHandle,
            _format: ContentFormat,
        ) -> std::result::Result<ServiceReply, TransportError> {
            Ok(ServiceReply::new(200, "Guten Tag"))
        }
    }

    fn test_app(transport: Arc<TwoPollTransport>, with_credentials: bool) -> Router {
        let services = Services {
            pdf_transport: transport,
            ..offline_services()
        };
        app_with(services, with_credentials)
    }

    fn app_with(services: Services, with_credentials: bool) -> Router {
        let mut config = Config::default();
        config.ocr.poll = PollPolicy {
            max_attempts: 5,
            delay: Duration::ZERO,
        };
        if with_credentials {
            config.ocr.app_id = Some("id".to_string());
            config.ocr.app_key = Some("key".to_string());
        }

        crate::routes::app(AppState::with_services(config, services))
    }

    #[tokio::test]
    async fn test_pdf_conversion_success_shape() {
        let transport = Arc::new(TwoPollTransport::default());
        let app = test_app(transport.clone(), true);

        let response = app
            .oneshot(multipart_request(
                "/api/ocr/pdf",
                "file",
                "lesson.pdf",
                "application/pdf",
                b"%PDF-1.4",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["text"], "Guten Tag");
        assert_eq!(body["jobId"], "route_job");
        assert_eq!(body["pageCount"], 1);
        assert_eq!(body["confidence"], 0.95);
        assert_eq!(transport.polls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_pdf_without_credentials_makes_no_requests() {
        let transport = Arc::new(TwoPollTransport::default());
        let app = test_app(transport.clone(), false);

        let response = app
            .oneshot(multipart_request(
                "/api/ocr/pdf",
                "file",
                "lesson.pdf",
                "application/pdf",
                b"%PDF-1.4",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Mathpix credentials not configured");
        assert_eq!(transport.submits.load(Ordering::SeqCst), 0);
        assert_eq!(transport.polls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pdf_without_file_is_bad_request() {
        let transport = Arc::new(TwoPollTransport::default());
        let app = test_app(transport.clone(), true);

        let response = app
            .oneshot(multipart_request(
                "/api/ocr/pdf",
                "attachment",
                "lesson.pdf",
                "application/pdf",
                b"%PDF-1.4",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "No file provided");
        assert_eq!(transport.submits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_image_without_credentials() {
        let app = test_app(Arc::new(TwoPollTransport::default()), false);

        let response = app
            .oneshot(multipart_request(
                "/api/ocr/image",
                "file",
                "page.png",
                "image/png",
                b"\x89PNG",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Mathpix credentials not configured");
    }

    /// Text endpoint that only accepts the test credentials
    async fn fake_text(
        headers: HeaderMap,
        Json(request): Json<serde_json::Value>,
    ) -> (StatusCode, String) {
        if headers.get("app_key").and_then(|v| v.to_str().ok()) != Some("key") {
            return (StatusCode::UNAUTHORIZED, r#"{"error":"Invalid credentials"}"#.to_string());
        }
        let src = request["src"].as_str().unwrap_or("");
        let text = if src.starts_with("data:image/jpeg;base64,") {
            "Guten Morgen"
        } else {
            "?"
        };
        (
            StatusCode::OK,
            serde_json::json!({ "text": text, "html": "<p>Guten Morgen</p>", "confidence": 0.9 })
                .to_string(),
        )
    }

    async fn image_app(app_key: &str) -> Router {
        let fake = Router::new().route("/v3/text", post(fake_text));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, fake).await.unwrap();
        });

        let services = Services {
            text_recognizer: TextRecognizer::new(
                reqwest::Client::new(),
                &format!("http://{}", addr),
            ),
            ..offline_services()
        };
        let mut config = Config::default();
        config.ocr.app_id = Some("id".to_string());
        config.ocr.app_key = Some(app_key.to_string());
        crate::routes::app(AppState::with_services(config, services))
    }

    #[tokio::test]
    async fn test_image_recognized_through_router() {
        let app = image_app("key").await;

        let response = app
            .oneshot(multipart_request(
                "/api/ocr/image",
                "file",
                "page.jpg",
                "image/jpeg",
                b"\xff\xd8\xff",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body,
            serde_json::json!({
                "success": true,
                "text": "Guten Morgen",
                "html": "<p>Guten Morgen</p>",
                "confidence": 0.9
            })
        );
    }

    #[tokio::test]
    async fn test_image_upstream_rejection_keeps_status() {
        let app = image_app("stale").await;

        let response = app
            .oneshot(multipart_request(
                "/api/ocr/image",
                "file",
                "page.png",
                "image/png",
                b"\x89PNG",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["details"], r#"{"error":"Invalid credentials"}"#);
    }
}
