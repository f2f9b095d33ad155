//! Single-image text recognition
//!
//! Images are small enough for the service's synchronous text endpoint, so
//! there is no job to track here.

use base64::Engine;
use reqwest::Client;
use serde::Deserialize;

use super::types::{Credentials, ImageOcrResponse, OcrError};

/// Fields we read back from the text endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextReply {
    text: Option<String>,
    html: Option<String>,
    confidence: Option<f64>,
}

/// Recognizes text and math in a single image
pub struct TextRecognizer {
    client: Client,
    base_url: String,
}

impl TextRecognizer {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Perform OCR on an image
    #[tracing::instrument(skip(self, credentials, image_data), fields(bytes = image_data.len()))]
    pub async fn recognize(
        &self,
        credentials: &Credentials,
        image_data: &[u8],
        mime_type: &str,
    ) -> Result<ImageOcrResponse, OcrError> {
        let url = format!("{}/v3/text", self.base_url);
        let request = build_request(image_data, mime_type);

        let response = self
            .client
            .post(&url)
            .header("app_id", credentials.app_id())
            .header("app_key", credentials.app_key())
            .json(&request)
            .send()
            .await
            .map_err(|e| OcrError::RecognitionFailed {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OcrError::RecognitionFailed {
                status: Some(status.as_u16()),
                body: format!("Failed to read response: {}", e),
            })?;

        if !status.is_success() {
            tracing::error!("Image OCR returned {}: {}", status, body);
            return Err(OcrError::RecognitionFailed {
                status: Some(status.as_u16()),
                body,
            });
        }

        parse_reply(&body)
    }
}

fn build_request(image_data: &[u8], mime_type: &str) -> serde_json::Value {
    let image_base64 = base64::engine::general_purpose::STANDARD.encode(image_data);

    serde_json::json!({
        "src": format!("data:{};base64,{}", mime_type, image_base64),
        "formats": ["text", "html"],
        "ocr": ["math", "text"],
    })
}

fn parse_reply(body: &str) -> Result<ImageOcrResponse, OcrError> {
    let reply: TextReply =
        serde_json::from_str(body).map_err(|e| OcrError::RecognitionFailed {
            status: None,
            body: format!("Failed to parse response: {}", e),
        })?;

    Ok(ImageOcrResponse {
        success: true,
        text: reply.text.unwrap_or_default(),
        html: reply.html.unwrap_or_default(),
        confidence: reply.confidence.unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
        headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
    }

    /// Reports back what it received, or 401 for unknown credentials
    async fn fake_text(
        headers: HeaderMap,
        Json(request): Json<serde_json::Value>,
    ) -> (StatusCode, String) {
        if header(&headers, "app_id") != "test-id" || header(&headers, "app_key") != "test-key" {
            return (StatusCode::UNAUTHORIZED, "invalid app_key".to_string());
        }

        let reply = serde_json::json!({
            "text": request["src"],
            "html": request["formats"].to_string(),
            "confidence": 0.5,
        });
        (StatusCode::OK, reply.to_string())
    }

    async fn spawn_fake_service() -> String {
        let app = Router::new().route("/v3/text", post(fake_text));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    /// Answers the first request with a body shorter than its Content-Length
    async fn spawn_truncating_service() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            // Drain the request so the client is not reset mid-send
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request);
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n{\"text\"")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn credentials(app_key: &str) -> Credentials {
        Credentials::new(Some("test-id"), Some(app_key)).unwrap()
    }

    #[tokio::test]
    async fn test_recognize_sends_credentials_and_data_url() {
        let recognizer = TextRecognizer::new(Client::new(), &spawn_fake_service().await);

        let reply = recognizer
            .recognize(&credentials("test-key"), b"abc", "image/png")
            .await
            .unwrap();

        assert!(reply.success);
        assert_eq!(reply.text, "data:image/png;base64,YWJj");
        assert_eq!(reply.html, r#"["text","html"]"#);
        assert_eq!(reply.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_recognize_rejection_carries_status_and_body() {
        let recognizer = TextRecognizer::new(Client::new(), &spawn_fake_service().await);

        let result = recognizer
            .recognize(&credentials("wrong-key"), b"abc", "image/png")
            .await;

        match result {
            Err(OcrError::RecognitionFailed { status, body }) => {
                assert_eq!(status, Some(401));
                assert_eq!(body, "invalid app_key");
            }
            other => panic!("expected recognition failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_truncated_body_is_reported() {
        let recognizer = TextRecognizer::new(Client::new(), &spawn_truncating_service().await);

        let result = recognizer
            .recognize(&credentials("test-key"), b"abc", "image/png")
            .await;

        match result {
            Err(OcrError::RecognitionFailed { status, body }) => {
                assert_eq!(status, Some(200));
                assert!(body.starts_with("Failed to read response"), "{}", body);
            }
            other => panic!("expected recognition failure, got {:?}", other),
        }
    }

    #[test]
    fn test_request_embeds_data_url() {
        let request = build_request(b"abc", "image/png");

        assert_eq!(request["src"], "data:image/png;base64,YWJj");
        assert_eq!(request["formats"], serde_json::json!(["text", "html"]));
        assert_eq!(request["ocr"], serde_json::json!(["math", "text"]));
    }

    #[test]
    fn test_parse_full_reply() {
        let reply = parse_reply(r#"{"text":"x^2","html":"<p>x</p>","confidence":0.87}"#).unwrap();

        assert!(reply.success);
        assert_eq!(reply.text, "x^2");
        assert_eq!(reply.html, "<p>x</p>");
        assert!((reply.confidence - 0.87).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_sparse_reply_defaults() {
        let reply = parse_reply(r#"{"request_id":"r1"}"#).unwrap();

        assert_eq!(reply.text, "");
        assert_eq!(reply.html, "");
        assert_eq!(reply.confidence, 0.0);
    }

    #[test]
    fn test_parse_garbage_reply() {
        assert!(matches!(
            parse_reply("<html>"),
            Err(OcrError::RecognitionFailed { status: None, .. })
        ));
    }
}
