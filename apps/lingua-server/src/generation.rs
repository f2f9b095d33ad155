//! Text generation backends
//!
//! Flashcards and chat both talk to a language model through
//! [`TextGenerator`]. The production backend is Gemini's `generateContent`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

/// Generation error types
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Gemini API key not configured")]
    NotConfigured,

    #[error("Text generation failed: {0}")]
    Failed(String),
}

/// Text generation provider trait
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a reply for a single prompt
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Generate a reply under a standing system instruction
    ///
    /// Backends without a separate instruction channel get it prepended to
    /// the prompt.
    async fn generate_with_instruction(
        &self,
        instruction: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        self.generate(&format!("{}\n\n{}", instruction, prompt))
            .await
    }
}

/// Google Gemini `generateContent` backend
pub struct GeminiGenerator {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiGenerator {
    pub fn new(client: Client, base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    async fn request(&self, request: &Value) -> Result<String, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::NotConfigured)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(request)
            .send()
            .await
            .map_err(|e| GenerationError::Failed(format!("Failed to call Gemini: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GenerationError::Failed(format!("Failed to read Gemini response: {}", e))
        })?;

        if !status.is_success() {
            tracing::error!("Gemini returned {}: {}", status, body);
            return Err(GenerationError::Failed(format!(
                "Gemini returned {}",
                status
            )));
        }

        reply_text(&body)
    }
}

#[derive(Debug, Deserialize)]
struct GenerateReply {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(default)]
    text: String,
}

/// Concatenate the text parts of the first candidate
fn reply_text(body: &str) -> Result<String, GenerationError> {
    let reply: GenerateReply = serde_json::from_str(body)
        .map_err(|e| GenerationError::Failed(format!("Failed to parse response: {}", e)))?;

    let text: String = reply
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::Failed(
            "Model returned no text".to_string(),
        ));
    }

    Ok(text)
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let request = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        self.request(&request).await
    }

    async fn generate_with_instruction(
        &self,
        instruction: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let request = serde_json::json!({
            "systemInstruction": { "parts": [{ "text": instruction }] },
            "contents": [{ "parts": [{ "text": prompt }] }]
        });
        self.request(&request).await
    }
}
