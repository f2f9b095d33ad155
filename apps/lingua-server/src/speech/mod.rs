//! Speech-to-text proxy
//!
//! Forwards recorded audio to the ElevenLabs transcription API.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Transcription model requested from the service
pub const DEFAULT_MODEL: &str = "scribe_v1";

/// Speech error types
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("ElevenLabs API key not configured")]
    NotConfigured,

    #[error("ElevenLabs API error: {status} - {body}")]
    Upstream { status: u16, body: String },

    #[error("Speech request failed: {0}")]
    Request(String),
}

/// Transcript returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TranscriptionReply {
    text: Option<String>,
    transcript: Option<String>,
}

/// ElevenLabs speech-to-text client
pub struct SpeechToText {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl SpeechToText {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Transcribe a recorded clip
    #[tracing::instrument(skip(self, audio), fields(bytes = audio.len()))]
    pub async fn transcribe(&self, audio: &[u8]) -> Result<Transcript, SpeechError> {
        let api_key = self.api_key.as_deref().ok_or(SpeechError::NotConfigured)?;

        let file = Part::bytes(audio.to_vec())
            .file_name("audio.webm")
            .mime_str("audio/webm")
            .map_err(|e| SpeechError::Request(e.to_string()))?;
        let form = Form::new()
            .part("file", file)
            .text("model_id", self.model.clone());

        let url = format!("{}/v1/speech-to-text", self.base_url);
        tracing::debug!("Sending {} bytes to speech service", audio.len());

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| SpeechError::Request(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::error!("Speech service returned {}: {}", status, body);
            return Err(SpeechError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        parse_reply(&body)
    }
}

fn parse_reply(body: &str) -> Result<Transcript, SpeechError> {
    let reply: TranscriptionReply = serde_json::from_str(body)
        .map_err(|e| SpeechError::Request(format!("Failed to parse response: {}", e)))?;

    let text = reply
        .text
        .filter(|t| !t.is_empty())
        .or(reply.transcript)
        .unwrap_or_default();

    Ok(Transcript { text })
}
