//! Conversion service transport
//!
//! The HTTP side of a conversion job sits behind [`JobTransport`] so the
//! polling logic can be driven without a network.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use super::types::{ContentFormat, ConversionOptions, Credentials, JobHandle};

/// Raw reply from the conversion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReply {
    pub status: u16,
    pub body: String,
}

impl ServiceReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The request never produced a response (connect, TLS, timeout, ...)
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(pub String);

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self(err.to_string())
    }
}

/// Submission, status and content endpoints of an asynchronous conversion service
#[async_trait]
pub trait JobTransport: Send + Sync {
    /// Submit a document for conversion
    async fn submit(
        &self,
        credentials: &Credentials,
        document: &[u8],
        options: &ConversionOptions,
    ) -> Result<ServiceReply, TransportError>;

    /// Fetch the current status of a job
    async fn status(
        &self,
        credentials: &Credentials,
        handle: &JobHandle,
    ) -> Result<ServiceReply, TransportError>;

    /// Fetch the converted content of a job
    async fn content(
        &self,
        credentials: &Credentials,
        handle: &JobHandle,
        format: ContentFormat,
    ) -> Result<ServiceReply, TransportError>;
}

/// Mathpix PDF API transport
pub struct MathpixTransport {
    client: Client,
    base_url: String,
}

impl MathpixTransport {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn into_reply(response: reqwest::Response) -> Result<ServiceReply, TransportError> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(ServiceReply { status, body })
    }
}

#[async_trait]
impl JobTransport for MathpixTransport {
    async fn submit(
        &self,
        credentials: &Credentials,
        document: &[u8],
        options: &ConversionOptions,
    ) -> Result<ServiceReply, TransportError> {
        let options_json = serde_json::to_string(options)
            .map_err(|e| TransportError(format!("Failed to encode options: {}", e)))?;

        let file = Part::bytes(document.to_vec())
            .file_name("document.pdf")
            .mime_str("application/pdf")?;

        let form = Form::new()
            .part("file", file)
            .text("options_json", options_json);

        let url = format!("{}/v3/pdf", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("app_id", credentials.app_id())
            .header("app_key", credentials.app_key())
            .multipart(form)
            .send()
            .await?;

        Self::into_reply(response).await
    }

    async fn status(
        &self,
        credentials: &Credentials,
        handle: &JobHandle,
    ) -> Result<ServiceReply, TransportError> {
        let url = format!("{}/v3/pdf/{}", self.base_url, handle);
        let response = self
            .client
            .get(&url)
            .header("app_id", credentials.app_id())
            .header("app_key", credentials.app_key())
            .send()
            .await?;

        Self::into_reply(response).await
    }

    async fn content(
        &self,
        credentials: &Credentials,
        handle: &JobHandle,
        format: ContentFormat,
    ) -> Result<ServiceReply, TransportError> {
        let url = format!("{}/v3/pdf/{}.{}", self.base_url, handle, format.extension());
        let response = self
            .client
            .get(&url)
            .header("app_id", credentials.app_id())
            .header("app_key", credentials.app_key())
            .send()
            .await?;

        Self::into_reply(response).await
    }
}
