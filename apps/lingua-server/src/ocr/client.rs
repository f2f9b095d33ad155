//! Asynchronous conversion job client
//!
//! Drives one remote conversion job through submit -> poll -> fetch:
//!
//! ```text
//! Created -> Submitted -> {Pending <-> Processing} -> {Completed | Failed | TimedOut}
//! ```
//!
//! Only a [`CompletedJob`] can be passed to [`AsyncJobClient::fetch_result`],
//! and the only way to obtain one is a `Completed` classification from
//! [`AsyncJobClient::await_completion`].

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::status::{self, ID_KEYS};
use super::transport::JobTransport;
use super::types::{
    ContentFormat, ConversionOptions, Credentials, JobHandle, JobResult, JobStatus, OcrError,
    PdfOcrResponse, PollPolicy, SubmissionFailure,
};

/// A job the service reported as completed
#[derive(Debug, Clone)]
pub struct CompletedJob {
    handle: JobHandle,
    page_count: u64,
    attempts: u32,
}

impl CompletedJob {
    pub fn handle(&self) -> &JobHandle {
        &self.handle
    }

    /// Page count reported by the final status response
    pub fn page_count(&self) -> u64 {
        self.page_count
    }

    /// Number of status requests it took to reach completion
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

/// Terminal classification reached by the poll loop
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Completed(CompletedJob),
    Failed { handle: JobHandle, reason: String },
}

impl JobOutcome {
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Completed(_) => JobStatus::Completed,
            Self::Failed { .. } => JobStatus::Failed,
        }
    }
}

/// Client for one asynchronous conversion job
///
/// Holds no mutable state; independent jobs may run concurrently over a
/// shared transport.
#[derive(Clone)]
pub struct AsyncJobClient {
    transport: Arc<dyn JobTransport>,
    policy: PollPolicy,
    format: ContentFormat,
}

impl AsyncJobClient {
    pub fn new(transport: Arc<dyn JobTransport>, policy: PollPolicy) -> Self {
        Self {
            transport,
            policy,
            format: ContentFormat::default(),
        }
    }

    /// Request a different content format from the content endpoint
    pub fn with_format(mut self, format: ContentFormat) -> Self {
        self.format = format;
        self
    }

    /// Submit a document and return the service's job handle
    #[tracing::instrument(
        skip(self, credentials, document, options),
        fields(bytes = document.len())
    )]
    pub async fn submit(
        &self,
        credentials: &Credentials,
        document: &[u8],
        options: &ConversionOptions,
    ) -> Result<JobHandle, OcrError> {
        let reply = self
            .transport
            .submit(credentials, document, options)
            .await
            .map_err(|e| OcrError::SubmissionFailed(SubmissionFailure::Transport(e.to_string())))?;

        if !reply.is_success() {
            tracing::error!("PDF submission rejected with status {}", reply.status);
            return Err(OcrError::SubmissionFailed(SubmissionFailure::Rejected {
                status: reply.status,
                body: reply.body,
            }));
        }

        let id = serde_json::from_str::<Value>(&reply.body)
            .ok()
            .and_then(|body| status::first_field(&body, ID_KEYS));

        match id {
            Some(id) => {
                tracing::info!("PDF submitted as job {}", id);
                Ok(JobHandle::new(id))
            }
            None => {
                tracing::error!("PDF submission response carried no identifier");
                Err(OcrError::SubmissionFailed(SubmissionFailure::NoIdentifier {
                    body: reply.body,
                }))
            }
        }
    }

    /// Poll the job until it reaches a terminal status
    ///
    /// Each attempt waits `policy.delay` and then issues one status request.
    /// Cancellation is honoured before every attempt, including during the
    /// delay, so no poll fires after the token is cancelled.
    #[tracing::instrument(skip(self, credentials, cancel), fields(job_id = %handle))]
    pub async fn await_completion(
        &self,
        credentials: &Credentials,
        handle: &JobHandle,
        cancel: &CancellationToken,
    ) -> Result<JobOutcome, OcrError> {
        let max_attempts = self.policy.max_attempts;

        for attempt in 0..max_attempts {
            if cancel.is_cancelled() {
                return Err(OcrError::Cancelled { attempts: attempt });
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Polling cancelled after {} attempts", attempt);
                    return Err(OcrError::Cancelled { attempts: attempt });
                }
                _ = tokio::time::sleep(self.policy.delay) => {}
            }

            let number = attempt + 1;
            let reply = self
                .transport
                .status(credentials, handle)
                .await
                .map_err(|e| OcrError::PollRequestFailed {
                    attempt: number,
                    status: None,
                    body: e.to_string(),
                })?;

            if !reply.is_success() {
                tracing::error!(
                    "Polling failed (attempt {}/{}) with status {}",
                    number,
                    max_attempts,
                    reply.status
                );
                return Err(OcrError::PollRequestFailed {
                    attempt: number,
                    status: Some(reply.status),
                    body: reply.body,
                });
            }

            let body: Value = serde_json::from_str(&reply.body).map_err(|_| {
                OcrError::MalformedStatusResponse {
                    body: reply.body.clone(),
                }
            })?;

            let raw_status = status::raw_status(&body).ok_or_else(|| {
                tracing::error!("No status field found in response");
                OcrError::MalformedStatusResponse {
                    body: reply.body.clone(),
                }
            })?;

            let job_status = status::classify(&raw_status);
            tracing::debug!(
                "Polling attempt {}/{} - status '{}' ({:?})",
                number,
                max_attempts,
                raw_status,
                job_status
            );

            match job_status {
                JobStatus::Completed => {
                    tracing::info!("PDF processing completed after {} attempts", number);
                    return Ok(JobOutcome::Completed(CompletedJob {
                        handle: handle.clone(),
                        page_count: status::page_count(&body),
                        attempts: number,
                    }));
                }
                JobStatus::Failed => {
                    let reason = status::error_detail(&body);
                    tracing::warn!("PDF processing failed: {}", reason);
                    return Ok(JobOutcome::Failed {
                        handle: handle.clone(),
                        reason,
                    });
                }
                JobStatus::Pending | JobStatus::Processing | JobStatus::Unknown => continue,
            }
        }

        tracing::warn!("PDF processing timed out after {} attempts", max_attempts);
        Err(OcrError::PollTimeout {
            attempts: max_attempts,
        })
    }

    /// Fetch the converted content of a completed job
    #[tracing::instrument(skip(self, credentials, job), fields(job_id = %job.handle))]
    pub async fn fetch_result(
        &self,
        credentials: &Credentials,
        job: CompletedJob,
    ) -> Result<JobResult, OcrError> {
        let reply = self
            .transport
            .content(credentials, &job.handle, self.format)
            .await
            .map_err(|e| OcrError::ResultFetchFailed {
                status: None,
                body: e.to_string(),
            })?;

        if !reply.is_success() {
            tracing::error!("Failed to fetch PDF content: status {}", reply.status);
            return Err(OcrError::ResultFetchFailed {
                status: Some(reply.status),
                body: reply.body,
            });
        }

        tracing::debug!("Extracted text length: {}", reply.body.len());

        Ok(JobResult {
            handle: job.handle,
            text: reply.body,
            page_count: job.page_count,
        })
    }
}

/// Runs the full submit -> poll -> fetch workflow for a PDF
pub struct PdfConverter {
    client: AsyncJobClient,
    options: ConversionOptions,
}

impl PdfConverter {
    pub fn new(client: AsyncJobClient) -> Self {
        Self {
            client,
            options: ConversionOptions::default(),
        }
    }

    /// Convert a PDF into text
    ///
    /// Credentials are resolved before anything touches the network, so a
    /// missing token surfaces as [`OcrError::Configuration`] with no I/O.
    pub async fn convert(
        &self,
        app_id: Option<&str>,
        app_key: Option<&str>,
        document: &[u8],
        cancel: &CancellationToken,
    ) -> Result<PdfOcrResponse, OcrError> {
        let credentials = Credentials::new(app_id, app_key)?;
        tracing::debug!("Using OCR credentials {}", credentials.redacted_id());

        let handle = self
            .client
            .submit(&credentials, document, &self.options)
            .await?;

        match self
            .client
            .await_completion(&credentials, &handle, cancel)
            .await?
        {
            JobOutcome::Completed(job) => {
                let result = self.client.fetch_result(&credentials, job).await?;
                Ok(PdfOcrResponse::from(result))
            }
            JobOutcome::Failed { handle, reason } => Err(OcrError::JobFailed { handle, reason }),
        }
    }
}
