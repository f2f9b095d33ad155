//! OCR Types
//!
//! Defines the job, status and result types for document conversion jobs,
//! plus the error taxonomy shared by the PDF and image recognition paths.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Confidence reported for PDF conversions (the service reports none)
pub const PDF_CONFIDENCE: f64 = 0.95;

/// Default number of status polls before giving up
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// Default delay before each status poll
pub const DEFAULT_POLL_DELAY: Duration = Duration::from_millis(2000);

/// Opaque job identifier returned by the conversion service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Semantic job status derived from the service's free-text status field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Any status string we don't recognise; polling continues
    Unknown,
}

impl JobStatus {
    /// Terminal statuses stop the poll loop
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Bounded polling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Maximum number of status requests
    pub max_attempts: u32,
    /// Delay before each status request
    pub delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_POLL_DELAY,
        }
    }
}

/// Processing options sent alongside the document
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOptions {
    pub math_inline_delimiters: [String; 2],
    pub math_display_delimiters: [String; 2],
    pub rm_spaces: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            math_inline_delimiters: ["$".to_string(), "$".to_string()],
            math_display_delimiters: ["$$".to_string(), "$$".to_string()],
            rm_spaces: true,
        }
    }
}

/// Content format requested from the content endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentFormat {
    /// Mathpix Markdown
    #[default]
    Mmd,
    Tex,
    Html,
}

impl ContentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mmd => "mmd",
            Self::Tex => "tex",
            Self::Html => "html",
        }
    }
}

/// Validated service credentials
///
/// Construction fails when either token is missing, so holding a value
/// means the request can go out.
#[derive(Clone)]
pub struct Credentials {
    app_id: String,
    app_key: String,
}

impl Credentials {
    pub fn new(app_id: Option<&str>, app_key: Option<&str>) -> Result<Self, OcrError> {
        let app_id = app_id.map(str::trim).filter(|s| !s.is_empty());
        let app_key = app_key.map(str::trim).filter(|s| !s.is_empty());

        match (app_id, app_key) {
            (Some(app_id), Some(app_key)) => Ok(Self {
                app_id: app_id.to_string(),
                app_key: app_key.to_string(),
            }),
            _ => Err(OcrError::Configuration(
                "Mathpix credentials not configured".to_string(),
            )),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Short non-secret prefix for diagnostics
    pub fn redacted_id(&self) -> String {
        let prefix: String = self.app_id.chars().take(4).collect();
        format!("{}...", prefix)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("app_id", &self.redacted_id())
            .field("app_key", &"<redacted>")
            .finish()
    }
}

/// Final artifact of a completed job
#[derive(Debug, Clone)]
pub struct JobResult {
    pub handle: JobHandle,
    /// Extracted text content
    pub text: String,
    /// Page count from the last status response (0 if absent)
    pub page_count: u64,
}

/// Caller-facing success body for PDF conversion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfOcrResponse {
    pub success: bool,
    pub text: String,
    pub confidence: f64,
    pub job_id: String,
    pub page_count: u64,
}

impl From<JobResult> for PdfOcrResponse {
    fn from(result: JobResult) -> Self {
        Self {
            success: true,
            text: result.text,
            confidence: PDF_CONFIDENCE,
            job_id: result.handle.to_string(),
            page_count: result.page_count,
        }
    }
}

/// Caller-facing success body for image recognition
#[derive(Debug, Clone, Serialize)]
pub struct ImageOcrResponse {
    pub success: bool,
    pub text: String,
    pub html: String,
    pub confidence: f64,
}

/// Why a submission did not yield a job handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionFailure {
    /// The request never got a response
    Transport(String),
    /// The service answered with a non-success status
    Rejected { status: u16, body: String },
    /// The service answered 2xx but without an identifier field
    NoIdentifier { body: String },
}

impl fmt::Display for SubmissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "request failed: {}", e),
            Self::Rejected { status, .. } => write!(f, "service returned {}", status),
            Self::NoIdentifier { .. } => f.write_str("no identifier returned"),
        }
    }
}

/// OCR error types
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("{0}")]
    Configuration(String),

    #[error("PDF submission failed: {0}")]
    SubmissionFailed(SubmissionFailure),

    #[error("Polling failed on attempt {attempt}")]
    PollRequestFailed {
        attempt: u32,
        status: Option<u16>,
        body: String,
    },

    #[error("No status field in API response")]
    MalformedStatusResponse { body: String },

    #[error("PDF processing failed: {reason}")]
    JobFailed { handle: JobHandle, reason: String },

    #[error("PDF processing timeout after {attempts} attempts")]
    PollTimeout { attempts: u32 },

    #[error("PDF processing cancelled after {attempts} attempts")]
    Cancelled { attempts: u32 },

    #[error("Failed to fetch PDF content")]
    ResultFetchFailed { status: Option<u16>, body: String },

    #[error("OCR processing failed")]
    RecognitionFailed { status: Option<u16>, body: String },
}

impl OcrError {
    /// Upstream HTTP status, when the service supplied one
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::SubmissionFailed(SubmissionFailure::Rejected { status, .. }) => Some(*status),
            Self::ResultFetchFailed { status, .. } | Self::RecognitionFailed { status, .. } => {
                *status
            }
            _ => None,
        }
    }

    /// Diagnostic text (raw response body or status detail)
    pub fn details(&self) -> Option<String> {
        match self {
            Self::Configuration(_) => None,
            Self::SubmissionFailed(SubmissionFailure::Transport(e)) => Some(e.clone()),
            Self::SubmissionFailed(SubmissionFailure::Rejected { body, .. })
            | Self::SubmissionFailed(SubmissionFailure::NoIdentifier { body })
            | Self::PollRequestFailed { body, .. }
            | Self::MalformedStatusResponse { body }
            | Self::ResultFetchFailed { body, .. }
            | Self::RecognitionFailed { body, .. } => Some(body.clone()),
            Self::JobFailed { handle, reason } => Some(format!("job {}: {}", handle, reason)),
            Self::PollTimeout { .. } | Self::Cancelled { .. } => None,
        }
    }
}
