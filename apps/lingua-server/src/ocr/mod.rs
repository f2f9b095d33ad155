//! OCR Module
//!
//! Text extraction from uploaded documents via an external OCR service.
//!
//! - PDFs go through an asynchronous conversion job: submit, poll with a
//!   bounded number of attempts, then fetch the converted text.
//! - Images use the synchronous text endpoint.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lingua_server::ocr::{AsyncJobClient, MathpixTransport, PdfConverter, PollPolicy};
//!
//! let transport = Arc::new(MathpixTransport::new(http_client, "https://api.mathpix.com"));
//! let converter = PdfConverter::new(AsyncJobClient::new(transport, PollPolicy::default()));
//!
//! let response = converter
//!     .convert(Some(app_id), Some(app_key), &pdf_bytes, &cancel)
//!     .await?;
//! ```

mod client;
mod image;
mod status;
mod transport;
mod types;

pub use client::{AsyncJobClient, CompletedJob, JobOutcome, PdfConverter};
pub use image::TextRecognizer;
pub use status::classify;
pub use transport::{JobTransport, MathpixTransport, ServiceReply, TransportError};
pub use types::{
    ContentFormat, ConversionOptions, Credentials, ImageOcrResponse, JobHandle, JobResult,
    JobStatus, OcrError, PdfOcrResponse, PollPolicy, SubmissionFailure,
};
