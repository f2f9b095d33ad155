//! Status classification
//!
//! The conversion service is inconsistent about field names, so every lookup
//! goes through an ordered list of accepted keys checked in priority order.

use serde_json::Value;

use super::types::JobStatus;

/// Accepted identifier keys in a submission response
pub const ID_KEYS: &[&str] = &["pdf_id", "id"];

/// Accepted status keys in a status response
pub const STATUS_KEYS: &[&str] = &["status", "pdf_status", "conversion_status"];

/// Accepted error-detail keys in a failed status response
pub const ERROR_KEYS: &[&str] = &["error", "error_info", "message"];

/// Page count key in a status response
pub const PAGE_COUNT_KEY: &str = "num_pages";

/// Return the first present, non-empty value among `keys`.
///
/// Strings are returned as-is, numbers and other JSON values are rendered
/// compactly. Null, empty strings and missing keys are skipped.
pub fn first_field(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match body.get(*key)? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    })
}

/// Return the first non-empty string value among `keys`.
///
/// Any other JSON value counts as absent and the next key is tried.
pub fn first_text(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        body.get(*key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Raw status string from a status response
pub fn raw_status(body: &Value) -> Option<String> {
    first_text(body, STATUS_KEYS)
}

/// Classify a free-text status string (case-insensitive)
pub fn classify(status: &str) -> JobStatus {
    match status.to_ascii_lowercase().as_str() {
        "completed" | "success" => JobStatus::Completed,
        "error" | "failed" => JobStatus::Failed,
        "pending" | "received" => JobStatus::Pending,
        "processing" | "loaded" | "split" => JobStatus::Processing,
        _ => JobStatus::Unknown,
    }
}

/// Page count from a status response, defaulting to zero
pub fn page_count(body: &Value) -> u64 {
    body.get(PAGE_COUNT_KEY)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Error detail from a failed status response
pub fn error_detail(body: &Value) -> String {
    first_field(body, ERROR_KEYS).unwrap_or_else(|| "Unknown error".to_string())
}
