//! Error types for scanning and chat operations.

use std::time::Duration;

/// Errors that can occur while talking to the hosted model or handling inputs.
#[derive(Debug, thiserror::Error)]
pub enum MedScanError {
    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Delay suggested by the server, if any.
        retry_after: Option<Duration>,
    },

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Response arrived but did not carry usable text.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Every model in the fallback chain failed.
    #[error("all {attempts} model attempts failed; last error: {last}")]
    ModelsExhausted {
        /// Number of model identifiers that were attempted.
        attempts: usize,
        /// Rendered message of the final failure.
        last: String,
    },

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 or unrecognized raster data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., reading an upload).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decoding or encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Result type alias for scanning and chat operations.
pub type Result<T> = std::result::Result<T, MedScanError>;

/// Reads a `Retry-After` seconds value from response headers.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Trims and bounds an error body so it stays printable in one terminal line.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    const MAX_CHARS: usize = 600;
    let trimmed = text.trim();
    if trimmed.chars().count() <= MAX_CHARS {
        trimmed.to_string()
    } else {
        let mut s: String = trimmed.chars().take(MAX_CHARS).collect();
        s.push_str("...");
        s
    }
}
