//! Typed API errors
//!
//! The fetcher has to tell "this endpoint has nothing for you" apart from
//! every other failure, so the HTTP layer returns [`ApiError`] instead of a
//! bare `anyhow::Error`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 404 from the API
    #[error("resource not found: {path}")]
    NotFound { path: String },

    /// Any other non-success HTTP status
    #[error("API request failed: {status}")]
    Status { status: StatusCode, message: String },

    /// HTTP 200 with `"success": false` in the envelope
    #[error("API reported failure: {0}")]
    Rejected(String),

    #[error("failed to send request: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status code, when the failure carried one
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}
