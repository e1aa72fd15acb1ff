//! Errors raised while talking to the bot-orchestration service

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Service reported an error: {0}")]
    Service(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Json(err.to_string())
    }
}

/// Result type for service calls
pub type ApiResult<T> = std::result::Result<T, ApiError>;
