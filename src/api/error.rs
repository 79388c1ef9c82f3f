//! REST error types

use thiserror::Error;

use crate::models::MappingError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server responded {code}: {message}")]
    Status { code: u16, message: String },

    /// 422: the listed properties were rejected
    #[error("validation failed: {}", messages.join(", "))]
    Validation { messages: Vec<String>, properties: Vec<String> },

    #[error("session is no longer valid, please log in again")]
    SessionInvalid,

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("request timed out")]
    Timeout,
}

impl ApiError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ApiError::SessionInvalid)
    }

    /// Property names an editor should mark as invalid
    pub fn invalid_properties(&self) -> &[String] {
        match self {
            ApiError::Validation { properties, .. } => properties,
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_decode() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl From<MappingError> for ApiError {
    fn from(e: MappingError) -> Self {
        ApiError::Decode(e.to_string())
    }
}
