//! Caller-facing failures.
//!
//! Each variant is terminal for its request and is rendered as a JSON
//! envelope with an `error` field plus context. Nothing is retried here; the
//! client decides.
use http::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ApiError {
    /// The upstream could not be reached while forwarding a request.
    #[error("Proxy error: {message}")]
    ProxyError { message: String },

    /// The upstream has no directory index for the festival.
    #[error("Festival not found: {festival_id}")]
    FestivalNotFound { festival_id: String },

    /// Fetching or reading the directory index failed.
    #[error("Failed to fetch beverage types: {message}")]
    DiscoveryFailure { message: String },
}

impl ApiError {
    pub fn proxy(message: impl Into<String>) -> Self {
        Self::ProxyError {
            message: message.into(),
        }
    }

    pub fn festival_not_found(festival_id: impl Into<String>) -> Self {
        Self::FestivalNotFound {
            festival_id: festival_id.into(),
        }
    }

    pub fn discovery(message: impl Into<String>) -> Self {
        Self::DiscoveryFailure {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::ProxyError { .. } => StatusCode::BAD_GATEWAY,
            ApiError::FestivalNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::DiscoveryFailure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// JSON envelope sent to the caller.
    pub fn body(&self) -> Value {
        match self {
            ApiError::ProxyError { message } => json!({
                "error": "Proxy error",
                "message": message,
            }),
            ApiError::FestivalNotFound { festival_id } => json!({
                "error": "Festival not found",
                "festival_id": festival_id,
            }),
            ApiError::DiscoveryFailure { message } => json!({
                "error": "Failed to fetch beverage types",
                "message": message,
            }),
        }
    }
}
