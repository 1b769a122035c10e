//! Error handling module
//!
//! Centralized error types and HTTP status mapping.

use axum::http::StatusCode;
use std::any::Any;

use crate::domain::AccountKind;
use crate::engine::EngineError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("{0}")]
    Validation(String),

    #[error("Invalid request body")]
    InvalidBody,

    #[error("{0}")]
    NotFound(String),

    #[error("Endpoint not found: {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("Failed to auto-create {kind} account {reference}: {reason}")]
    Provisioning {
        kind: AccountKind,
        reference: String,
        reason: String,
    },

    // Server errors (5xx)
    #[error(transparent)]
    Downstream(#[from] EngineError),

    #[error("Request timed out after {0}s waiting for the accounting engine")]
    Timeout(u64),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidBody | AppError::Provisioning { .. } => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) | AppError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Downstream(_) | AppError::Timeout(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("Failed to serialize response: {}", err))
    }
}

/// Extract a readable message from a caught panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Unexpected error".to_string()
    }
}
