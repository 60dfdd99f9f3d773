//! Structured error types for the HTTP boundary
//! Not-found and not-owned are reported identically to avoid leaking
//! task existence across owners.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error response for API clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Additional error context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Application error types with proper categorization
#[derive(Debug)]
pub enum AppError {
    // Validation Errors (400)
    InvalidInput { field: String, reason: String },

    // Not Found Errors (404) - covers not-owned as well
    TaskNotFound(u64),
    ConversationNotFound(u64),

    // Internal Errors (500) - storage and serialization failures arrive
    // here through the anyhow conversion
    Internal(anyhow::Error),
}

impl AppError {
    /// Get error code for client identification
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::TaskNotFound(_) => "TASK_NOT_FOUND",
            Self::ConversationNotFound(_) => "CONVERSATION_NOT_FOUND",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,

            Self::TaskNotFound(_) | Self::ConversationNotFound(_) => StatusCode::NOT_FOUND,

            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get detailed error message
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput { field, reason } => {
                format!("Invalid input for field '{field}': {reason}")
            }
            // Same wording whether the task is absent or owned by someone else
            Self::TaskNotFound(_) => "Task not found".to_string(),
            Self::ConversationNotFound(_) => "Conversation not found".to_string(),
            Self::Internal(err) => format!("Internal error: {err}"),
        }
    }

    /// Convert to structured error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            message: self.message(),
            details: None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

/// Convert from anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

/// Axum IntoResponse implementation for proper HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response();

        (status, Json(body)).into_response()
    }
}

/// Helper trait to convert validation errors
pub trait ValidationErrorExt<T> {
    fn map_validation_err(self, field: &str) -> Result<T>;
}

impl<T> ValidationErrorExt<T> for anyhow::Result<T> {
    fn map_validation_err(self, field: &str) -> Result<T> {
        self.map_err(|e| AppError::InvalidInput {
            field: field.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let invalid = AppError::InvalidInput {
            field: "title".to_string(),
            reason: "empty".to_string(),
        };
        assert_eq!(invalid.code(), "INVALID_INPUT");
        assert_eq!(AppError::TaskNotFound(42).code(), "TASK_NOT_FOUND");
    }

    #[test]
    fn test_status_codes() {
        let invalid = AppError::InvalidInput {
            field: "title".to_string(),
            reason: "empty".to_string(),
        };
        assert_eq!(invalid.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::TaskNotFound(1).status_code(), StatusCode::NOT_FOUND);
        // Storage failures arrive via the anyhow conversion
        let storage: AppError = anyhow::anyhow!("rocksdb write failed").into();
        assert_eq!(storage.code(), "INTERNAL_ERROR");
        assert_eq!(storage.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_does_not_leak_task_id() {
        // Indistinguishable from not-owned, and the id is not echoed back
        let response = AppError::TaskNotFound(1234).to_response();
        assert_eq!(response.message, "Task not found");
        assert!(!response.message.contains("1234"));
    }
}
