//! Unified error handling.
//!
//! Provides a single error type that can be converted to an Axum HTTP
//! response (plain-text body) and classified for retry by background tasks.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Client errors
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    // External service errors
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[cfg(feature = "queue")]
    #[error("Message queue error: {0}")]
    Queue(#[from] rskafka::client::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Timed out: {0}")]
    Timeout(String),

    // Internal
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether retrying the same operation later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            #[cfg(feature = "database")]
            AppError::Database(_) => true,
            #[cfg(feature = "queue")]
            AppError::Queue(_) => true,
            AppError::Timeout(_) => true,
            _ => false,
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            // Show full message for client errors
            AppError::BadRequest(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),

            // Hide details for downstream failures
            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            #[cfg(feature = "queue")]
            AppError::Queue(e) => {
                tracing::error!("Message queue error: {:?}", e);
                "A message queue error occurred".to_string()
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {}", e);
                "A serialization error occurred".to_string()
            }
            AppError::Timeout(msg) => {
                tracing::error!("Timed out: {}", msg);
                "The operation timed out".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
        }
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_client_error() {
            tracing::debug!(status = %status, "Rejected request: {}", self);
        }

        (status, self.user_message()).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, message: impl Into<String>) -> AppResult<T> {
        self.ok_or_else(|| AppError::NotFound(message.into()))
    }
}

/// Convenience constructors
impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        AppError::Timeout(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_client_errors_keep_their_message() {
        let response = AppError::bad_request("Request must contain 'id'").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Request must contain 'id'");

        let response = AppError::not_found("There is no user with id = '9'").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "There is no user with id = '9'");
    }

    #[tokio::test]
    async fn test_internal_errors_are_opaque() {
        let response = AppError::internal("connection reset by peer").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "An internal error occurred");
    }

    #[test]
    fn test_error_responses_are_plain_text() {
        let response = AppError::not_found("missing").into_response();
        let content_type = response.headers().get(axum::http::header::CONTENT_TYPE).unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/plain"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(AppError::timeout("produce").is_transient());
        assert!(!AppError::bad_request("bad").is_transient());
        assert!(!AppError::internal("bug").is_transient());

        let decode = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        assert!(!AppError::from(decode).is_transient());
    }

    #[test]
    fn test_ok_or_not_found() {
        let missing: Option<u32> = None;
        let err = missing.ok_or_not_found("nothing here").unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "nothing here"));
        assert_eq!(Some(3).ok_or_not_found("unused").unwrap(), 3);
    }
}
