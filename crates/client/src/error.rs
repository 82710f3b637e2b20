//! Error taxonomy for the API client.
//!
//! Expected conditions are modeled as values: a 404 on the cart endpoint
//! surfaces as [`ApiError::NotFound`] and is mapped to the empty-cart state by
//! the caller, not treated as a failure.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by the API gateway.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, body read, JSON decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request body could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// A previously valid token was rejected; the token has been cleared and
    /// a session-expired event emitted.
    #[error("session expired")]
    SessionExpired,

    /// Any other non-success status, with the backend's message when it sent
    /// one.
    #[error("API error ({status}): {}", message.as_deref().unwrap_or("no message provided"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
}

impl ApiError {
    /// The backend-provided message, if this error carries one.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// A message suitable for showing the user: the backend's own wording
    /// when available, otherwise `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.backend_message()
            .map_or_else(|| fallback.to_string(), ToString::to_string)
    }

    /// The HTTP status, for errors that carry one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::NotFound(_) => Some(StatusCode::NOT_FOUND),
            Self::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_with_backend_message() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Out of stock".to_string()),
        };
        assert_eq!(err.to_string(), "API error (400 Bad Request): Out of stock");
        assert_eq!(err.user_message("Could not add item"), "Out of stock");
    }

    #[test]
    fn test_status_display_without_backend_message() {
        let err = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(
            err.to_string(),
            "API error (500 Internal Server Error): no message provided"
        );
        assert_eq!(
            err.user_message("Could not add item"),
            "Could not add item"
        );
    }

    #[test]
    fn test_not_found_carries_path() {
        let err = ApiError::NotFound("/v1/cart".to_string());
        assert_eq!(err.to_string(), "not found: /v1/cart");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }
}
