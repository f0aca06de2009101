/**
 * Backend Error Types
 *
 * This module defines the error type returned by HTTP handlers. It wraps the
 * protocol errors from `shared::error` and adds handler-level failures such
 * as unmatched routes.
 *
 * # Status Mapping
 *
 * - `Validation`, `MalformedIdentifier` - 400 Bad Request
 * - `NotFound` - 404 Not Found
 * - `DuplicatePosition`, `AlreadyExists` - 409 Conflict
 * - `Store`, `Broadcast`, `EventEncoding`, `PartialWrite` - 500 Internal Server Error
 */
use crate::shared::PlanError;
use axum::http::StatusCode;
use thiserror::Error;

/// Message returned to clients for every internal failure
pub const INTERNAL_FAILURE: &str = "internal failure";

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use plansync::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., no route matched)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// Planning protocol error
    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl BackendError {
    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Plan(err) => match err {
                PlanError::Validation { .. } | PlanError::MalformedIdentifier { .. } => {
                    StatusCode::BAD_REQUEST
                }
                PlanError::NotFound { .. } => StatusCode::NOT_FOUND,
                PlanError::DuplicatePosition { .. } | PlanError::AlreadyExists { .. } => {
                    StatusCode::CONFLICT
                }
                PlanError::Store(_)
                | PlanError::Broadcast(_)
                | PlanError::EventEncoding { .. }
                | PlanError::PartialWrite { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Whether the detail must stay in the logs
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message shown to the client
    pub fn message(&self) -> String {
        if self.is_internal() {
            return INTERNAL_FAILURE.to_string();
        }
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::Plan(err) => err.to_string(),
        }
    }

    /// Stable machine-readable code
    pub fn kind(&self) -> &'static str {
        match self {
            Self::HandlerError { status, .. } if *status == StatusCode::NOT_FOUND => "not_found",
            Self::HandlerError { .. } => "handler_error",
            Self::Plan(err) => err.kind(),
        }
    }
}
