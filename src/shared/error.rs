//! Shared Error Types
//!
//! This module defines the error taxonomy of the planning protocol. These
//! errors are produced by the identifier scheme, the collection manager, the
//! advisory layer and the fanout coordinator, and are mapped to HTTP responses
//! by `backend::error`.
//!
//! # Error Categories
//!
//! - `Validation` - Missing or malformed request fields
//! - `NotFound` - Referenced plan, date, activity or connection is absent
//! - `MalformedIdentifier` - A stored or supplied id does not parse
//! - `DuplicatePosition` / `AlreadyExists` - The key is already taken
//! - `Store` / `Broadcast` / `PartialWrite` - Collaborator failures
//!
//! # Usage
//!
//! ```rust
//! use plansync::shared::error::PlanError;
//!
//! let error = PlanError::validation("planName", "must not be empty");
//! assert!(error.is_client_error());
//! ```
use thiserror::Error;

/// Failure reported by a document store implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store rejected or failed the call
    #[error("store backend error: {message}")]
    Backend {
        /// Human-readable error message
        message: String,
    },

    /// A stored document could not be encoded or decoded
    #[error("document encoding error: {message}")]
    Encoding {
        /// Human-readable error message
        message: String,
    },
}

impl StoreError {
    /// Create a new backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a new encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::encoding(format!("JSON error: {}", err))
    }
}

/// Failure reported by a broadcast service implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    /// The connection id is not known to the broadcast service
    #[error("unknown connection '{connection_id}'")]
    UnknownConnection {
        /// The connection that was looked up
        connection_id: String,
    },

    /// The event could not be handed to the broadcast service
    #[error("broadcast delivery failed: {message}")]
    Delivery {
        /// Human-readable error message
        message: String,
    },
}

impl BroadcastError {
    /// Create a new delivery error
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }
}

/// Errors of the planning protocol
#[derive(Debug, Error, Clone)]
pub enum PlanError {
    /// Missing or malformed required field
    #[error("Validation error in field '{field}': {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// Referenced entity does not exist (or is tombstoned)
    #[error("{resource} '{id}' not found")]
    NotFound {
        /// Kind of entity, e.g. `"plan"` or `"activity"`
        resource: &'static str,
        /// The identifier that was looked up
        id: String,
    },

    /// An identifier does not follow the key scheme
    #[error("malformed identifier '{id}': {reason}")]
    MalformedIdentifier {
        /// The offending identifier
        id: String,
        /// Why it failed to parse
        reason: String,
    },

    /// An activity already occupies the requested position
    #[error("position already taken by '{id}'")]
    DuplicatePosition {
        /// The activity id that collided
        id: String,
    },

    /// A plan or date with this id is already live
    #[error("{resource} '{id}' already exists")]
    AlreadyExists {
        /// Kind of entity
        resource: &'static str,
        /// The identifier that collided
        id: String,
    },

    /// Document store call failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Broadcast service call failed
    #[error(transparent)]
    Broadcast(#[from] BroadcastError),

    /// An event payload could not be serialized
    #[error("failed to encode {target} event: {message}")]
    EventEncoding {
        /// Event target name
        target: &'static str,
        /// Serializer message
        message: String,
    },

    /// A multi-document change set stopped after applying some writes
    #[error("partial write: applied {applied:?}, failed at '{failed}'")]
    PartialWrite {
        /// Document ids whose writes were applied
        applied: Vec<String>,
        /// Document id whose write failed
        failed: String,
        /// The store failure that stopped the change set
        #[source]
        source: StoreError,
    },
}

impl PlanError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    /// Create a new malformed-identifier error
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedIdentifier {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create an event-encoding error
    pub fn event_encoding(target: &'static str, err: serde_json::Error) -> Self {
        Self::EventEncoding {
            target,
            message: err.to_string(),
        }
    }

    /// Stable machine-readable code for this error
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::MalformedIdentifier { .. } => "malformed_identifier",
            Self::DuplicatePosition { .. } => "duplicate_position",
            Self::AlreadyExists { .. } => "already_exists",
            Self::Store(_) => "store_failure",
            Self::Broadcast(_) => "broadcast_failure",
            Self::EventEncoding { .. } => "event_encoding",
            Self::PartialWrite { .. } => "partial_write",
        }
    }

    /// Whether the failure is caused by the caller rather than a collaborator
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Store(_)
                | Self::Broadcast(_)
                | Self::EventEncoding { .. }
                | Self::PartialWrite { .. }
        )
    }
}

/// Result alias used throughout the planning protocol
pub type PlanResult<T> = Result<T, PlanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = PlanError::validation("planName", "must not be empty");
        match error {
            PlanError::Validation { field, message } => {
                assert_eq!(field, "planName");
                assert_eq!(message, "must not be empty");
            }
            _ => panic!("Expected Validation"),
        }
    }

    #[test]
    fn test_not_found_display() {
        let error = PlanError::not_found("activity", "date|2025-01-01|activity|3");
        assert_eq!(
            error.to_string(),
            "activity 'date|2025-01-01|activity|3' not found"
        );
        assert_eq!(error.kind(), "not_found");
    }

    #[test]
    fn test_client_error_split() {
        assert!(PlanError::malformed("x", "bad").is_client_error());
        assert!(PlanError::DuplicatePosition { id: "x".into() }.is_client_error());
        assert!(!PlanError::from(StoreError::backend("down")).is_client_error());
        assert!(!PlanError::from(BroadcastError::delivery("down")).is_client_error());
        let encoding = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(!PlanError::event_encoding("dateAdded", encoding).is_client_error());
    }

    #[test]
    fn test_from_serde_error() {
        let result: Result<serde_json::Value, _> = serde_json::from_str("{ invalid json }");
        let store_error: StoreError = result.unwrap_err().into();
        match store_error {
            StoreError::Encoding { .. } => {}
            _ => panic!("Expected Encoding from serde error"),
        }
    }

    #[test]
    fn test_partial_write_keeps_source() {
        use std::error::Error as _;
        let error = PlanError::PartialWrite {
            applied: vec!["a".into()],
            failed: "b".into(),
            source: StoreError::backend("timeout"),
        };
        assert_eq!(error.kind(), "partial_write");
        assert!(error.source().is_some());
    }
}
