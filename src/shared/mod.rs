//! Shared Module
//!
//! This module contains the types shared by every layer of the planning
//! service: document keys, stored records, request and event payloads, the
//! error taxonomy and the configuration.
//!
//! # Overview
//!
//! Nothing in here performs I/O. The backend composes these types with a
//! document store and a broadcast service.

/// Hierarchical document keys
pub mod ids;

/// Stored records and assembled views
pub mod model;

/// Request bodies and broadcast payloads
pub mod messages;

/// Plan change events
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::{BroadcastError, PlanError, PlanResult, StoreError};
pub use event::{EventTarget, PlanEvent};
pub use ids::{ActivityKey, DocumentKind};
pub use model::{ActivityRecord, DateRecord, DateView, Document, PlanRecord, PlanView};
