//! Backend Error Module
//!
//! This module defines the error type returned by HTTP handlers and its
//! conversion into JSON responses.
//!
//! # Architecture
//!
//! - **`types`** - `BackendError` and its status mapping
//! - **`conversion`** - `IntoResponse` implementation
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - Error conversion implementations
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::{BackendError, INTERNAL_FAILURE};
