//! PlanSync - Main Library
//!
//! PlanSync is a collaborative trip-planning backend. Several clients edit a
//! shared plan (dated lists of ordered activities) and see each other's
//! changes through a per-plan event stream.
//!
//! # Overview
//!
//! - Hierarchical document keys whose embedded index is the sort key
//! - Moves expressed as create-new then tombstone-old
//! - Broadcast-only editing locks and last-writer-wins votes
//! - One broadcast event per mutation, delivered to the plan's group
//!
//! # Module Structure
//!
//! - **`shared`** - Keys, records, payloads, errors and configuration
//!   - No I/O; usable without the `ssr` feature
//!
//! - **`backend`** - Server-side code (only compiled with `ssr` feature)
//!   - Document stores (in-memory and SQLite)
//!   - Plan operations and the change fanout
//!   - Group hub and Server-Sent Events
//!   - Axum routes and server bootstrap
//!
//! # Feature Flags
//!
//! - **`ssr`** - Enables the backend (axum, tower-http, tracing-subscriber)
//!
//! # Usage
//!
//! ```rust,no_run
//! use plansync::backend::server::init::create_app;
//! use plansync::shared::AppConfig;
//!
//! # async fn example() -> Result<(), plansync::shared::ConfigError> {
//! let app = create_app(AppConfig::from_env()?).await;
//! // Serve with axum::serve
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! - `shared::error::PlanError` for protocol failures
//! - `backend::error::BackendError` for HTTP responses

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
#[cfg(feature = "ssr")]
pub mod backend;
