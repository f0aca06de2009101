//! Backend Module
//!
//! This module contains all server-side code for PlanSync: the document
//! stores, the planning protocol, real-time delivery and the Axum server.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Architecture
//!
//! - **`store`** - `DocumentStore` trait, in-memory and SQLite stores
//! - **`plans`** - Plan operations, change sets and HTTP handlers
//! - **`realtime`** - `Broadcaster` trait, group hub, SSE streams
//! - **`server`** - Application state and initialization
//! - **`routes`** - Route configuration and router assembly
//! - **`error`** - Backend error type and HTTP conversion
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs     - Module exports and documentation
//! ├── store/     - Document persistence
//! ├── plans/     - Planning protocol
//! ├── realtime/  - Event delivery
//! ├── server/    - Server initialization and state
//! ├── routes/    - Route configuration
//! └── error/     - Error types
//! ```
//!
//! # Request Flow
//!
//! 1. A handler parses the request and calls `PlanService`
//! 2. The service loads current records and builds a `ChangeSet`
//! 3. `Fanout` applies the writes in order
//! 4. `Fanout` sends the event to the plan's group through `GroupHub`
//! 5. Each member's SSE stream forwards the event to its client

/// Document persistence
pub mod store;

/// Planning protocol
pub mod plans;

/// Real-time event delivery
pub mod realtime;

/// Server initialization and application state
pub mod server;

/// HTTP route configuration
pub mod routes;

/// Backend error types
pub mod error;
