//! Real-time Fanout Module
//!
//! This module delivers plan change events to connected clients.
//!
//! # Architecture
//!
//! - **`broadcast`** - The `Broadcaster` contract used by the fanout coordinator
//! - **`hub`** - In-process connection registry and group membership
//! - **`subscription`** - Server-Sent Events stream per connection
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── broadcast.rs    - Broadcaster trait and logging helper
//! ├── hub.rs          - GroupHub
//! └── subscription.rs - SSE handler
//! ```
//!
//! # Client Flow
//!
//! 1. `GET /api/negotiate` returns a connection id and stream URL
//! 2. `GET /api/events/{connectionId}` opens the stream
//! 3. `GET /api/registerUser?planId=..&connectionId=..` joins the plan's group

/// Broadcaster contract
pub mod broadcast;

/// In-process group hub
pub mod hub;

/// Server-Sent Events handler
pub mod subscription;

pub use broadcast::{broadcast_event, Broadcaster};
pub use hub::GroupHub;
pub use subscription::handle_event_stream;
