//! Routes Module
//!
//! This module wires handlers to paths.
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs        - Module exports and documentation
//! ├── router.rs     - Router creation, fallback and layers
//! └── api_routes.rs - /api/* endpoints
//! ```

/// Main router creation
pub mod router;

/// API endpoint registration
pub mod api_routes;

pub use router::create_router;
