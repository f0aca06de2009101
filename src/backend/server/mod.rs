//! Server Module
//!
//! This module initializes and configures the Axum HTTP server.
//!
//! # Architecture
//!
//! - **`state`** - `AppState` and `FromRef` implementations
//! - **`config`** - Document store selection
//! - **`init`** - App creation and background tasks
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── state.rs  - AppState and FromRef implementations
//! ├── config.rs - Store selection from configuration
//! └── init.rs   - Server initialization
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use plansync::backend::server::create_app;
//! use plansync::shared::AppConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::from_env()?;
//! let app = create_app(config).await;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:7071").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

/// Application state management
pub mod state;

/// Store selection
pub mod config;

/// Server initialization
pub mod init;

pub use init::create_app;
pub use state::AppState;
