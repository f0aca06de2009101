//! Plans Module
//!
//! This module implements the collaborative planning protocol on top of a
//! `DocumentStore` and a `Broadcaster`.
//!
//! # Architecture
//!
//! - **`collection`** - Insert, move and delete of dates and activities
//! - **`advisory`** - Editing-lock announcements and vote tallies
//! - **`lifecycle`** - Plan and date creation, plan assembly
//! - **`fanout`** - Ordered application of writes followed by one event
//! - **`service`** - `PlanService`, the operation entry point
//! - **`handlers`** - axum handlers for `/api/*`
//!
//! # Module Structure
//!
//! ```text
//! plans/
//! ├── mod.rs        - Module exports and documentation
//! ├── collection.rs - Ordered collection manager
//! ├── advisory.rs   - Conflict advisory layer
//! ├── lifecycle.rs  - Plan lifecycle
//! ├── fanout.rs     - Change fanout coordinator
//! ├── service.rs    - PlanService
//! └── handlers.rs   - HTTP handlers
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use plansync::backend::plans::PlanService;
//! use plansync::backend::realtime::GroupHub;
//! use plansync::backend::store::MemoryStore;
//! use plansync::shared::messages::{CreatePlanRequest, DateSeed};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), plansync::shared::PlanError> {
//! let service = PlanService::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(GroupHub::new(64)),
//!     Duration::from_secs(1),
//! );
//! let view = service
//!     .create_plan(CreatePlanRequest {
//!         uuid: "f7873135".into(),
//!         plan_name: "Weekend".into(),
//!         created_by: "alice".into(),
//!         dates: vec![DateSeed { id: "2025-01-01".into() }],
//!     })
//!     .await?;
//! assert_eq!(view.activity_count(), 1);
//! # Ok(())
//! # }
//! ```

/// Ordered collection manager
pub mod collection;

/// Conflict advisory layer
pub mod advisory;

/// Plan lifecycle
pub mod lifecycle;

/// Change fanout coordinator
pub mod fanout;

/// Plan service
pub mod service;

/// HTTP handlers
pub mod handlers;

pub use collection::ActivityPatch;
pub use fanout::{ChangeSet, Fanout, Write};
pub use service::PlanService;
