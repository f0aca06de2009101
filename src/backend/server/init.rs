/**
 * Server Initialization
 *
 * This module builds the application state from configuration, starts the
 * background maintenance tasks and returns the configured router.
 *
 * # Initialization Process
 *
 * 1. Open the document store (SQLite or in-memory)
 * 2. Create the group hub
 * 3. Wire both into `AppState`
 * 4. Spawn the tombstone purge and idle-connection cleanup tasks
 * 5. Create the router
 */
use crate::backend::realtime::GroupHub;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::load_store;
use crate::backend::server::state::AppState;
use crate::backend::store::DocumentStore;
use crate::shared::AppConfig;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Create and configure the Axum application
pub async fn create_app(config: AppConfig) -> Router<()> {
    tracing::info!("[Server] Initializing plan sync server");

    let store = load_store(&config).await;
    let hub = Arc::new(GroupHub::new(config.broadcast_capacity));
    let app_state = AppState::new(store, hub, config);

    spawn_purge_task(app_state.store.clone(), app_state.config.purge_interval);
    spawn_connection_cleanup_task(
        app_state.hub.clone(),
        app_state.config.connection_idle_timeout,
    );
    tracing::info!("[Server] Router configured with background maintenance tasks");

    create_router(app_state)
}

/// Periodically remove expired tombstones
pub fn spawn_purge_task(store: Arc<dyn DocumentStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match store.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!("[Store] Purged {} expired documents", purged),
                Err(e) => tracing::warn!("[Store] Tombstone purge failed: {}", e),
            }
        }
    })
}

/// Periodically drop connections whose event stream is gone
pub fn spawn_connection_cleanup_task(hub: Arc<GroupHub>, idle: Duration) -> JoinHandle<()> {
    let every = (idle / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let removed = hub.cleanup_inactive_connections(idle).await;
            if removed > 0 {
                tracing::debug!("[Realtime] Cleaned up {} inactive connections", removed);
            }
        }
    })
}
