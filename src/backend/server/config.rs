/**
 * Store Selection
 *
 * This module turns the configured database URL into a document store.
 *
 * # Error Handling
 *
 * A store that fails to open is logged and replaced by the in-memory store,
 * so the server still starts. Without `DATABASE_URL` the in-memory store is
 * used directly.
 */
use crate::backend::store::{DocumentStore, MemoryStore, SqliteStore};
use crate::shared::AppConfig;
use std::sync::Arc;

/// Open the configured document store
pub async fn load_store(config: &AppConfig) -> Arc<dyn DocumentStore> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::info!("[Store] DATABASE_URL not set, using in-memory document store");
        return Arc::new(MemoryStore::new());
    };

    match SqliteStore::connect(url).await {
        Ok(store) => {
            tracing::info!("[Store] Connected to SQLite document store");
            Arc::new(store)
        }
        Err(e) => {
            tracing::warn!(
                "[Store] Failed to open {} ({}); falling back to in-memory store",
                url,
                e
            );
            Arc::new(MemoryStore::new())
        }
    }
}
