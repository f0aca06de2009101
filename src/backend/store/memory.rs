/**
 * In-Process Document Store
 *
 * This module stores documents in a `BTreeMap` behind a tokio `RwLock`.
 * It is the default store when no database URL is configured and the store
 * used by the test suite.
 *
 * # Expiry
 *
 * Tombstoned entries keep their body together with an expiry time until
 * `purge_expired` removes them; every read skips them.
 */
use super::{
    expiry_after, single_partition, BatchOutcome, CreateOutcome, DocumentQuery, DocumentStore,
    StoreResult,
};
use crate::shared::model::Document;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

type Key = (String, String);

#[derive(Debug, Clone)]
struct Entry {
    doc: Document,
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self) -> bool {
        self.expires_at.is_none()
    }
}

/// In-process document store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<Key, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries including tombstones not yet purged
    pub async fn raw_len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the entry exists and carries an expiry time
    pub async fn is_tombstoned(&self, partition_key: &str, id: &str) -> bool {
        self.entries
            .read()
            .await
            .get(&(partition_key.to_string(), id.to_string()))
            .map(|e| !e.is_live())
            .unwrap_or(false)
    }
}

fn key_of(doc: &Document) -> Key {
    (doc.partition_key.clone(), doc.id.clone())
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn read(&self, partition_key: &str, id: &str) -> StoreResult<Option<Document>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&(partition_key.to_string(), id.to_string()))
            .filter(|e| e.is_live())
            .map(|e| e.doc.clone()))
    }

    async fn query(&self, partition_key: &str, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
        let entries = self.entries.read().await;
        let start = (partition_key.to_string(), query.scan_prefix().to_string());
        Ok(entries
            .range(start..)
            .take_while(|((partition, id), _)| {
                partition == partition_key && id.starts_with(query.scan_prefix())
            })
            .filter(|((_, id), entry)| entry.is_live() && query.matches(id))
            .map(|(_, entry)| entry.doc.clone())
            .collect())
    }

    async fn create(&self, doc: &Document) -> StoreResult<CreateOutcome> {
        let mut entries = self.entries.write().await;
        let key = key_of(doc);
        if let Some(existing) = entries.get(&key).filter(|e| e.is_live()) {
            return Ok(CreateOutcome::Exists(existing.doc.clone()));
        }
        entries.insert(
            key,
            Entry {
                doc: doc.clone(),
                expires_at: None,
            },
        );
        Ok(CreateOutcome::Created)
    }

    async fn create_batch(&self, docs: &[Document]) -> StoreResult<BatchOutcome> {
        single_partition(docs)?;
        let mut entries = self.entries.write().await;
        if let Some(taken) = docs
            .iter()
            .find(|d| entries.get(&key_of(d)).map(Entry::is_live).unwrap_or(false))
        {
            return Ok(BatchOutcome::Conflict(taken.id.clone()));
        }
        for doc in docs {
            entries.insert(
                key_of(doc),
                Entry {
                    doc: doc.clone(),
                    expires_at: None,
                },
            );
        }
        Ok(BatchOutcome::Created)
    }

    async fn replace(&self, doc: &Document) -> StoreResult<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&key_of(doc)).filter(|e| e.is_live()) {
            Some(entry) => {
                entry.doc = doc.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn tombstone(&self, partition_key: &str, id: &str, ttl: Duration) -> StoreResult<bool> {
        let expires_at = expiry_after(ttl)?;
        let mut entries = self.entries.write().await;
        match entries
            .get_mut(&(partition_key.to_string(), id.to_string()))
            .filter(|e| e.is_live())
        {
            Some(entry) => {
                entry.expires_at = Some(expires_at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn purge_expired(&self) -> StoreResult<u64> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| e.expires_at.map(|at| at > now).unwrap_or(true));
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::ids::DocumentKind;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn doc(partition: &str, id: &str, body: serde_json::Value) -> Document {
        Document {
            partition_key: partition.into(),
            id: id.into(),
            body,
        }
    }

    #[tokio::test]
    async fn test_create_then_exists() {
        let store = MemoryStore::new();
        let first = doc("p", "date|2025-01-01", json!({"v": 1}));
        assert_eq!(store.create(&first).await.unwrap(), CreateOutcome::Created);

        let second = doc("p", "date|2025-01-01", json!({"v": 2}));
        assert_matches!(
            store.create(&second).await.unwrap(),
            CreateOutcome::Exists(existing) if existing.body == json!({"v": 1})
        );
    }

    #[tokio::test]
    async fn test_tombstone_hides_and_allows_recreate() {
        let store = MemoryStore::new();
        let d = doc("p", "date|2025-01-01", json!({}));
        store.create(&d).await.unwrap();

        assert!(store.tombstone("p", &d.id, Duration::from_secs(60)).await.unwrap());
        assert!(!store.tombstone("p", &d.id, Duration::from_secs(60)).await.unwrap());
        assert!(store.read("p", &d.id).await.unwrap().is_none());
        assert!(store.is_tombstoned("p", &d.id).await);
        assert!(!store.replace(&d).await.unwrap());

        assert_eq!(store.create(&d).await.unwrap(), CreateOutcome::Created);
        assert!(store.read("p", &d.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_query_is_partition_scoped_and_ordered() {
        let store = MemoryStore::new();
        for id in [
            "date|2025-01-01|activity|2",
            "date|2025-01-01",
            "date|2025-01-01|activity|10",
            "plan-a",
        ] {
            store.create(&doc("plan-a", id, json!({}))).await.unwrap();
        }
        store
            .create(&doc("plan-b", "date|2025-01-01", json!({})))
            .await
            .unwrap();

        let dates = store
            .query("plan-a", &DocumentQuery::Kind(DocumentKind::Date))
            .await
            .unwrap();
        assert_eq!(dates.len(), 1);

        let activities = store
            .query("plan-a", &DocumentQuery::Kind(DocumentKind::Activity))
            .await
            .unwrap();
        assert_eq!(activities.len(), 2);

        let plans = store
            .query("plan-a", &DocumentQuery::Kind(DocumentKind::Plan))
            .await
            .unwrap();
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].id, "plan-a");
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.create(&doc("p", "date|b", json!({}))).await.unwrap();

        let batch = vec![doc("p", "date|a", json!({})), doc("p", "date|b", json!({}))];
        assert_eq!(
            store.create_batch(&batch).await.unwrap(),
            BatchOutcome::Conflict("date|b".into())
        );
        assert!(store.read("p", "date|a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired() {
        let store = MemoryStore::new();
        store.create(&doc("p", "a", json!({}))).await.unwrap();
        store.create(&doc("p", "b", json!({}))).await.unwrap();
        store.create(&doc("p", "c", json!({}))).await.unwrap();
        store.tombstone("p", "a", Duration::ZERO).await.unwrap();
        store.tombstone("p", "b", Duration::from_secs(3600)).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.raw_len().await, 2);
    }
}
