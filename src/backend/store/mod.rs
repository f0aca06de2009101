//! Document Store Module
//!
//! The planning protocol persists every record as a JSON document keyed by
//! `(partition_key, id)`. This module defines the store contract and ships
//! two implementations with identical semantics.
//!
//! # Module Structure
//!
//! ```text
//! store/
//! ├── mod.rs    - DocumentStore trait and query types
//! ├── memory.rs - In-process store (default, tests)
//! └── sqlite.rs - sqlx SQLite store
//! ```
//!
//! # Contract
//!
//! - Atomicity is per document, except `create_batch`, which is atomic
//!   within one partition.
//! - Logical deletion: `tombstone` stamps an expiry time. Tombstoned
//!   documents are invisible to every read and are removed by
//!   `purge_expired`.
//! - `create` on an id held by a tombstoned document succeeds.
//! - `tombstone` and `create` of an identical document are safe to repeat.

use crate::shared::error::StoreError;
use crate::shared::ids::{DocumentKind, DATE_PREFIX};
use crate::shared::model::Document;
use async_trait::async_trait;
use std::time::Duration;

/// In-process store
pub mod memory;

/// sqlx SQLite store
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Result type of store calls
pub type StoreResult<T> = Result<T, StoreError>;

/// Predicate of a partition-scoped query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentQuery {
    /// Documents whose id starts with the prefix
    IdPrefix(String),
    /// Documents of one kind
    Kind(DocumentKind),
}

impl DocumentQuery {
    /// Whether a document id satisfies the predicate
    pub fn matches(&self, id: &str) -> bool {
        match self {
            Self::IdPrefix(prefix) => id.starts_with(prefix.as_str()),
            Self::Kind(kind) => DocumentKind::of(id) == *kind,
        }
    }

    /// Id prefix every match shares, used to narrow backend scans
    pub fn scan_prefix(&self) -> &str {
        match self {
            Self::IdPrefix(prefix) => prefix,
            Self::Kind(DocumentKind::Date | DocumentKind::Activity) => DATE_PREFIX,
            Self::Kind(DocumentKind::Plan) => "",
        }
    }
}

/// Outcome of a single-document create
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// The document was written
    Created,
    /// A live document already holds the id; it is returned unchanged
    Exists(Document),
}

/// Outcome of an atomic batch create
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every document was written
    Created,
    /// Nothing was written because this id is already live
    Conflict(String),
}

/// Persistence contract of the planning protocol
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Point read of a live document
    async fn read(&self, partition_key: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Live documents of a partition matching the query, ordered by id
    async fn query(&self, partition_key: &str, query: &DocumentQuery) -> StoreResult<Vec<Document>>;

    /// Write a document unless a live one holds its id
    async fn create(&self, doc: &Document) -> StoreResult<CreateOutcome>;

    /// Write all documents of one partition, or none of them
    async fn create_batch(&self, docs: &[Document]) -> StoreResult<BatchOutcome>;

    /// Overwrite a live document; returns false when it is absent
    async fn replace(&self, doc: &Document) -> StoreResult<bool>;

    /// Flag a live document for expiry; returns false when it is absent
    async fn tombstone(&self, partition_key: &str, id: &str, ttl: Duration) -> StoreResult<bool>;

    /// Physically remove expired tombstones; returns how many were removed
    async fn purge_expired(&self) -> StoreResult<u64>;
}

fn single_partition(docs: &[Document]) -> StoreResult<Option<&str>> {
    let Some(first) = docs.first() else {
        return Ok(None);
    };
    if let Some(other) = docs.iter().find(|d| d.partition_key != first.partition_key) {
        return Err(StoreError::backend(format!(
            "batch spans partitions '{}' and '{}'",
            first.partition_key, other.partition_key
        )));
    }
    Ok(Some(first.partition_key.as_str()))
}

fn expiry_after(ttl: Duration) -> StoreResult<chrono::DateTime<chrono::Utc>> {
    let ttl = chrono::Duration::from_std(ttl)
        .map_err(|e| StoreError::backend(format!("invalid ttl: {}", e)))?;
    chrono::Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| StoreError::backend("ttl puts expiry out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_matches() {
        let activities = DocumentQuery::Kind(DocumentKind::Activity);
        assert!(activities.matches("date|2025-01-01|activity|0"));
        assert!(!activities.matches("date|2025-01-01"));
        assert_eq!(activities.scan_prefix(), "date|");

        let prefix = DocumentQuery::IdPrefix("date|2025-01-01|activity|".into());
        assert!(prefix.matches("date|2025-01-01|activity|5"));
        assert!(!prefix.matches("date|2025-01-02|activity|5"));
    }

    #[test]
    fn test_single_partition() {
        let doc = |p: &str| Document {
            partition_key: p.into(),
            id: "x".into(),
            body: serde_json::json!({}),
        };
        assert_eq!(single_partition(&[]).unwrap(), None);
        assert_eq!(single_partition(&[doc("a"), doc("a")]).unwrap(), Some("a"));
        assert!(single_partition(&[doc("a"), doc("b")]).is_err());
    }

    #[test]
    fn test_expiry_rejects_out_of_range_ttl() {
        assert!(expiry_after(Duration::from_secs(60)).is_ok());
        // Converts to a chrono duration but lands past the last representable date
        assert!(expiry_after(Duration::from_secs(100_000_000_000_000)).is_err());
        assert!(expiry_after(Duration::MAX).is_err());
    }
}
