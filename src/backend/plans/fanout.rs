/**
 * Change Fanout Coordinator
 *
 * Every mutation is expressed as a `ChangeSet`: an ordered list of document
 * writes plus exactly one event. `Fanout::commit` applies the writes in
 * order, stops at the first failure, and then hands the event to the
 * broadcaster for the plan's group.
 *
 * # Failure Reporting
 *
 * - A store failure before anything was applied is `Store`
 * - A store failure after some writes were applied is `PartialWrite`,
 *   naming the applied ids and the failed one
 * - A broadcast failure after all writes is `Broadcast`; the writes stay
 *
 * # Retries
 *
 * Re-running a change set is safe. A create that meets an identical live
 * document is skipped, and tombstoning an absent document is skipped. The
 * copy written by a move may differ from a previous attempt only in its
 * `lastUpdatedAt` stamp; every other field, `createdAt` included, must match.
 * Anything else already holding the id is a `DuplicatePosition`.
 */
use crate::backend::realtime::{broadcast_event, Broadcaster};
use crate::backend::store::{BatchOutcome, CreateOutcome, DocumentStore};
use crate::shared::ids::DocumentKind;
use crate::shared::{Document, PlanError, PlanEvent, PlanResult};
use std::sync::Arc;
use std::time::Duration;

/// Stamp refreshed on every attempt of a move
const MOVE_STAMP: &str = "lastUpdatedAt";

/// One document write
#[derive(Debug, Clone, PartialEq)]
pub enum Write {
    /// Create a document; an identical live one is accepted, any other is a collision
    Create(Document),
    /// Create the moved copy of an activity; a live copy from an earlier attempt is accepted
    Relocate(Document),
    /// Create documents of one partition atomically
    CreateBatch {
        /// Resource named in `AlreadyExists`
        resource: &'static str,
        docs: Vec<Document>,
    },
    /// Overwrite a live document
    Replace(Document),
    /// Flag a document for expiry
    Tombstone { partition_key: String, id: String },
}

impl Write {
    pub fn tombstone(partition_key: impl Into<String>, id: impl Into<String>) -> Self {
        Self::Tombstone {
            partition_key: partition_key.into(),
            id: id.into(),
        }
    }

    /// Ids touched by this write
    pub fn ids(&self) -> Vec<String> {
        match self {
            Self::Create(doc) | Self::Relocate(doc) | Self::Replace(doc) => vec![doc.id.clone()],
            Self::CreateBatch { docs, .. } => docs.iter().map(|d| d.id.clone()).collect(),
            Self::Tombstone { id, .. } => vec![id.clone()],
        }
    }
}

/// Writes plus the single event announcing them
#[derive(Debug, Clone)]
pub struct ChangeSet {
    pub writes: Vec<Write>,
    pub event: PlanEvent,
}

impl ChangeSet {
    pub fn new(writes: Vec<Write>, event: PlanEvent) -> Self {
        Self { writes, event }
    }

    /// A change set that only announces
    pub fn announce(event: PlanEvent) -> Self {
        Self::new(Vec::new(), event)
    }

    /// Number of tombstone writes
    pub fn tombstone_count(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| matches!(w, Write::Tombstone { .. }))
            .count()
    }
}

fn without_move_stamp(body: &serde_json::Value) -> serde_json::Value {
    let mut body = body.clone();
    if let Some(fields) = body.as_object_mut() {
        fields.remove(MOVE_STAMP);
    }
    body
}

fn same_move(existing: &Document, incoming: &Document) -> bool {
    without_move_stamp(&existing.body) == without_move_stamp(&incoming.body)
}

/// Applies change sets against a store and broadcaster
#[derive(Clone)]
pub struct Fanout {
    store: Arc<dyn DocumentStore>,
    broadcaster: Arc<dyn Broadcaster>,
    tombstone_ttl: Duration,
}

impl Fanout {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        broadcaster: Arc<dyn Broadcaster>,
        tombstone_ttl: Duration,
    ) -> Self {
        Self {
            store,
            broadcaster,
            tombstone_ttl,
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn broadcaster(&self) -> &dyn Broadcaster {
        self.broadcaster.as_ref()
    }

    /// Apply the writes in order, then broadcast the event
    ///
    /// Returns the number of connections the event was handed to.
    pub async fn commit(&self, change: ChangeSet) -> PlanResult<usize> {
        let mut applied: Vec<String> = Vec::new();

        for write in &change.writes {
            match self.apply(write).await {
                Ok(()) => applied.extend(write.ids()),
                Err(PlanError::Store(source)) if !applied.is_empty() => {
                    let failed = write.ids().into_iter().next().unwrap_or_default();
                    tracing::error!(
                        "[Fanout] {} stopped after {} writes, failed at '{}': {}",
                        change.event.target.as_str(),
                        applied.len(),
                        failed,
                        source
                    );
                    return Err(PlanError::PartialWrite {
                        applied,
                        failed,
                        source,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        tracing::debug!(
            "[Fanout] Applied {} writes for {}",
            change.writes.len(),
            change.event.target.as_str()
        );

        Ok(broadcast_event(self.broadcaster.as_ref(), &change.event).await?)
    }

    async fn create(&self, doc: &Document, accepts: impl Fn(&Document) -> bool) -> PlanResult<()> {
        match self.store.create(doc).await? {
            CreateOutcome::Created => Ok(()),
            CreateOutcome::Exists(existing) if accepts(&existing) => {
                tracing::debug!("[Fanout] '{}' already written, skipping create", doc.id);
                Ok(())
            }
            CreateOutcome::Exists(_) => Err(PlanError::DuplicatePosition { id: doc.id.clone() }),
        }
    }

    async fn apply(&self, write: &Write) -> PlanResult<()> {
        match write {
            Write::Create(doc) => self.create(doc, |existing| existing.body == doc.body).await,
            Write::Relocate(doc) => self.create(doc, |existing| same_move(existing, doc)).await,
            Write::CreateBatch { resource, docs } => match self.store.create_batch(docs).await? {
                BatchOutcome::Created => Ok(()),
                BatchOutcome::Conflict(id) => Err(PlanError::AlreadyExists {
                    resource: *resource,
                    id,
                }),
            },
            Write::Replace(doc) => {
                if self.store.replace(doc).await? {
                    Ok(())
                } else {
                    Err(PlanError::not_found(
                        DocumentKind::of(&doc.id).resource(),
                        doc.id.clone(),
                    ))
                }
            }
            Write::Tombstone { partition_key, id } => {
                if !self
                    .store
                    .tombstone(partition_key, id, self.tombstone_ttl)
                    .await?
                {
                    tracing::debug!("[Fanout] '{}' already tombstoned, skipping", id);
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Store and broadcaster doubles shared by the plan tests

    use super::*;
    use crate::backend::store::{DocumentQuery, MemoryStore, StoreResult};
    use crate::shared::{BroadcastError, StoreError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Broadcaster that records every event it is handed
    #[derive(Default)]
    pub struct RecordingBroadcaster {
        pub events: Mutex<Vec<PlanEvent>>,
        pub fail: bool,
    }

    impl RecordingBroadcaster {
        pub fn failing() -> Self {
            Self {
                events: Mutex::default(),
                fail: true,
            }
        }

        pub fn events(&self) -> Vec<PlanEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Broadcaster for RecordingBroadcaster {
        async fn send_to_group(&self, event: &PlanEvent) -> Result<usize, BroadcastError> {
            if self.fail {
                return Err(BroadcastError::delivery("service unavailable"));
            }
            self.events.lock().unwrap().push(event.clone());
            Ok(1)
        }

        async fn add_to_group(&self, _group: &str, _connection_id: &str) -> Result<(), BroadcastError> {
            Ok(())
        }

        async fn remove_from_group(&self, _group: &str, _connection_id: &str) -> Result<(), BroadcastError> {
            Ok(())
        }
    }

    /// Store whose tombstone calls fail once `fail_after` of them succeeded
    pub struct FlakyStore {
        pub inner: MemoryStore,
        pub fail_after: usize,
        pub tombstones: Mutex<usize>,
    }

    impl FlakyStore {
        pub fn new(inner: MemoryStore, fail_after: usize) -> Self {
            Self {
                inner,
                fail_after,
                tombstones: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn read(&self, partition_key: &str, id: &str) -> StoreResult<Option<Document>> {
            self.inner.read(partition_key, id).await
        }

        async fn query(&self, partition_key: &str, query: &DocumentQuery) -> StoreResult<Vec<Document>> {
            self.inner.query(partition_key, query).await
        }

        async fn create(&self, doc: &Document) -> StoreResult<CreateOutcome> {
            self.inner.create(doc).await
        }

        async fn create_batch(&self, docs: &[Document]) -> StoreResult<BatchOutcome> {
            self.inner.create_batch(docs).await
        }

        async fn replace(&self, doc: &Document) -> StoreResult<bool> {
            self.inner.replace(doc).await
        }

        async fn tombstone(&self, partition_key: &str, id: &str, ttl: Duration) -> StoreResult<bool> {
            {
                let mut count = self.tombstones.lock().unwrap();
                if *count >= self.fail_after {
                    return Err(StoreError::backend("request timed out"));
                }
                *count += 1;
            }
            self.inner.tombstone(partition_key, id, ttl).await
        }

        async fn purge_expired(&self) -> StoreResult<u64> {
            self.inner.purge_expired().await
        }
    }
}
