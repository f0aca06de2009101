/**
 * Plan Service
 *
 * `PlanService` is the entry point of every plan operation. It validates
 * the request, loads the records a change depends on, asks the collection
 * manager, the advisory layer or the lifecycle module for a `ChangeSet`,
 * and commits it through `Fanout`.
 *
 * # Operations
 *
 * - `create_plan` / `get_plan` / `delete_plan`
 * - `add_date` / `delete_date`
 * - `add_activity` / `update_activity` / `delete_activity`
 * - `claim_lock` / `record_vote`
 * - `register_connection` / `unregister_connection`
 */
use super::advisory;
use super::collection::{self, ActivityPatch};
use super::fanout::Fanout;
use super::lifecycle;
use crate::backend::realtime::Broadcaster;
use crate::backend::store::{DocumentQuery, DocumentStore};
use crate::shared::ids::{activity_prefix, make_date_id, make_plan_id, ActivityKey, DocumentKind};
use crate::shared::messages::{
    ActivityMsg, AddActivityRequest, AddDateRequest, CreatePlanRequest, DateMsg,
    LockActivityRequest, PlanMsg, UpdateActivityRequest, VoteActivityRequest,
};
use crate::shared::{
    ActivityRecord, BroadcastError, DateRecord, DateView, PlanError, PlanRecord, PlanResult,
    PlanView,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

fn require_user(field: &str, value: &str) -> PlanResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PlanError::validation(field, "must not be empty"));
    }
    Ok(value.to_string())
}

/// Plan operations over a document store and a broadcaster
#[derive(Clone)]
pub struct PlanService {
    fanout: Fanout,
}

impl PlanService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        broadcaster: Arc<dyn Broadcaster>,
        tombstone_ttl: Duration,
    ) -> Self {
        Self {
            fanout: Fanout::new(store, broadcaster, tombstone_ttl),
        }
    }

    fn store(&self) -> &dyn DocumentStore {
        self.fanout.store()
    }

    async fn load_plan(&self, plan_id: &str) -> PlanResult<PlanRecord> {
        match self.store().read(plan_id, plan_id).await? {
            Some(doc) => Ok(doc.decode()?),
            None => Err(PlanError::not_found("plan", plan_id)),
        }
    }

    async fn load_date(&self, plan_id: &str, date_id: &str) -> PlanResult<DateRecord> {
        match self.store().read(plan_id, date_id).await? {
            Some(doc) => Ok(doc.decode()?),
            None => Err(PlanError::not_found("date", date_id)),
        }
    }

    async fn load_activity(&self, plan_id: &str, key: &ActivityKey) -> PlanResult<ActivityRecord> {
        let id = key.id();
        match self.store().read(plan_id, &id).await? {
            Some(doc) => Ok(doc.decode()?),
            None => Err(PlanError::not_found("activity", id)),
        }
    }

    /// Create a plan with its dates, each seeded with activity 0
    pub async fn create_plan(&self, request: CreatePlanRequest) -> PlanResult<PlanView> {
        let (view, change) = lifecycle::create_plan(&request, Utc::now())?;
        self.fanout.commit(change).await?;
        tracing::info!(
            "[Plans] Created plan '{}' with {} dates",
            view.plan.plan_id,
            view.dates.len()
        );
        Ok(view)
    }

    /// Read the whole plan
    pub async fn get_plan(&self, plan_id: &str) -> PlanResult<PlanView> {
        let plan_id = make_plan_id(plan_id)?;
        let store = self.store();
        let (plan, dates, activities) = tokio::try_join!(
            store.read(&plan_id, &plan_id),
            store.query(&plan_id, &DocumentQuery::Kind(DocumentKind::Date)),
            store.query(&plan_id, &DocumentQuery::Kind(DocumentKind::Activity)),
        )?;
        lifecycle::assemble_plan(&plan_id, plan, dates, activities)
    }

    /// Tombstone the plan root; dates and activities are not touched
    pub async fn delete_plan(&self, plan_id: &str, by_user: &str) -> PlanResult<PlanMsg> {
        let plan_id = make_plan_id(plan_id)?;
        let by_user = require_user("byUser", by_user)?;
        self.load_plan(&plan_id).await?;

        self.fanout
            .commit(collection::delete_plan(&plan_id, &by_user)?)
            .await?;
        tracing::info!("[Plans] Deleted plan '{}' (by {})", plan_id, by_user);
        Ok(PlanMsg {
            id: plan_id,
            by_user,
        })
    }

    /// Add a date, seeded with activity 0
    pub async fn add_date(&self, plan_id: &str, request: AddDateRequest) -> PlanResult<DateView> {
        let plan_id = make_plan_id(plan_id)?;
        let plan = self.load_plan(&plan_id).await?;
        let (view, change) = lifecycle::add_date(&plan, &request, Utc::now())?;
        self.fanout.commit(change).await?;
        tracing::info!("[Plans] Added date '{}' to plan '{}'", view.date.id, plan_id);
        Ok(view)
    }

    /// Tombstone a date's activities and then the date
    ///
    /// Re-running after a `PartialWrite` finishes the cascade.
    pub async fn delete_date(&self, plan_id: &str, date_key: &str, by_user: &str) -> PlanResult<DateMsg> {
        let plan_id = make_plan_id(plan_id)?;
        let by_user = require_user("byUser", by_user)?;
        let date = self.load_date(&plan_id, &make_date_id(date_key)?).await?;

        let docs = self
            .store()
            .query(&plan_id, &DocumentQuery::IdPrefix(activity_prefix(&date.id)))
            .await?;
        let keys = docs
            .iter()
            .map(|doc| doc.id.parse::<ActivityKey>())
            .collect::<PlanResult<Vec<_>>>()?;

        let change = collection::delete_date(&date, keys, &by_user)?;
        let tombstones = change.tombstone_count();
        self.fanout.commit(change).await?;
        tracing::info!(
            "[Plans] Deleted date '{}' of plan '{}' ({} tombstones)",
            date.id,
            plan_id,
            tombstones
        );
        Ok(DateMsg {
            id: date.calendar_key().to_string(),
            by_user,
        })
    }

    /// Create an activity at the caller's index
    pub async fn add_activity(
        &self,
        plan_id: &str,
        date_key: &str,
        request: AddActivityRequest,
    ) -> PlanResult<ActivityRecord> {
        request.validate()?;
        let plan_id = make_plan_id(plan_id)?;
        let date = self.load_date(&plan_id, &make_date_id(date_key)?).await?;

        let (record, change) = collection::insert_activity(
            &date,
            request.id,
            request.created_by.trim(),
            request.activity_text,
            Utc::now(),
        )?;
        self.fanout.commit(change).await?;
        tracing::info!("[Plans] Added activity '{}' to plan '{}'", record.id, plan_id);
        Ok(record)
    }

    /// Tombstone one activity
    pub async fn delete_activity(
        &self,
        plan_id: &str,
        key: &ActivityKey,
        by_user: &str,
    ) -> PlanResult<ActivityMsg> {
        let plan_id = make_plan_id(plan_id)?;
        let by_user = require_user("byUser", by_user)?;
        self.load_activity(&plan_id, key).await?;

        self.fanout
            .commit(collection::delete_activity(&plan_id, key, &by_user)?)
            .await?;
        tracing::info!("[Plans] Deleted activity '{}' of plan '{}'", key, plan_id);
        Ok(ActivityMsg {
            id: key.index,
            date_id: key.calendar_key().to_string(),
            by_user,
            activity_text: None,
        })
    }

    /// Edit text in place, or move to a new index and/or date
    pub async fn update_activity(
        &self,
        plan_id: &str,
        key: &ActivityKey,
        request: UpdateActivityRequest,
    ) -> PlanResult<ActivityRecord> {
        request.validate()?;
        let plan_id = make_plan_id(plan_id)?;
        let current = self.load_activity(&plan_id, key).await?;

        let target_date_id = match &request.new_date {
            Some(calendar_key) => make_date_id(calendar_key)?,
            None => key.date_id.clone(),
        };
        if target_date_id != key.date_id {
            self.load_date(&plan_id, &target_date_id).await?;
        }
        let new_index = request.new_index.unwrap_or(key.index);

        let patch = ActivityPatch {
            activity_text: request.activity_text,
            by_user: request.by_user.trim().to_string(),
        };
        let (record, change) =
            collection::move_activity(&current, &target_date_id, new_index, &patch, Utc::now())?;
        self.fanout.commit(change).await?;

        if record.id == current.id {
            tracing::info!("[Plans] Updated activity '{}' of plan '{}'", record.id, plan_id);
        } else {
            tracing::info!(
                "[Plans] Moved activity '{}' to '{}' in plan '{}'",
                current.id,
                record.id,
                plan_id
            );
        }
        Ok(record)
    }

    /// Announce an editing claim; nothing is stored
    pub async fn claim_lock(
        &self,
        plan_id: &str,
        key: &ActivityKey,
        request: LockActivityRequest,
    ) -> PlanResult<ActivityMsg> {
        request.validate()?;
        let plan_id = make_plan_id(plan_id)?;
        let activity = self.load_activity(&plan_id, key).await?;

        let (msg, change) = advisory::claim_lock(&activity, request.by_user.trim())?;
        self.fanout.commit(change).await?;
        tracing::debug!("[Plans] {} claimed '{}' in plan '{}'", msg.by_user, key, plan_id);
        Ok(msg)
    }

    /// Store the caller's voter lists
    pub async fn record_vote(
        &self,
        plan_id: &str,
        key: &ActivityKey,
        request: VoteActivityRequest,
    ) -> PlanResult<ActivityRecord> {
        request.validate()?;
        let plan_id = make_plan_id(plan_id)?;
        let activity = self.load_activity(&plan_id, key).await?;

        let (record, change) = advisory::record_vote(&activity, &request)?;
        self.fanout.commit(change).await?;
        tracing::debug!("[Plans] {} voted on '{}' in plan '{}'", request.voter, key, plan_id);
        Ok(record)
    }

    /// Join a connection to the plan's group
    pub async fn register_connection(&self, plan_id: &str, connection_id: &str) -> PlanResult<()> {
        let plan_id = make_plan_id(plan_id)?;
        let connection_id = require_user("connectionId", connection_id)?;
        self.fanout
            .broadcaster()
            .add_to_group(&plan_id, &connection_id)
            .await
            .map_err(|e| connection_error(e, &connection_id))?;
        tracing::info!("[Plans] Registered connection {} for plan '{}'", connection_id, plan_id);
        Ok(())
    }

    /// Remove a connection from the plan's group
    pub async fn unregister_connection(&self, plan_id: &str, connection_id: &str) -> PlanResult<()> {
        let plan_id = make_plan_id(plan_id)?;
        let connection_id = require_user("connectionId", connection_id)?;
        self.fanout
            .broadcaster()
            .remove_from_group(&plan_id, &connection_id)
            .await
            .map_err(|e| connection_error(e, &connection_id))?;
        tracing::info!("[Plans] Unregistered connection {} from plan '{}'", connection_id, plan_id);
        Ok(())
    }
}

fn connection_error(err: BroadcastError, connection_id: &str) -> PlanError {
    match err {
        BroadcastError::UnknownConnection { .. } => PlanError::not_found("connection", connection_id),
        other => PlanError::Broadcast(other),
    }
}

#[cfg(test)]
mod tests {
    use super::super::fanout::testing::{FlakyStore, RecordingBroadcaster};
    use super::*;
    use crate::backend::store::MemoryStore;
    use crate::shared::messages::DateSeed;
    use crate::shared::EventTarget;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    struct Harness {
        store: MemoryStore,
        broadcaster: Arc<RecordingBroadcaster>,
        service: PlanService,
    }

    fn harness() -> Harness {
        let store = MemoryStore::new();
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let service = PlanService::new(
            Arc::new(store.clone()),
            broadcaster.clone(),
            Duration::from_secs(60),
        );
        Harness {
            store,
            broadcaster,
            service,
        }
    }

    fn create_request(dates: &[&str]) -> CreatePlanRequest {
        CreatePlanRequest {
            uuid: "plan-1".into(),
            plan_name: "Road trip".into(),
            created_by: "alice".into(),
            dates: dates.iter().map(|d| DateSeed { id: d.to_string() }).collect(),
        }
    }

    fn add(index: u64, text: &str) -> AddActivityRequest {
        AddActivityRequest {
            id: index,
            created_by: "alice".into(),
            activity_text: Some(text.into()),
        }
    }

    fn key(date: &str, index: u64) -> ActivityKey {
        ActivityKey::new(format!("date|{}", date), index)
    }

    fn targets(broadcaster: &RecordingBroadcaster) -> Vec<EventTarget> {
        broadcaster.events().iter().map(|e| e.target).collect()
    }

    #[tokio::test]
    async fn test_create_plan_writes_three_documents() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01"])).await.unwrap();

        for id in ["plan-1", "date|2025-01-01", "date|2025-01-01|activity|0"] {
            assert!(h.store.read("plan-1", id).await.unwrap().is_some(), "{}", id);
        }
        assert_eq!(h.store.raw_len().await, 3);
        assert_eq!(targets(&h.broadcaster), vec![EventTarget::PlanCreated]);
    }

    #[tokio::test]
    async fn test_create_plan_twice_is_already_exists() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        assert_matches!(
            h.service.create_plan(create_request(&["2025-01-02"])).await,
            Err(PlanError::AlreadyExists { resource: "plan", .. })
        );
        assert!(h.store.read("plan-1", "date|2025-01-02").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_plan_round_trip() {
        let h = harness();
        h.service
            .create_plan(create_request(&["2025-01-02", "2025-01-01"]))
            .await
            .unwrap();
        h.service.add_activity("plan-1", "2025-01-01", add(10, "dinner")).await.unwrap();
        h.service.add_activity("plan-1", "2025-01-01", add(2, "lunch")).await.unwrap();

        let view = h.service.get_plan("plan-1").await.unwrap();
        assert_eq!(view.dates.len(), 2);
        assert_eq!(view.dates[0].date.calendar_key(), "2025-01-01");
        let texts: Vec<&str> = view.dates[0]
            .activities
            .iter()
            .map(|a| a.activity_text.as_str())
            .collect();
        assert_eq!(texts, vec!["", "lunch", "dinner"]);
    }

    #[tokio::test]
    async fn test_add_activity_duplicate_position() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        assert_matches!(
            h.service.add_activity("plan-1", "2025-01-01", add(0, "taken")).await,
            Err(PlanError::DuplicatePosition { .. })
        );
        assert_matches!(
            h.service.add_activity("plan-1", "2025-02-01", add(1, "x")).await,
            Err(PlanError::NotFound { resource: "date", .. })
        );
    }

    #[tokio::test]
    async fn test_delete_date_tombstones_everything_under_it() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        h.service.add_activity("plan-1", "2025-01-01", add(2, "b")).await.unwrap();
        h.service.add_activity("plan-1", "2025-01-01", add(5, "c")).await.unwrap();

        h.service.delete_date("plan-1", "2025-01-01", "bob").await.unwrap();

        for id in [
            "date|2025-01-01",
            "date|2025-01-01|activity|0",
            "date|2025-01-01|activity|2",
            "date|2025-01-01|activity|5",
        ] {
            assert!(h.store.is_tombstoned("plan-1", id).await, "{}", id);
        }
        let live = h
            .store
            .query("plan-1", &DocumentQuery::IdPrefix("date|2025-01-01".into()))
            .await
            .unwrap();
        assert!(live.is_empty());
        assert_eq!(targets(&h.broadcaster).last(), Some(&EventTarget::DateDeleted));
    }

    #[tokio::test]
    async fn test_delete_date_resumes_after_partial_write() {
        let memory = MemoryStore::new();
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let setup = PlanService::new(
            Arc::new(memory.clone()),
            broadcaster.clone(),
            Duration::from_secs(60),
        );
        setup.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        setup.add_activity("plan-1", "2025-01-01", add(1, "b")).await.unwrap();

        let flaky = PlanService::new(
            Arc::new(FlakyStore::new(memory.clone(), 1)),
            broadcaster.clone(),
            Duration::from_secs(60),
        );
        assert_matches!(
            flaky.delete_date("plan-1", "2025-01-01", "bob").await,
            Err(PlanError::PartialWrite { .. })
        );
        assert!(memory.read("plan-1", "date|2025-01-01").await.unwrap().is_some());

        setup.delete_date("plan-1", "2025-01-01", "bob").await.unwrap();
        assert!(memory.read("plan-1", "date|2025-01-01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_in_place_and_move() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01", "2025-01-02"])).await.unwrap();

        let edit = UpdateActivityRequest {
            by_user: "bob".into(),
            activity_text: Some("museum".into()),
            ..Default::default()
        };
        let record = h.service.update_activity("plan-1", &key("2025-01-01", 0), edit).await.unwrap();
        assert_eq!(record.id, "date|2025-01-01|activity|0");
        assert!(!h.store.is_tombstoned("plan-1", &record.id).await);

        let shift = UpdateActivityRequest {
            by_user: "bob".into(),
            new_index: Some(3),
            new_date: Some("2025-01-02".into()),
            ..Default::default()
        };
        let moved = h.service.update_activity("plan-1", &key("2025-01-01", 0), shift).await.unwrap();
        assert_eq!(moved.id, "date|2025-01-02|activity|3");
        assert_eq!(moved.activity_text, "museum");
        assert!(h.store.is_tombstoned("plan-1", "date|2025-01-01|activity|0").await);

        assert_eq!(
            targets(&h.broadcaster)[1..].to_vec(),
            vec![EventTarget::ActivityUpdated, EventTarget::ActivityMoved]
        );
    }

    #[tokio::test]
    async fn test_move_onto_taken_index_leaves_old() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        h.service.add_activity("plan-1", "2025-01-01", add(1, "taken")).await.unwrap();

        let shift = UpdateActivityRequest {
            by_user: "bob".into(),
            new_index: Some(1),
            ..Default::default()
        };
        assert_matches!(
            h.service.update_activity("plan-1", &key("2025-01-01", 0), shift).await,
            Err(PlanError::DuplicatePosition { .. })
        );
        assert!(h.store.read("plan-1", "date|2025-01-01|activity|0").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_move_onto_lookalike_activity_keeps_both() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        for index in [1, 2] {
            h.service.add_activity("plan-1", "2025-01-01", add(index, "x")).await.unwrap();
            let touch = UpdateActivityRequest {
                by_user: "bob".into(),
                activity_text: Some("x".into()),
                ..Default::default()
            };
            h.service
                .update_activity("plan-1", &key("2025-01-01", index), touch)
                .await
                .unwrap();
        }
        let events_before = h.broadcaster.events().len();

        let shift = UpdateActivityRequest {
            by_user: "bob".into(),
            new_index: Some(1),
            ..Default::default()
        };
        assert_matches!(
            h.service.update_activity("plan-1", &key("2025-01-01", 2), shift).await,
            Err(PlanError::DuplicatePosition { id }) if id == "date|2025-01-01|activity|1"
        );
        let view = h.service.get_plan("plan-1").await.unwrap();
        assert_eq!(view.activity_count(), 3);
        assert_eq!(h.broadcaster.events().len(), events_before);
    }

    #[tokio::test]
    async fn test_second_insert_at_same_index_is_rejected() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        h.service.add_activity("plan-1", "2025-01-01", add(7, "x")).await.unwrap();
        assert_matches!(
            h.service.add_activity("plan-1", "2025-01-01", add(7, "x")).await,
            Err(PlanError::DuplicatePosition { .. })
        );
        assert_eq!(
            targets(&h.broadcaster),
            vec![EventTarget::PlanCreated, EventTarget::ActivityAdded]
        );
    }

    #[tokio::test]
    async fn test_move_resumes_after_tombstone_failure() {
        let memory = MemoryStore::new();
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let setup = PlanService::new(
            Arc::new(memory.clone()),
            broadcaster.clone(),
            Duration::from_secs(60),
        );
        setup.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        setup.add_activity("plan-1", "2025-01-01", add(2, "tram")).await.unwrap();

        let shift = || UpdateActivityRequest {
            by_user: "bob".into(),
            new_index: Some(5),
            activity_text: Some("tram 28".into()),
            ..Default::default()
        };
        let flaky = PlanService::new(
            Arc::new(FlakyStore::new(memory.clone(), 0)),
            broadcaster.clone(),
            Duration::from_secs(60),
        );
        assert_matches!(
            flaky.update_activity("plan-1", &key("2025-01-01", 2), shift()).await,
            Err(PlanError::PartialWrite { applied, failed, .. })
                if applied == vec!["date|2025-01-01|activity|5".to_string()]
                    && failed == "date|2025-01-01|activity|2"
        );
        assert!(memory.read("plan-1", "date|2025-01-01|activity|2").await.unwrap().is_some());
        assert!(memory.read("plan-1", "date|2025-01-01|activity|5").await.unwrap().is_some());
        assert_eq!(targets(&broadcaster).last(), Some(&EventTarget::ActivityAdded));

        let moved = setup
            .update_activity("plan-1", &key("2025-01-01", 2), shift())
            .await
            .unwrap();
        assert_eq!(moved.id, "date|2025-01-01|activity|5");
        assert_eq!(moved.activity_text, "tram 28");
        assert!(memory.is_tombstoned("plan-1", "date|2025-01-01|activity|2").await);
        assert_eq!(targets(&broadcaster).last(), Some(&EventTarget::ActivityMoved));
    }

    #[tokio::test]
    async fn test_move_to_missing_date() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        let shift = UpdateActivityRequest {
            by_user: "bob".into(),
            new_date: Some("2030-01-01".into()),
            ..Default::default()
        };
        assert_matches!(
            h.service.update_activity("plan-1", &key("2025-01-01", 0), shift).await,
            Err(PlanError::NotFound { resource: "date", .. })
        );
    }

    #[tokio::test]
    async fn test_lock_and_vote() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        let k = key("2025-01-01", 0);

        let lock = LockActivityRequest { by_user: "bob".into() };
        h.service.claim_lock("plan-1", &k, lock.clone()).await.unwrap();
        h.service.claim_lock("plan-1", &k, LockActivityRequest { by_user: "carol".into() }).await.unwrap();

        for (up, voter) in [(vec!["bob"], "bob"), (vec!["carol"], "carol")] {
            let vote = VoteActivityRequest {
                up_voters: up.into_iter().map(String::from).collect(),
                down_voters: vec![],
                voter: voter.into(),
            };
            h.service.record_vote("plan-1", &k, vote).await.unwrap();
        }

        let doc = h.store.read("plan-1", &k.id()).await.unwrap().unwrap();
        let stored: ActivityRecord = doc.decode().unwrap();
        assert_eq!(stored.up_voters, Some(vec!["carol".to_string()]));
        assert_eq!(stored.locked_by, None);
        assert_eq!(stored.last_updated_at, None);

        assert_matches!(
            h.service.claim_lock("plan-1", &key("2025-01-01", 9), lock).await,
            Err(PlanError::NotFound { resource: "activity", .. })
        );
    }

    #[tokio::test]
    async fn test_delete_plan_leaves_orphans_hidden() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        h.service.delete_plan("plan-1", "alice").await.unwrap();

        assert!(h.store.read("plan-1", "date|2025-01-01").await.unwrap().is_some());
        assert_matches!(
            h.service.get_plan("plan-1").await,
            Err(PlanError::NotFound { resource: "plan", .. })
        );
        assert_matches!(
            h.service.delete_plan("plan-1", "alice").await,
            Err(PlanError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_delete_activity() {
        let h = harness();
        h.service.create_plan(create_request(&["2025-01-01"])).await.unwrap();
        let msg = h
            .service
            .delete_activity("plan-1", &key("2025-01-01", 0), "bob")
            .await
            .unwrap();
        assert_eq!(msg.date_id, "2025-01-01");
        assert!(h.store.is_tombstoned("plan-1", "date|2025-01-01|activity|0").await);
        assert_matches!(
            h.service.delete_activity("plan-1", &key("2025-01-01", 0), "bob").await,
            Err(PlanError::NotFound { .. })
        );
    }

    #[tokio::test]
    async fn test_unknown_connection_is_not_found() {
        let hub = Arc::new(crate::backend::realtime::GroupHub::new(8));
        let service = PlanService::new(Arc::new(MemoryStore::new()), hub.clone(), Duration::from_secs(1));
        assert_matches!(
            service.register_connection("plan-1", "ghost").await,
            Err(PlanError::NotFound { resource: "connection", .. })
        );

        let connection_id = hub.connect().await;
        service.register_connection("plan-1", &connection_id).await.unwrap();
        assert_eq!(hub.group_size("plan-1").await, 1);
        service.unregister_connection("plan-1", &connection_id).await.unwrap();
        assert_eq!(hub.group_size("plan-1").await, 0);
    }
}
