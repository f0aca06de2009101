//! Ordered collection manager
//!
//! Builds the change sets that insert, move and delete activities and
//! dates. Nothing here touches the store: callers load the current records
//! and commit the returned `ChangeSet` through `Fanout`.
//!
//! A move is create-new then tombstone-old. When the target id equals the
//! current id the activity is replaced in place instead.

use super::fanout::{ChangeSet, Write};
use crate::shared::ids::{make_activity_id, ActivityKey};
use crate::shared::messages::{ActivityMovedMsg, ActivityMsg, DateMsg, PlanMsg};
use crate::shared::{ActivityRecord, DateRecord, Document, PlanEvent, PlanResult};
use chrono::{DateTime, Utc};

/// Field changes applied by an update or move
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityPatch {
    pub activity_text: Option<String>,
    pub by_user: String,
}

/// Create one activity at a caller-chosen index
pub fn insert_activity(
    date: &DateRecord,
    index: u64,
    created_by: &str,
    activity_text: Option<String>,
    now: DateTime<Utc>,
) -> PlanResult<(ActivityRecord, ChangeSet)> {
    let mut record = ActivityRecord::seed(&date.plan_id, &date.id, index, created_by, now);
    if let Some(text) = activity_text.clone() {
        record.activity_text = text;
    }

    let doc = Document::encode(&date.plan_id, &record.id, &record)?;
    let msg = ActivityMsg {
        id: index,
        date_id: date.calendar_key().to_string(),
        by_user: created_by.to_string(),
        activity_text,
    };
    let event = PlanEvent::activity_added(&date.plan_id, &msg)?;
    Ok((record, ChangeSet::new(vec![Write::Create(doc)], event)))
}

/// Move an activity to `(target_date_id, new_index)`, applying the patch
///
/// The target date must already be known to exist.
pub fn move_activity(
    old: &ActivityRecord,
    target_date_id: &str,
    new_index: u64,
    patch: &ActivityPatch,
    now: DateTime<Utc>,
) -> PlanResult<(ActivityRecord, ChangeSet)> {
    let old_key: ActivityKey = old.key()?;
    let new_key = ActivityKey::new(target_date_id, new_index);

    let mut record = old.clone();
    record.id = make_activity_id(target_date_id, new_index);
    if let Some(text) = &patch.activity_text {
        record.activity_text = text.clone();
    }
    record.last_updated_by = Some(patch.by_user.clone());
    record.last_updated_at = Some(now);

    let doc = Document::encode(&old.plan_id, &record.id, &record)?;

    if new_key == old_key {
        let msg = ActivityMsg {
            id: new_index,
            date_id: new_key.calendar_key().to_string(),
            by_user: patch.by_user.clone(),
            activity_text: Some(record.activity_text.clone()),
        };
        let event = PlanEvent::activity_updated(&old.plan_id, &msg)?;
        return Ok((record, ChangeSet::new(vec![Write::Replace(doc)], event)));
    }

    let msg = ActivityMovedMsg {
        old_id: old_key.index,
        old_date_id: old_key.calendar_key().to_string(),
        id: new_index,
        date_id: new_key.calendar_key().to_string(),
        by_user: patch.by_user.clone(),
        activity_text: Some(record.activity_text.clone()),
    };
    let event = PlanEvent::activity_moved(&old.plan_id, &msg)?;
    let writes = vec![Write::Relocate(doc), Write::tombstone(&old.plan_id, &old.id)];
    Ok((record, ChangeSet::new(writes, event)))
}

/// Tombstone every activity of a date in ascending index order, then the date
pub fn delete_date(
    date: &DateRecord,
    mut activities: Vec<ActivityKey>,
    by_user: &str,
) -> PlanResult<ChangeSet> {
    activities.sort();

    let mut writes: Vec<Write> = activities
        .iter()
        .map(|key| Write::tombstone(&date.plan_id, key.id()))
        .collect();
    writes.push(Write::tombstone(&date.plan_id, &date.id));

    let msg = DateMsg {
        id: date.calendar_key().to_string(),
        by_user: by_user.to_string(),
    };
    let event = PlanEvent::date_deleted(&date.plan_id, &msg)?;
    Ok(ChangeSet::new(writes, event))
}

/// Tombstone one activity
pub fn delete_activity(plan_id: &str, key: &ActivityKey, by_user: &str) -> PlanResult<ChangeSet> {
    let msg = ActivityMsg {
        id: key.index,
        date_id: key.calendar_key().to_string(),
        by_user: by_user.to_string(),
        activity_text: None,
    };
    let event = PlanEvent::activity_deleted(plan_id, &msg)?;
    Ok(ChangeSet::new(vec![Write::tombstone(plan_id, key.id())], event))
}

/// Tombstone the plan root only; dates and activities are left in place
pub fn delete_plan(plan_id: &str, by_user: &str) -> PlanResult<ChangeSet> {
    let msg = PlanMsg {
        id: plan_id.to_string(),
        by_user: by_user.to_string(),
    };
    let event = PlanEvent::plan_deleted(plan_id, &msg)?;
    Ok(ChangeSet::new(vec![Write::tombstone(plan_id, plan_id)], event))
}
