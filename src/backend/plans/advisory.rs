//! Conflict advisory layer
//!
//! Editing locks are announcements only: claiming one writes nothing and
//! any number of clients may claim the same activity. Votes replace both
//! voter lists with what the caller sent; the last write wins.

use super::fanout::{ChangeSet, Write};
use crate::shared::messages::{ActivityMsg, VoteActivityRequest, VoteMsg};
use crate::shared::{ActivityRecord, Document, PlanEvent, PlanResult};

/// Announce that `holder` is editing the activity
pub fn claim_lock(activity: &ActivityRecord, holder: &str) -> PlanResult<(ActivityMsg, ChangeSet)> {
    let key = activity.key()?;
    let msg = ActivityMsg {
        id: key.index,
        date_id: key.calendar_key().to_string(),
        by_user: holder.to_string(),
        activity_text: None,
    };
    let event = PlanEvent::lock_activity(&activity.plan_id, &msg)?;
    Ok((msg, ChangeSet::announce(event)))
}

/// Overwrite both voter lists
pub fn record_vote(
    activity: &ActivityRecord,
    vote: &VoteActivityRequest,
) -> PlanResult<(ActivityRecord, ChangeSet)> {
    let key = activity.key()?;

    let mut record = activity.clone();
    record.up_voters = Some(vote.up_voters.clone());
    record.down_voters = Some(vote.down_voters.clone());
    let doc = Document::encode(&record.plan_id, &record.id, &record)?;

    let msg = VoteMsg {
        id: key.index,
        date_id: key.calendar_key().to_string(),
        up_voters: vote.up_voters.clone(),
        down_voters: vote.down_voters.clone(),
        voter: vote.voter.clone(),
    };
    let event = PlanEvent::vote_activity(&record.plan_id, &msg)?;
    Ok((record, ChangeSet::new(vec![Write::Replace(doc)], event)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::EventTarget;
    use chrono::Utc;

    fn activity() -> ActivityRecord {
        ActivityRecord::seed("plan-1", "date|2025-01-01", 4, "alice", Utc::now())
    }

    fn vote(up: &[&str], down: &[&str], voter: &str) -> VoteActivityRequest {
        VoteActivityRequest {
            up_voters: up.iter().map(|s| s.to_string()).collect(),
            down_voters: down.iter().map(|s| s.to_string()).collect(),
            voter: voter.into(),
        }
    }

    #[test]
    fn test_lock_writes_nothing() {
        let (msg, change) = claim_lock(&activity(), "bob").unwrap();
        assert!(change.writes.is_empty());
        assert_eq!(change.event.target, EventTarget::LockActivity);
        assert_eq!(msg.id, 4);
        assert_eq!(msg.date_id, "2025-01-01");
        assert_eq!(change.event.payload()["byUser"], "bob");
    }

    #[test]
    fn test_vote_replaces_lists() {
        let mut current = activity();
        current.up_voters = Some(vec!["zed".into()]);

        let (record, change) = record_vote(&current, &vote(&["bob"], &["carol"], "bob")).unwrap();
        assert_eq!(record.up_voters, Some(vec!["bob".to_string()]));
        assert_eq!(record.down_voters, Some(vec!["carol".to_string()]));
        assert_eq!(record.last_updated_at, None);
        assert_eq!(change.event.target, EventTarget::VoteActivity);
        assert_eq!(change.event.payload()["voter"], "bob");
    }

    #[test]
    fn test_vote_is_idempotent() {
        let request = vote(&["bob"], &[], "bob");
        let (first, _) = record_vote(&activity(), &request).unwrap();
        let (second, _) = record_vote(&first, &request).unwrap();
        assert_eq!(first, second);
    }
}
