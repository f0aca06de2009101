/**
 * Plan Change Events
 *
 * This module defines the events fanned out to every connection registered
 * in a plan's group. Each mutating operation maps to exactly one target name
 * with a fixed argument shape.
 *
 * # Wire Format
 *
 * ```json
 * {"target":"activityAdded","arguments":[{"id":2,"dateId":"2025-01-01","byUser":"alice"}],"timestamp":"..."}
 * ```
 */
use crate::shared::error::{PlanError, PlanResult};
use crate::shared::messages::{ActivityMovedMsg, ActivityMsg, DateMsg, PlanMsg, VoteMsg};
use crate::shared::model::PlanView;
use serde::{Deserialize, Serialize};

/// Broadcast target name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum EventTarget {
    PlanCreated,
    PlanDeleted,
    DateAdded,
    DateDeleted,
    ActivityAdded,
    ActivityDeleted,
    ActivityUpdated,
    ActivityMoved,
    LockActivity,
    VoteActivity,
}

impl EventTarget {
    /// Name clients register their handlers under
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlanCreated => "planCreated",
            Self::PlanDeleted => "planDeleted",
            Self::DateAdded => "dateAdded",
            Self::DateDeleted => "dateDeleted",
            Self::ActivityAdded => "activityAdded",
            Self::ActivityDeleted => "activityDeleted",
            Self::ActivityUpdated => "activityUpdated",
            Self::ActivityMoved => "activityMoved",
            Self::LockActivity => "lockActivity",
            Self::VoteActivity => "voteActivity",
        }
    }
}

/// Event delivered to every connection in `group`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanEvent {
    /// Target name
    pub target: EventTarget,
    /// Handler arguments
    pub arguments: Vec<serde_json::Value>,
    /// Destination group (the plan id); not part of the delivered payload
    #[serde(skip)]
    pub group: String,
    /// Timestamp when event occurred
    pub timestamp: String,
}

impl PlanEvent {
    /// Create a new event with a single argument
    pub fn new(target: EventTarget, group: impl Into<String>, argument: serde_json::Value) -> Self {
        Self {
            target,
            arguments: vec![argument],
            group: group.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn with_payload<T: Serialize>(
        target: EventTarget,
        group: &str,
        payload: &T,
    ) -> PlanResult<Self> {
        let argument = serde_json::to_value(payload)
            .map_err(|e| PlanError::event_encoding(target.as_str(), e))?;
        Ok(Self::new(target, group, argument))
    }

    pub fn plan_created(view: &PlanView) -> PlanResult<Self> {
        Self::with_payload(EventTarget::PlanCreated, &view.plan.plan_id, view)
    }

    pub fn plan_deleted(group: &str, msg: &PlanMsg) -> PlanResult<Self> {
        Self::with_payload(EventTarget::PlanDeleted, group, msg)
    }

    pub fn date_added(group: &str, msg: &DateMsg) -> PlanResult<Self> {
        Self::with_payload(EventTarget::DateAdded, group, msg)
    }

    pub fn date_deleted(group: &str, msg: &DateMsg) -> PlanResult<Self> {
        Self::with_payload(EventTarget::DateDeleted, group, msg)
    }

    pub fn activity_added(group: &str, msg: &ActivityMsg) -> PlanResult<Self> {
        Self::with_payload(EventTarget::ActivityAdded, group, msg)
    }

    pub fn activity_deleted(group: &str, msg: &ActivityMsg) -> PlanResult<Self> {
        Self::with_payload(EventTarget::ActivityDeleted, group, msg)
    }

    pub fn activity_updated(group: &str, msg: &ActivityMsg) -> PlanResult<Self> {
        Self::with_payload(EventTarget::ActivityUpdated, group, msg)
    }

    pub fn activity_moved(group: &str, msg: &ActivityMovedMsg) -> PlanResult<Self> {
        Self::with_payload(EventTarget::ActivityMoved, group, msg)
    }

    pub fn lock_activity(group: &str, msg: &ActivityMsg) -> PlanResult<Self> {
        Self::with_payload(EventTarget::LockActivity, group, msg)
    }

    pub fn vote_activity(group: &str, msg: &VoteMsg) -> PlanResult<Self> {
        Self::with_payload(EventTarget::VoteActivity, group, msg)
    }

    /// First argument, which every target carries
    pub fn payload(&self) -> &serde_json::Value {
        self.arguments.first().unwrap_or(&serde_json::Value::Null)
    }
}
