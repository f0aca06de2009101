//! Request bodies and broadcast payloads
//!
//! Field names match what browser clients send and listen for, so every type
//! here is camelCase on the wire. Request types carry a `validate` method for
//! the field-presence checks serde cannot express.

use crate::shared::error::{PlanError, PlanResult};
use serde::{Deserialize, Serialize};

fn require(field: &str, value: &str) -> PlanResult<()> {
    if value.trim().is_empty() {
        return Err(PlanError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// One date of a plan being created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateSeed {
    /// Calendar key, e.g. `2025-01-01`
    pub id: String,
}

/// Body of `POST /api/createPlan`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub plan_name: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub dates: Vec<DateSeed>,
}

impl CreatePlanRequest {
    pub fn validate(&self) -> PlanResult<()> {
        require("uuid", &self.uuid)?;
        require("planName", &self.plan_name)?;
        require("createdBy", &self.created_by)?;
        if self.dates.is_empty() {
            return Err(PlanError::validation("dates", "a plan needs at least one date"));
        }
        let mut seen = std::collections::HashSet::new();
        for date in &self.dates {
            require("dates[].id", &date.id)?;
            if !seen.insert(date.id.trim()) {
                return Err(PlanError::validation(
                    "dates",
                    format!("duplicate date '{}'", date.id),
                ));
            }
        }
        Ok(())
    }
}

/// Body of `POST /api/addDate/{planId}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDateRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created_by: String,
}

impl AddDateRequest {
    pub fn validate(&self) -> PlanResult<()> {
        require("id", &self.id)?;
        require("createdBy", &self.created_by)
    }
}

/// Body of `POST /api/addActivity/{planId}/{dateKey}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddActivityRequest {
    /// Position index chosen by the client
    pub id: u64,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub activity_text: Option<String>,
}

impl AddActivityRequest {
    pub fn validate(&self) -> PlanResult<()> {
        require("createdBy", &self.created_by)
    }
}

/// Body of `PUT /api/updateActivity/{planId}/{dateKey}/{index}`
///
/// Any combination of new text, new index and new date; at least one must be
/// present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityRequest {
    #[serde(default)]
    pub by_user: String,
    #[serde(default)]
    pub activity_text: Option<String>,
    #[serde(default)]
    pub new_index: Option<u64>,
    /// Calendar key of the date to move to
    #[serde(default)]
    pub new_date: Option<String>,
}

impl UpdateActivityRequest {
    pub fn validate(&self) -> PlanResult<()> {
        require("byUser", &self.by_user)?;
        if self.activity_text.is_none() && self.new_index.is_none() && self.new_date.is_none() {
            return Err(PlanError::validation(
                "body",
                "one of activityText, newIndex or newDate is required",
            ));
        }
        Ok(())
    }
}

/// Body of `POST /api/lockActivity/{planId}/{dateKey}/{index}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockActivityRequest {
    #[serde(default)]
    pub by_user: String,
}

impl LockActivityRequest {
    pub fn validate(&self) -> PlanResult<()> {
        require("byUser", &self.by_user)
    }
}

/// Body of `POST /api/voteActivity/{planId}/{dateKey}/{index}`
///
/// The lists are the complete post-vote sets computed by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteActivityRequest {
    #[serde(default)]
    pub up_voters: Vec<String>,
    #[serde(default)]
    pub down_voters: Vec<String>,
    #[serde(default)]
    pub voter: String,
}

impl VoteActivityRequest {
    pub fn validate(&self) -> PlanResult<()> {
        require("voter", &self.voter)
    }
}

/// `planDeleted` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanMsg {
    pub id: String,
    pub by_user: String,
}

/// `dateAdded` / `dateDeleted` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateMsg {
    /// Calendar key
    pub id: String,
    pub by_user: String,
}

/// `activityAdded` / `activityDeleted` / `activityUpdated` / `lockActivity` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMsg {
    /// Position index
    pub id: u64,
    /// Calendar key of the containing date
    pub date_id: String,
    pub by_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_text: Option<String>,
}

/// `activityMoved` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityMovedMsg {
    pub old_id: u64,
    pub old_date_id: String,
    pub id: u64,
    pub date_id: String,
    pub by_user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_text: Option<String>,
}

/// `voteActivity` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteMsg {
    pub id: u64,
    pub date_id: String,
    pub up_voters: Vec<String>,
    pub down_voters: Vec<String>,
    pub voter: String,
}

/// Response of `/api/negotiate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub connection_id: String,
    /// Event stream the client should open
    pub url: String,
}
