/**
 * Plan Document Model
 *
 * This module defines the records stored for a plan and the nested view
 * returned to clients.
 *
 * # Storage Shape
 *
 * Every record is stored as a JSON `Document` keyed by `(partition_key, id)`,
 * where the partition key is the plan id. Field names are camelCase on the
 * wire and in storage.
 *
 * # Views
 *
 * `PlanView` is assembled from the three record kinds: dates sorted by
 * calendar key, activities sorted by numeric index within their date.
 */
use crate::shared::error::{PlanResult, StoreError};
use crate::shared::ids::{make_activity_id, ActivityKey, DATE_PREFIX};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A stored JSON document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Partition the document lives in (the plan id)
    pub partition_key: String,
    /// Document id, unique within the partition
    pub id: String,
    /// Record fields
    pub body: serde_json::Value,
}

impl Document {
    /// Encode a record into a document
    pub fn encode<T: Serialize>(
        partition_key: impl Into<String>,
        id: impl Into<String>,
        record: &T,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            partition_key: partition_key.into(),
            id: id.into(),
            body: serde_json::to_value(record)?,
        })
    }

    /// Decode the document body into a record
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        serde_json::from_value(self.body.clone()).map_err(|e| {
            StoreError::encoding(format!("document '{}': {}", self.id, e))
        })
    }
}

/// Root record of a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRecord {
    pub id: String,
    pub plan_id: String,
    pub plan_name: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
}

/// A dated list within a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRecord {
    /// `date|<calendarKey>`
    pub id: String,
    pub plan_id: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl DateRecord {
    /// Calendar key this date was created from
    pub fn calendar_key(&self) -> &str {
        self.id.strip_prefix(DATE_PREFIX).unwrap_or(&self.id)
    }
}

/// An ordered item within a date
///
/// The position is not stored as a field: it is the index embedded in `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
    /// `date|<calendarKey>|activity|<index>`
    pub id: String,
    pub plan_id: String,
    #[serde(default)]
    pub activity_text: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub up_voters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_voters: Option<Vec<String>>,
    /// Carried through rewrites; the server never sets it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked_by: Option<String>,
}

impl ActivityRecord {
    /// Fresh activity with empty text and no votes
    pub fn seed(
        plan_id: &str,
        date_id: &str,
        index: u64,
        created_by: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: make_activity_id(date_id, index),
            plan_id: plan_id.to_string(),
            activity_text: String::new(),
            created_by: created_by.to_string(),
            created_at: now,
            last_updated_by: None,
            last_updated_at: None,
            up_voters: None,
            down_voters: None,
            locked_by: None,
        }
    }

    /// Parsed date id and index
    pub fn key(&self) -> PlanResult<ActivityKey> {
        self.id.parse()
    }
}

/// A date together with its ordered activities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateView {
    #[serde(flatten)]
    pub date: DateRecord,
    pub activities: Vec<ActivityRecord>,
}

/// A whole plan as returned by `getPlan` and broadcast by `planCreated`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub plan: PlanRecord,
    pub dates: Vec<DateView>,
}

impl PlanView {
    /// Total number of activities across all dates
    pub fn activity_count(&self) -> usize {
        self.dates.iter().map(|d| d.activities.len()).sum()
    }
}
