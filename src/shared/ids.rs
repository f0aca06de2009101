//! Hierarchical document keys
//!
//! Every document of a plan lives in the partition named by the plan id. The
//! document id encodes containment and order:
//!
//! ```text
//! <planId>                             plan
//! date|<calendarKey>                   date
//! date|<calendarKey>|activity|<index>  activity
//! ```
//!
//! The activity index embedded in the id is the sort key and the uniqueness
//! constraint within a date. Indices always compare as integers.

use crate::shared::error::{PlanError, PlanResult};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Prefix of every date id
pub const DATE_PREFIX: &str = "date|";

/// Separator between a date id and an activity index
pub const ACTIVITY_SEPARATOR: &str = "|activity|";

const RESERVED: [char; 2] = ['|', '/'];

fn check_segment(field: &str, value: &str) -> PlanResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PlanError::validation(field, "must not be empty"));
    }
    if value.contains(RESERVED) {
        return Err(PlanError::validation(
            field,
            "must not contain '|' or '/'",
        ));
    }
    Ok(value.to_string())
}

/// Derive the plan id (and partition key) from the caller's external identifier
pub fn make_plan_id(uuid: &str) -> PlanResult<String> {
    check_segment("uuid", uuid)
}

/// Derive a date id from a caller-supplied calendar key
pub fn make_date_id(calendar_key: &str) -> PlanResult<String> {
    Ok(format!("{}{}", DATE_PREFIX, check_segment("calendarKey", calendar_key)?))
}

/// Derive an activity id from its date id and position index
pub fn make_activity_id(date_id: &str, index: u64) -> String {
    format!("{}{}{}", date_id, ACTIVITY_SEPARATOR, index)
}

/// Prefix shared by every activity of a date
pub fn activity_prefix(date_id: &str) -> String {
    format!("{}{}", date_id, ACTIVITY_SEPARATOR)
}

/// Extract the calendar key from a date id
pub fn parse_date_id(id: &str) -> PlanResult<&str> {
    match id.strip_prefix(DATE_PREFIX) {
        Some(key) if !key.is_empty() && !key.contains(RESERVED) => Ok(key),
        _ => Err(PlanError::malformed(id, "expected 'date|<calendarKey>'")),
    }
}

/// Split an activity id into its date id and index
pub fn parse_activity_id(id: &str) -> PlanResult<(String, u64)> {
    let key: ActivityKey = id.parse()?;
    Ok((key.date_id, key.index))
}

fn parse_index(id: &str, raw: &str) -> PlanResult<u64> {
    let canonical = !raw.is_empty()
        && raw.bytes().all(|b| b.is_ascii_digit())
        && (raw == "0" || !raw.starts_with('0'));
    if !canonical {
        return Err(PlanError::malformed(
            id,
            format!("index '{}' is not a canonical non-negative integer", raw),
        ));
    }
    raw.parse::<u64>()
        .map_err(|e| PlanError::malformed(id, format!("index '{}': {}", raw, e)))
}

/// Parsed activity id
///
/// Ordering compares the date id first and then the numeric index, so
/// `...|activity|2` sorts before `...|activity|10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivityKey {
    /// Id of the containing date (`date|<calendarKey>`)
    pub date_id: String,
    /// Position within the date
    pub index: u64,
}

impl ActivityKey {
    pub fn new(date_id: impl Into<String>, index: u64) -> Self {
        Self {
            date_id: date_id.into(),
            index,
        }
    }

    /// Calendar key of the containing date
    pub fn calendar_key(&self) -> &str {
        self.date_id.strip_prefix(DATE_PREFIX).unwrap_or(&self.date_id)
    }

    /// Full document id
    pub fn id(&self) -> String {
        make_activity_id(&self.date_id, self.index)
    }

    /// Build a key from a calendar key and an unparsed index
    pub fn from_parts(calendar_key: &str, raw_index: &str) -> PlanResult<Self> {
        let date_id = make_date_id(calendar_key)?;
        let id = format!("{}{}{}", date_id, ACTIVITY_SEPARATOR, raw_index);
        let index = parse_index(&id, raw_index.trim())?;
        Ok(Self::new(date_id, index))
    }
}

impl fmt::Display for ActivityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.date_id, ACTIVITY_SEPARATOR, self.index)
    }
}

impl FromStr for ActivityKey {
    type Err = PlanError;

    fn from_str(id: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = id.split('|').collect();
        match segments.as_slice() {
            ["date", calendar_key, "activity", raw_index] if !calendar_key.is_empty() => {
                let index = parse_index(id, raw_index)?;
                Ok(Self::new(format!("{}{}", DATE_PREFIX, calendar_key), index))
            }
            _ => Err(PlanError::malformed(
                id,
                "expected 'date|<calendarKey>|activity|<index>'",
            )),
        }
    }
}

impl PartialOrd for ActivityKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ActivityKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date_id
            .cmp(&other.date_id)
            .then(self.index.cmp(&other.index))
    }
}

/// Kind of document, derived from the shape of its id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Plan,
    Date,
    Activity,
}

impl DocumentKind {
    /// Classify a document id within a plan partition
    pub fn of(id: &str) -> Self {
        if !id.starts_with(DATE_PREFIX) {
            Self::Plan
        } else if id.contains(ACTIVITY_SEPARATOR) {
            Self::Activity
        } else {
            Self::Date
        }
    }

    /// Resource name used in error messages
    pub fn resource(&self) -> &'static str {
        match self {
            Self::Plan => "plan",
            Self::Date => "date",
            Self::Activity => "activity",
        }
    }
}
