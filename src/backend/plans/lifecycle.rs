/**
 * Plan Lifecycle
 *
 * This module builds the documents of a new plan or date and assembles the
 * nested `PlanView` from the three kinds of documents in a partition.
 *
 * # Seeding
 *
 * Every date starts with one empty activity at index 0, both when the plan
 * is created and when a date is added later.
 *
 * # Assembly
 *
 * - Dates sort by calendar key
 * - Activities sort by `(dateId, index)`, with the index compared as an integer
 * - Activities whose date is missing are dropped with a warning
 * - A missing plan document is `NotFound`, even if dates or activities remain
 */
use super::fanout::{ChangeSet, Write};
use crate::shared::ids::{make_date_id, make_plan_id, ActivityKey};
use crate::shared::messages::{AddDateRequest, CreatePlanRequest, DateMsg};
use crate::shared::{
    ActivityRecord, DateRecord, DateView, Document, PlanError, PlanEvent, PlanRecord, PlanResult,
    PlanView,
};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

fn seeded_date(plan_id: &str, date_id: String, created_by: &str, now: DateTime<Utc>) -> DateView {
    let seed = ActivityRecord::seed(plan_id, &date_id, 0, created_by, now);
    DateView {
        date: DateRecord {
            id: date_id,
            plan_id: plan_id.to_string(),
            created_by: created_by.to_string(),
            created_at: now,
        },
        activities: vec![seed],
    }
}

fn date_documents(view: &DateView) -> PlanResult<Vec<Document>> {
    let mut docs = Vec::with_capacity(1 + view.activities.len());
    docs.push(Document::encode(&view.date.plan_id, &view.date.id, &view.date)?);
    for activity in &view.activities {
        docs.push(Document::encode(&activity.plan_id, &activity.id, activity)?);
    }
    Ok(docs)
}

/// Build a plan with its dates and seed activities as one batch
pub fn create_plan(request: &CreatePlanRequest, now: DateTime<Utc>) -> PlanResult<(PlanView, ChangeSet)> {
    request.validate()?;
    let plan_id = make_plan_id(&request.uuid)?;
    let created_by = request.created_by.trim();

    let plan = PlanRecord {
        id: plan_id.clone(),
        plan_id: plan_id.clone(),
        plan_name: request.plan_name.trim().to_string(),
        created_by: created_by.to_string(),
        created_at: now,
        last_updated_by: None,
        last_updated_at: None,
    };

    let mut dates = Vec::with_capacity(request.dates.len());
    for seed in &request.dates {
        dates.push(seeded_date(&plan_id, make_date_id(&seed.id)?, created_by, now));
    }
    dates.sort_by(|a, b| a.date.id.cmp(&b.date.id));

    let mut docs = vec![Document::encode(&plan_id, &plan_id, &plan)?];
    for date in &dates {
        docs.extend(date_documents(date)?);
    }

    let view = PlanView { plan, dates };
    let event = PlanEvent::plan_created(&view)?;
    let change = ChangeSet::new(
        vec![Write::CreateBatch {
            resource: "plan",
            docs,
        }],
        event,
    );
    Ok((view, change))
}

/// Build a new date with its seed activity as one batch
pub fn add_date(
    plan: &PlanRecord,
    request: &AddDateRequest,
    now: DateTime<Utc>,
) -> PlanResult<(DateView, ChangeSet)> {
    request.validate()?;
    let created_by = request.created_by.trim();
    let view = seeded_date(&plan.plan_id, make_date_id(&request.id)?, created_by, now);

    let msg = DateMsg {
        id: view.date.calendar_key().to_string(),
        by_user: created_by.to_string(),
    };
    let event = PlanEvent::date_added(&plan.plan_id, &msg)?;
    let change = ChangeSet::new(
        vec![Write::CreateBatch {
            resource: "date",
            docs: date_documents(&view)?,
        }],
        event,
    );
    Ok((view, change))
}

/// Assemble the nested view from the partition's documents
pub fn assemble_plan(
    plan_id: &str,
    plan: Option<Document>,
    dates: Vec<Document>,
    activities: Vec<Document>,
) -> PlanResult<PlanView> {
    let Some(plan) = plan else {
        if !dates.is_empty() || !activities.is_empty() {
            tracing::warn!(
                "[Plans] Plan '{}' is missing but {} dates and {} activities remain in its partition",
                plan_id,
                dates.len(),
                activities.len()
            );
        }
        return Err(PlanError::not_found("plan", plan_id));
    };
    let plan: PlanRecord = plan.decode()?;

    let mut grouped: BTreeMap<String, DateView> = BTreeMap::new();
    for doc in &dates {
        let date: DateRecord = doc.decode()?;
        grouped.insert(
            doc.id.clone(),
            DateView {
                date,
                activities: Vec::new(),
            },
        );
    }

    let mut keyed: Vec<(ActivityKey, ActivityRecord)> = Vec::with_capacity(activities.len());
    for doc in &activities {
        let key: ActivityKey = doc.id.parse()?;
        keyed.push((key, doc.decode()?));
    }
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    for (key, activity) in keyed {
        match grouped.get_mut(&key.date_id) {
            Some(view) => view.activities.push(activity),
            None => tracing::warn!(
                "[Plans] Dropping activity '{}' of plan '{}': its date is missing",
                activity.id,
                plan_id
            ),
        }
    }

    Ok(PlanView {
        plan,
        dates: grouped.into_values().collect(),
    })
}
