/**
 * Plan HTTP Handlers
 *
 * This module implements the axum handlers behind the `/api` prefix. Each handler
 * parses its path, query and JSON body, calls `PlanService`, and wraps the
 * result as `{"data": ...}`.
 *
 * # Request Bodies
 *
 * Bodies are read as raw bytes and parsed with `serde_json`, so a malformed
 * body becomes a `Validation` error on the `body` field rather than axum's
 * plain-text rejection.
 *
 * # Example
 *
 * ```http
 * POST /api/addActivity/f7873135/2025-01-01 HTTP/1.1
 * Content-Type: application/json
 *
 * {"id":2,"createdBy":"alice","activityText":"Museum"}
 * ```
 */
use crate::backend::error::BackendError;
use crate::backend::plans::service::PlanService;
use crate::backend::server::state::AppState;
use crate::shared::ids::ActivityKey;
use crate::shared::messages::{
    ActivityMsg, AddActivityRequest, AddDateRequest, ConnectionInfo, CreatePlanRequest, DateMsg,
    LockActivityRequest, PlanMsg, UpdateActivityRequest, VoteActivityRequest,
};
use crate::shared::{ActivityRecord, DateView, PlanError, PlanResult, PlanView};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Json,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

/// Success envelope
#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

type ApiResult<T> = Result<Json<Data<T>>, BackendError>;

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(Data { data }))
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> PlanResult<T> {
    serde_json::from_slice(body).map_err(|e| PlanError::validation("body", e.to_string()))
}

fn query_param<'a>(query: &'a HashMap<String, String>, name: &str) -> PlanResult<&'a str> {
    query
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| PlanError::validation(name, "query parameter is required"))
}

/// POST /api/createPlan
pub async fn create_plan(State(plans): State<PlanService>, body: Bytes) -> ApiResult<PlanView> {
    let request: CreatePlanRequest = parse_body(&body)?;
    ok(plans.create_plan(request).await?)
}

/// GET /api/getPlan/{planId}
pub async fn get_plan(
    State(plans): State<PlanService>,
    Path(plan_id): Path<String>,
) -> ApiResult<PlanView> {
    ok(plans.get_plan(&plan_id).await?)
}

/// DELETE /api/deletePlan/{planId}/{byUser}
pub async fn delete_plan(
    State(plans): State<PlanService>,
    Path((plan_id, by_user)): Path<(String, String)>,
) -> ApiResult<PlanMsg> {
    ok(plans.delete_plan(&plan_id, &by_user).await?)
}

/// POST /api/addDate/{planId}
pub async fn add_date(
    State(plans): State<PlanService>,
    Path(plan_id): Path<String>,
    body: Bytes,
) -> ApiResult<DateView> {
    let request: AddDateRequest = parse_body(&body)?;
    ok(plans.add_date(&plan_id, request).await?)
}

/// DELETE /api/deleteDate/{planId}/{dateKey}/{byUser}
pub async fn delete_date(
    State(plans): State<PlanService>,
    Path((plan_id, date_key, by_user)): Path<(String, String, String)>,
) -> ApiResult<DateMsg> {
    ok(plans.delete_date(&plan_id, &date_key, &by_user).await?)
}

/// POST /api/addActivity/{planId}/{dateKey}
pub async fn add_activity(
    State(plans): State<PlanService>,
    Path((plan_id, date_key)): Path<(String, String)>,
    body: Bytes,
) -> ApiResult<ActivityRecord> {
    let request: AddActivityRequest = parse_body(&body)?;
    ok(plans.add_activity(&plan_id, &date_key, request).await?)
}

/// DELETE /api/deleteActivity/{planId}/{dateKey}/{index}/{byUser}
pub async fn delete_activity(
    State(plans): State<PlanService>,
    Path((plan_id, date_key, index, by_user)): Path<(String, String, String, String)>,
) -> ApiResult<ActivityMsg> {
    let key = ActivityKey::from_parts(&date_key, &index)?;
    ok(plans.delete_activity(&plan_id, &key, &by_user).await?)
}

/// PUT /api/updateActivity/{planId}/{dateKey}/{index}
pub async fn update_activity(
    State(plans): State<PlanService>,
    Path((plan_id, date_key, index)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult<ActivityRecord> {
    let key = ActivityKey::from_parts(&date_key, &index)?;
    let request: UpdateActivityRequest = parse_body(&body)?;
    ok(plans.update_activity(&plan_id, &key, request).await?)
}

/// POST /api/lockActivity/{planId}/{dateKey}/{index}
pub async fn lock_activity(
    State(plans): State<PlanService>,
    Path((plan_id, date_key, index)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult<ActivityMsg> {
    let key = ActivityKey::from_parts(&date_key, &index)?;
    let request: LockActivityRequest = parse_body(&body)?;
    ok(plans.claim_lock(&plan_id, &key, request).await?)
}

/// POST /api/voteActivity/{planId}/{dateKey}/{index}
pub async fn vote_activity(
    State(plans): State<PlanService>,
    Path((plan_id, date_key, index)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult<ActivityRecord> {
    let key = ActivityKey::from_parts(&date_key, &index)?;
    let request: VoteActivityRequest = parse_body(&body)?;
    ok(plans.record_vote(&plan_id, &key, request).await?)
}

/// GET /api/registerUser?planId=..&connectionId=..
pub async fn register_user(
    State(plans): State<PlanService>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<serde_json::Value> {
    let plan_id = query_param(&query, "planId")?;
    let connection_id = query_param(&query, "connectionId")?;
    plans.register_connection(plan_id, connection_id).await?;
    ok(serde_json::json!({ "planId": plan_id, "connectionId": connection_id }))
}

/// GET /api/unregisterUser?planId=..&connectionId=..
pub async fn unregister_user(
    State(plans): State<PlanService>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<serde_json::Value> {
    let plan_id = query_param(&query, "planId")?;
    let connection_id = query_param(&query, "connectionId")?;
    plans.unregister_connection(plan_id, connection_id).await?;
    ok(serde_json::json!({ "planId": plan_id, "connectionId": connection_id }))
}

/// GET|POST /api/negotiate
///
/// Allocates a connection id and returns the event stream to open.
pub async fn negotiate(State(state): State<AppState>) -> ApiResult<ConnectionInfo> {
    let connection_id = state.hub.connect().await;
    let base = state
        .config
        .public_url
        .as_deref()
        .unwrap_or("")
        .trim_end_matches('/');
    let url = format!("{}/api/events/{}", base, connection_id);
    tracing::info!("[Realtime] Negotiated connection {}", connection_id);
    ok(ConnectionInfo { connection_id, url })
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
