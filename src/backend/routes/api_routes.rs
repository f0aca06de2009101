/**
 * API Routes
 *
 * This module registers the endpoints under the `/api` prefix.
 *
 * # Routes
 *
 * ## Plans
 * - `POST /api/createPlan`
 * - `GET /api/getPlan/{planId}`
 * - `DELETE /api/deletePlan/{planId}/{byUser}`
 *
 * ## Dates
 * - `POST /api/addDate/{planId}`
 * - `DELETE /api/deleteDate/{planId}/{dateKey}/{byUser}`
 *
 * ## Activities
 * - `POST /api/addActivity/{planId}/{dateKey}`
 * - `DELETE /api/deleteActivity/{planId}/{dateKey}/{index}/{byUser}`
 * - `PUT /api/updateActivity/{planId}/{dateKey}/{index}`
 * - `POST /api/lockActivity/{planId}/{dateKey}/{index}`
 * - `POST /api/voteActivity/{planId}/{dateKey}/{index}`
 *
 * ## Connections
 * - `GET|POST /api/negotiate`
 * - `GET /api/events/{connectionId}`
 * - `GET /api/registerUser`
 * - `GET /api/unregisterUser`
 */
use crate::backend::plans::handlers;
use crate::backend::realtime::handle_event_stream;
use crate::backend::server::state::AppState;
use axum::{
    routing::{delete, get, post, put},
    Router,
};

/// Configure API routes
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        // Plans
        .route("/api/createPlan", post(handlers::create_plan))
        .route("/api/getPlan/{plan_id}", get(handlers::get_plan))
        .route("/api/deletePlan/{plan_id}/{by_user}", delete(handlers::delete_plan))
        // Dates
        .route("/api/addDate/{plan_id}", post(handlers::add_date))
        .route(
            "/api/deleteDate/{plan_id}/{date_key}/{by_user}",
            delete(handlers::delete_date),
        )
        // Activities
        .route(
            "/api/addActivity/{plan_id}/{date_key}",
            post(handlers::add_activity),
        )
        .route(
            "/api/deleteActivity/{plan_id}/{date_key}/{index}/{by_user}",
            delete(handlers::delete_activity),
        )
        .route(
            "/api/updateActivity/{plan_id}/{date_key}/{index}",
            put(handlers::update_activity),
        )
        .route(
            "/api/lockActivity/{plan_id}/{date_key}/{index}",
            post(handlers::lock_activity),
        )
        .route(
            "/api/voteActivity/{plan_id}/{date_key}/{index}",
            post(handlers::vote_activity),
        )
        // Connections
        .route(
            "/api/negotiate",
            get(handlers::negotiate).post(handlers::negotiate),
        )
        .route("/api/events/{connection_id}", get(handle_event_stream))
        .route("/api/registerUser", get(handlers::register_user))
        .route("/api/unregisterUser", get(handlers::unregister_user))
}
