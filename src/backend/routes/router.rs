/**
 * Router Configuration
 *
 * This module combines the API routes, the health check and the HTTP
 * layers into a single Axum router.
 *
 * # Layers
 *
 * - `CorsLayer::permissive()` - browser clients are served from other origins
 * - `TraceLayer` - one span per request
 */
use crate::backend::error::BackendError;
use crate::backend::plans::handlers::health;
use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;
use axum::http::{StatusCode, Uri};
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = Router::new().route("/health", get(health));

    let router = configure_api_routes(router);

    let router = router.fallback(route_not_found);

    router
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// JSON 404 for paths no route matches
async fn route_not_found(uri: Uri) -> BackendError {
    BackendError::handler(StatusCode::NOT_FOUND, format!("no route for {}", uri.path()))
}
