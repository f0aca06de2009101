/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` holds:
 * - `PlanService` - plan operations over the store and the hub
 * - `GroupHub` - connection registry and group membership
 * - `AppConfig` - effective configuration
 *
 * # State Extraction
 *
 * Handlers extract only what they use:
 *
 * ```rust,no_run
 * use plansync::backend::plans::PlanService;
 * use axum::extract::State;
 *
 * async fn handler(State(plans): State<PlanService>) {
 *     let _ = plans.get_plan("f7873135").await;
 * }
 * ```
 */
use crate::backend::plans::PlanService;
use crate::backend::realtime::GroupHub;
use crate::backend::store::DocumentStore;
use crate::shared::AppConfig;
use axum::extract::FromRef;
use std::sync::Arc;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Plan operations
    pub plans: PlanService,

    /// Connection registry and groups; also the service's broadcaster
    pub hub: Arc<GroupHub>,

    /// Document store, kept for background maintenance
    pub store: Arc<dyn DocumentStore>,

    /// Effective configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wire a store and a hub into a plan service
    pub fn new(store: Arc<dyn DocumentStore>, hub: Arc<GroupHub>, config: AppConfig) -> Self {
        let plans = PlanService::new(store.clone(), hub.clone(), config.tombstone_ttl);
        Self {
            plans,
            hub,
            store,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for PlanService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.plans.clone()
    }
}

impl FromRef<AppState> for Arc<GroupHub> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}

impl FromRef<AppState> for Arc<AppConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
