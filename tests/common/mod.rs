//! Common test utilities and helpers
//!
//! Builds an in-process server over an in-memory store so tests can drive
//! the HTTP surface and inspect the store and the hub directly.

#![allow(dead_code)]

use axum_test::TestServer;
use plansync::backend::realtime::GroupHub;
use plansync::backend::routes::create_router;
use plansync::backend::server::AppState;
use plansync::backend::store::{DocumentStore, MemoryStore};
use plansync::shared::AppConfig;
use serde_json::{json, Value};
use std::sync::Arc;

pub const PLAN_ID: &str = "f7873135-plan";

/// Server plus handles on its collaborators
pub struct TestApp {
    pub server: TestServer,
    pub store: MemoryStore,
    pub hub: Arc<GroupHub>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let hub = Arc::new(GroupHub::new(64));
        let state = AppState::new(Arc::new(store.clone()), hub.clone(), AppConfig::default());
        let server = TestServer::new(create_router(state)).unwrap();
        Self { server, store, hub }
    }

    /// Create `PLAN_ID` with the given calendar keys
    pub async fn create_plan(&self, dates: &[&str]) -> Value {
        let response = self
            .server
            .post("/api/createPlan")
            .json(&create_plan_body(PLAN_ID, dates))
            .await;
        response.assert_status_ok();
        response.json::<Value>()
    }

    pub async fn add_activity(&self, date: &str, index: u64, text: &str) {
        self.server
            .post(&format!("/api/addActivity/{}/{}", PLAN_ID, date))
            .json(&json!({"id": index, "createdBy": "alice", "activityText": text}))
            .await
            .assert_status_ok();
    }

    pub async fn get_plan(&self) -> Value {
        let response = self.server.get(&format!("/api/getPlan/{}", PLAN_ID)).await;
        response.assert_status_ok();
        response.json::<Value>()["data"].clone()
    }

    pub async fn is_live(&self, id: &str) -> bool {
        self.store.read(PLAN_ID, id).await.unwrap().is_some()
    }
}

pub fn create_plan_body(uuid: &str, dates: &[&str]) -> Value {
    json!({
        "uuid": uuid,
        "planName": "Lisbon long weekend",
        "createdBy": "alice",
        "dates": dates.iter().map(|d| json!({"id": d})).collect::<Vec<_>>(),
    })
}

/// Activity texts of one date in view order
pub fn texts(plan: &Value, date_index: usize) -> Vec<String> {
    plan["dates"][date_index]["activities"]
        .as_array()
        .map(|activities| {
            activities
                .iter()
                .map(|a| a["activityText"].as_str().unwrap_or_default().to_string())
                .collect()
        })
        .unwrap_or_default()
}
