use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let uptime = chrono::Utc::now()
        .signed_duration_since(state.started_at)
        .num_seconds()
        .max(0);

    Json(json!({
        "status": "ok",
        "name": state.package.name,
        "version": state.package.version,
        "server": state.package.server,
        "startedAt": state.started_at.to_rfc3339(),
        "uptimeSeconds": uptime,
    }))
}
