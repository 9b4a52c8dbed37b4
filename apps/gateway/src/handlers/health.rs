// [apps/gateway/src/handlers/health.rs]
use axum::Json;
use serde_json::{json, Value};

pub async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
