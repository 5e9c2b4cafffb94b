pub mod auth;

use axum::Json;
use serde_json::{json, Value};

/// Liveness probe; touches no state.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}
