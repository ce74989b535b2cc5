use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tracing::info;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health/", get(health))
}

async fn health() -> Json<Value> {
    info!("GET /api/health/ - Health check");
    Json(json!({ "status": "ok" }))
}
