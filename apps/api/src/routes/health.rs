use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
pub async fn root_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": "Cover letter service is running",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.config.openai_model,
        "embedder": state.vector_store.embedder().name(),
    }))
}

/// GET /health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "coverletter"
    }))
}
