use std::sync::Arc;

use axum::{Json, extract::State};
use jiff::Timestamp;
use serde_json::{Value, json};

/// Health check handler
///
/// Reports the number of artifacts currently tracked by the store.
pub async fn health_handler(State(server): State<Arc<tts::Server>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Timestamp::now(),
        "temp_files": server.store().len().await,
        "service": "cinder",
    }))
}
