use axum::Json;
use serde_json::{Value, json};

/// API index listing the available endpoints
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": "cinder",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "voices": "GET /api/voices",
            "generate": "POST /api/generate",
            "download": "GET /api/download/{file_id}",
            "status": "GET /api/status/{file_id}",
        },
        "status": "operational",
    }))
}
