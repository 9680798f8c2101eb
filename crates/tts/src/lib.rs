#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod error;
mod fetch;
mod generator;
mod request;
mod segment;
mod server;
pub mod store;
pub mod transport;
mod types;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use cinder_core::Voice;

pub use error::{Result, StoreError, TtsError};
pub use fetch::Fetcher;
pub use generator::{Generator, Synthesis};
use request::ExtractPayload;
pub use segment::{normalize, segment};
pub use server::{Server, TtsServerBuilder};
pub use types::{AudioDownload, GenerateData, GenerateRequest, GenerateResponse, GenerateResult, VoicesResponse};

/// Build the TTS server from configuration
pub async fn build_server(config: &cinder_config::Config) -> anyhow::Result<Arc<Server>> {
    let server = Arc::new(
        TtsServerBuilder::new(config)
            .build()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize TTS server: {e}"))?,
    );
    Ok(server)
}

/// Create the endpoint router for TTS
pub fn endpoint_router() -> Router<Arc<Server>> {
    Router::new()
        .route("/api/voices", get(list_voices))
        .route("/api/generate", post(generate))
        .route("/api/download/{id}", get(download))
        .route("/api/status/{id}", get(status))
}

async fn list_voices(State(server): State<Arc<Server>>) -> Json<VoicesResponse> {
    let voices = Voice::catalog();

    Json(VoicesResponse {
        count: voices.len(),
        voices,
        default: server.default_voice(),
    })
}

/// Handle speech generation requests
async fn generate(
    State(server): State<Arc<Server>>,
    headers: HeaderMap,
    ExtractPayload(request): ExtractPayload<GenerateRequest>,
) -> Result<Json<GenerateResponse>> {
    tracing::debug!(voice = ?request.voice, chars = request.text.chars().count(), "generate handler called");

    let result = server.generate(request).await?;
    let download_url = download_url(server.public_url(), &headers, &result.download_path);

    Ok(Json(GenerateResponse {
        error: false,
        message: "Audio generated successfully",
        data: GenerateData {
            file_id: result.id,
            download_url,
            expires_at: result.expires_at,
            voice: result.voice,
            speed: result.speed,
            size_bytes: result.size_bytes,
            duration_hours: server.ttl().as_secs_f64() / 3600.0,
            chunks_total: result.chunks_total,
            chunks_dropped: result.chunks_dropped,
        },
    }))
}

async fn download(State(server): State<Arc<Server>>, Path(id): Path<String>) -> Result<Response> {
    let download = server.redeem(&id).await?;

    tracing::debug!(artifact_id = %id, size = download.audio.len(), "serving artifact");

    Ok(download.into_response())
}

async fn status(State(server): State<Arc<Server>>, Path(id): Path<String>) -> Response {
    match server.status(&id).await {
        Some(status) => Json(status).into_response(),
        None => Json(serde_json::json!({
            "exists": false,
            "message": "File not found",
        }))
        .into_response(),
    }
}

/// Absolute download URL for `path`
///
/// Uses the configured public URL when present, otherwise the request's
/// `Host` header. Falls back to the bare path when neither is known.
fn download_url(public_url: Option<&url::Url>, headers: &HeaderMap, path: &str) -> String {
    if let Some(base) = public_url {
        return format!("{}{path}", base.as_str().trim_end_matches('/'));
    }

    let host = headers.get(http::header::HOST).and_then(|value| value.to_str().ok());
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("http");

    host.map_or_else(|| path.to_owned(), |host| format!("{scheme}://{host}{path}"))
}
