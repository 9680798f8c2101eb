//! Mock speech provider for integration tests
//!
//! Answers synthesis calls with an `audio_url` pointing back at itself and
//! serves a distinct clip per accepted request.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Json, Router, routing};
use serde::Deserialize;
use tokio_util::sync::CancellationToken;

/// Mock provider that returns predictable clips
pub struct MockProvider {
    addr: SocketAddr,
    shutdown: CancellationToken,
    state: Arc<MockProviderState>,
}

struct MockProviderState {
    addr: SocketAddr,
    request_count: AtomicU32,
    clip_count: AtomicU32,
    /// Number of synthesis calls to fail before succeeding
    fail_count: AtomicU32,
    /// Chunks whose synthesis always fails
    poisoned: Vec<String>,
    received: Mutex<Vec<SynthesisCall>>,
}

/// One synthesis call as the provider saw it
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisCall {
    pub model: String,
    pub voice: String,
    pub text: String,
    pub speed: f64,
}

impl MockProvider {
    /// Start a provider that accepts every call
    pub async fn start() -> anyhow::Result<Self> {
        Self::start_inner(0, Vec::new()).await
    }

    /// Start a provider that fails the first `n` synthesis calls with 500
    pub async fn start_failing(n: u32) -> anyhow::Result<Self> {
        Self::start_inner(n, Vec::new()).await
    }

    /// Start a provider that always fails calls for the given chunk texts
    pub async fn start_poisoned(texts: &[&str]) -> anyhow::Result<Self> {
        Self::start_inner(0, texts.iter().map(|t| (*t).to_owned()).collect()).await
    }

    async fn start_inner(fail_count: u32, poisoned: Vec<String>) -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(MockProviderState {
            addr,
            request_count: AtomicU32::new(0),
            clip_count: AtomicU32::new(0),
            fail_count: AtomicU32::new(fail_count),
            poisoned,
            received: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/audio", routing::post(handle_synthesis))
            .route("/media/{clip}", routing::get(handle_media))
            .with_state(Arc::clone(&state));

        let shutdown = CancellationToken::new();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_clone.cancelled().await;
                })
                .await
                .ok();
        });

        Ok(Self { addr, shutdown, state })
    }

    /// Synthesis endpoint to configure as the provider URL
    pub fn url(&self) -> String {
        format!("http://{}/audio", self.addr)
    }

    /// Number of synthesis calls received, failed ones included
    pub fn request_count(&self) -> u32 {
        self.state.request_count.load(Ordering::Relaxed)
    }

    /// Synthesis calls received, in arrival order
    pub fn received(&self) -> Vec<SynthesisCall> {
        self.state.received.lock().unwrap().clone()
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn handle_synthesis(
    State(state): State<Arc<MockProviderState>>,
    Json(call): Json<SynthesisCall>,
) -> impl IntoResponse {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    state.received.lock().unwrap().push(call.clone());

    if state.poisoned.contains(&call.text) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "poisoned chunk").into_response();
    }

    let remaining = state.fail_count.load(Ordering::Relaxed);
    if remaining > 0 {
        state.fail_count.fetch_sub(1, Ordering::Relaxed);
        return (StatusCode::INTERNAL_SERVER_ERROR, "simulated failure").into_response();
    }

    let clip = state.clip_count.fetch_add(1, Ordering::Relaxed) + 1;

    Json(serde_json::json!({
        "audio_url": format!("http://{}/media/{clip}", state.addr),
    }))
    .into_response()
}

async fn handle_media(Path(clip): Path<u32>) -> impl IntoResponse {
    ([(axum::http::header::CONTENT_TYPE, "audio/mpeg")], format!("clip-{clip};"))
}
