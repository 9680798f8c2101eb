use bytes::Bytes;
use cinder_core::{Voice, VoiceInfo};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::store::ArtifactMetadata;

/// Body of `POST /api/generate`
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Text to synthesize
    #[serde(default)]
    pub text: String,
    /// Voice id; the configured default when absent
    pub voice: Option<String>,
    /// Speed multiplier (0.25 to 4.0), 1.0 when absent
    pub speed: Option<f64>,
}

/// Outcome of a successful generation
#[derive(Debug, Clone)]
pub struct GenerateResult {
    pub id: String,
    /// Path under which the artifact can be downloaded
    pub download_path: String,
    pub expires_at: Timestamp,
    pub size_bytes: u64,
    pub voice: Voice,
    pub speed: f64,
    pub chunks_total: usize,
    pub chunks_dropped: usize,
}

/// `data` member of the generate response
#[derive(Debug, Serialize)]
pub struct GenerateData {
    pub file_id: String,
    pub download_url: String,
    pub expires_at: Timestamp,
    pub voice: Voice,
    pub speed: f64,
    pub size_bytes: u64,
    pub duration_hours: f64,
    pub chunks_total: usize,
    pub chunks_dropped: usize,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub error: bool,
    pub message: &'static str,
    pub data: GenerateData,
}

#[derive(Debug, Serialize)]
pub struct VoicesResponse {
    pub count: usize,
    pub voices: Vec<VoiceInfo>,
    pub default: Voice,
}

/// Redeemed artifact payload, served as an attachment
pub struct AudioDownload {
    pub audio: Bytes,
    pub metadata: ArtifactMetadata,
}

impl AudioDownload {
    pub const CONTENT_TYPE: &'static str = "audio/mpeg";

    /// Convert the download into an axum HTTP response
    pub fn into_response(self) -> axum::response::Response {
        use axum::response::IntoResponse;

        let disposition = format!("attachment; filename={}", self.metadata.filename);

        (
            [
                (http::header::CONTENT_TYPE, Self::CONTENT_TYPE.to_owned()),
                (http::header::CONTENT_DISPOSITION, disposition),
                (http::HeaderName::from_static("x-expires-at"), self.metadata.expires.to_string()),
                (http::HeaderName::from_static("x-voice"), self.metadata.voice.to_string()),
                (http::HeaderName::from_static("x-speed"), format!("{:?}", self.metadata.speed)),
            ],
            self.audio,
        )
            .into_response()
    }
}
