use cinder_core::Voice;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Inputs that identify a new artifact
#[derive(Debug, Clone)]
pub struct NewArtifact<'a> {
    pub text: &'a str,
    pub voice: Voice,
    pub speed: f64,
}

/// Index record for one stored artifact
///
/// Immutable once written. The payload lives next to the index as
/// `<id>.mp3`; `filename` is only the name suggested to downloaders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub filename: String,
    pub created: Timestamp,
    pub expires: Timestamp,
    pub voice: Voice,
    pub speed: f64,
    pub size_bytes: u64,
    /// Byte length of the source text
    pub text_length: usize,
}

impl ArtifactMetadata {
    pub(crate) fn new(artifact: &NewArtifact<'_>, size_bytes: u64, created: Timestamp, expires: Timestamp) -> Self {
        Self {
            filename: format!("tts_{}_{}.mp3", artifact.voice, created.as_second()),
            created,
            expires,
            voice: artifact.voice,
            speed: artifact.speed,
            size_bytes,
            text_length: artifact.text.len(),
        }
    }

    /// Expired artifacts are invisible to every read path
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now >= self.expires
    }

    /// Whole seconds left, truncated; zero once expired
    pub fn seconds_remaining_at(&self, now: Timestamp) -> u64 {
        u64::try_from(self.expires.duration_since(now).as_secs()).unwrap_or(0)
    }
}

/// Point-in-time view of an artifact for status queries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactStatus {
    pub exists: bool,
    pub expired: bool,
    pub expires_at: Timestamp,
    pub seconds_remaining: u64,
    pub voice: Voice,
    pub speed: f64,
    pub created: Timestamp,
    pub size_bytes: u64,
}

impl ArtifactStatus {
    pub(crate) fn of(metadata: &ArtifactMetadata, now: Timestamp) -> Self {
        let expired = metadata.is_expired_at(now);

        Self {
            exists: true,
            expired,
            expires_at: metadata.expires,
            seconds_remaining: if expired { 0 } else { metadata.seconds_remaining_at(now) },
            voice: metadata.voice,
            speed: metadata.speed,
            created: metadata.created,
            size_bytes: metadata.size_bytes,
        }
    }
}
