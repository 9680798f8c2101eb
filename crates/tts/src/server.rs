use std::{str::FromStr, sync::Arc, time::Duration};

use cinder_config::Config;
use cinder_core::Voice;
use url::Url;

use crate::{
    error::{Result, TtsError},
    generator::Generator,
    store::{ArtifactStatus, ArtifactStore, NewArtifact},
    types::{AudioDownload, GenerateRequest, GenerateResult},
};

const DEFAULT_SPEED: f64 = 1.0;
const MIN_SPEED: f64 = 0.25;
const MAX_SPEED: f64 = 4.0;

/// TTS relay: validates requests, generates audio and hands out artifacts
pub struct Server {
    generator: Generator,
    store: Arc<ArtifactStore>,
    default_voice: Voice,
    ttl: Duration,
    public_url: Option<Url>,
}

impl Server {
    /// Validate, synthesize and store one request
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResult> {
        let voice = match request.voice.as_deref() {
            None => self.default_voice,
            Some(raw) => Voice::from_str(raw).map_err(|_| {
                TtsError::InvalidRequest(format!("Invalid voice. Available voices: {}", Voice::id_list()))
            })?,
        };

        let text = request.text.trim();
        if text.is_empty() {
            return Err(TtsError::EmptyInput);
        }

        let max = self.generator.max_text_chars();
        if text.chars().count() > max {
            return Err(TtsError::TextTooLong { max });
        }

        let speed = request.speed.unwrap_or(DEFAULT_SPEED);
        if !(MIN_SPEED..=MAX_SPEED).contains(&speed) {
            return Err(TtsError::InvalidRequest(format!(
                "Speed must be between {MIN_SPEED} and {MAX_SPEED}"
            )));
        }

        let synthesis = self.generator.generate(text, voice, speed).await?;
        if synthesis.is_partial() {
            tracing::warn!(
                dropped = synthesis.chunks_dropped,
                total = synthesis.chunks_total,
                %voice,
                "storing partial audio"
            );
        }

        let stored = self
            .store
            .put(&synthesis.audio, NewArtifact { text, voice, speed })
            .await?;

        Ok(GenerateResult {
            download_path: format!("/api/download/{}", stored.id),
            id: stored.id,
            expires_at: stored.metadata.expires,
            size_bytes: stored.metadata.size_bytes,
            voice,
            speed,
            chunks_total: synthesis.chunks_total,
            chunks_dropped: synthesis.chunks_dropped,
        })
    }

    /// Exchange an artifact id for its audio
    pub async fn redeem(&self, id: &str) -> Result<AudioDownload> {
        let (audio, metadata) = self.store.get(id).await?;
        Ok(AudioDownload { audio, metadata })
    }

    pub async fn status(&self, id: &str) -> Option<ArtifactStatus> {
        self.store.status(id).await
    }

    pub const fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    pub const fn default_voice(&self) -> Voice {
        self.default_voice
    }

    /// How long generated artifacts stay redeemable
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Configured public base URL for download links
    pub const fn public_url(&self) -> Option<&Url> {
        self.public_url.as_ref()
    }
}

/// Builder for constructing the TTS server from configuration
pub struct TtsServerBuilder<'a> {
    config: &'a Config,
}

impl<'a> TtsServerBuilder<'a> {
    pub const fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub async fn build(self) -> Result<Server> {
        let generator = Generator::from_config(self.config)?;

        let store = ArtifactStore::open(&self.config.store.directory, self.config.store.ttl).await?;

        tracing::debug!(
            provider = %self.config.provider.url,
            model = %self.config.provider.model,
            "TTS server initialized"
        );

        Ok(Server {
            generator,
            store: Arc::new(store),
            default_voice: self.config.provider.default_voice,
            ttl: self.config.store.ttl,
            public_url: self.config.server.public_url.clone(),
        })
    }
}
