use std::{sync::Arc, time::Duration};

use bytes::{Bytes, BytesMut};
use cinder_config::Config;
use cinder_core::Voice;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::{Result, TtsError},
    fetch::Fetcher,
    segment::segment,
    transport::{Method, Transport},
};

/// Speed used for the degraded retry of a failed chunk
const FALLBACK_SPEED: f64 = 1.0;

/// Assembled audio for one generation request
#[derive(Debug, Clone)]
pub struct Synthesis {
    /// Chunk payloads concatenated in order, without re-encoding
    pub audio: Bytes,
    pub chunks_total: usize,
    /// Chunks that failed both attempts and are missing from `audio`
    pub chunks_dropped: usize,
}

impl Synthesis {
    pub const fn is_partial(&self) -> bool {
        self.chunks_dropped > 0
    }
}

#[derive(Serialize)]
struct SynthesisPayload<'a> {
    model: &'a str,
    voice: Voice,
    text: &'a str,
    speed: f64,
}

#[derive(Deserialize)]
struct ProviderReply {
    audio_url: Option<String>,
}

/// Drives chunks through the provider and stitches the results together
pub struct Generator {
    transport: Arc<Transport>,
    fetcher: Fetcher,
    endpoint: Url,
    model: String,
    max_chunk_chars: usize,
    max_text_chars: usize,
    retry_pause: Duration,
}

impl Generator {
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = Arc::new(Transport::new(&config.transport, config.provider.url.clone())?);
        let fetcher = Fetcher::new(Arc::clone(&transport), &config.transport);

        Ok(Self {
            transport,
            fetcher,
            endpoint: config.provider.url.clone(),
            model: config.provider.model.clone(),
            max_chunk_chars: config.generation.max_chunk_chars,
            max_text_chars: config.generation.max_text_chars,
            retry_pause: config.generation.retry_pause,
        })
    }

    pub const fn max_text_chars(&self) -> usize {
        self.max_text_chars
    }

    /// Synthesize `text`, dropping chunks that fail twice
    ///
    /// Input beyond the character limit is truncated, not rejected. Fails
    /// only when the text is blank or no chunk at all produced audio.
    pub async fn generate(&self, text: &str, voice: Voice, speed: f64) -> Result<Synthesis> {
        if text.trim().is_empty() {
            return Err(TtsError::EmptyInput);
        }

        let text = truncate_chars(text, self.max_text_chars);
        let chunks = segment(text, self.max_chunk_chars);

        if chunks.is_empty() {
            return Err(TtsError::EmptyInput);
        }

        let total = chunks.len();
        let mut segments = Vec::with_capacity(total);

        for (index, chunk) in chunks.iter().enumerate() {
            match self.synthesize_with_retry(chunk, index, total, voice, speed).await {
                Some(audio) => segments.push(audio),
                None => tracing::warn!(chunk = index + 1, total, %voice, "dropping chunk after retry"),
            }
        }

        if segments.is_empty() {
            return Err(TtsError::GenerationFailed { chunks: total });
        }

        let dropped = total - segments.len();
        let mut audio = BytesMut::with_capacity(segments.iter().map(Bytes::len).sum());
        for segment in &segments {
            audio.extend_from_slice(segment);
        }

        tracing::info!(chunks = total, dropped, size = audio.len(), %voice, "generation complete");

        Ok(Synthesis {
            audio: audio.freeze(),
            chunks_total: total,
            chunks_dropped: dropped,
        })
    }

    async fn synthesize_with_retry(
        &self,
        chunk: &str,
        index: usize,
        total: usize,
        voice: Voice,
        speed: f64,
    ) -> Option<Bytes> {
        tracing::debug!(chunk = index + 1, total, %voice, attempt = 1, "synthesizing chunk");

        if let Some(audio) = self.synthesize_chunk(chunk, voice, speed).await {
            return Some(audio);
        }

        tracing::warn!(
            chunk = index + 1,
            total,
            %voice,
            attempt = 1,
            "chunk failed, retrying at normal speed"
        );

        tokio::time::sleep(self.retry_pause).await;

        let audio = self.synthesize_chunk(chunk, voice, FALLBACK_SPEED).await;

        if audio.is_none() {
            tracing::warn!(chunk = index + 1, total, %voice, attempt = 2, "chunk failed");
        }

        audio
    }

    async fn synthesize_chunk(&self, text: &str, voice: Voice, speed: f64) -> Option<Bytes> {
        let payload = SynthesisPayload {
            model: &self.model,
            voice,
            text,
            speed,
        };

        let response = self.transport.request(&self.endpoint, &payload, Method::Post).await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::debug!(%status, "provider rejected chunk");
            return None;
        }

        let reply = match response.json::<ProviderReply>().await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::debug!(error = %e, "provider reply is not valid JSON");
                return None;
            }
        };

        let Some(audio_url) = reply.audio_url.filter(|url| !url.is_empty()) else {
            tracing::debug!("provider reply has no audio_url");
            return None;
        };

        self.fetcher.fetch(&audio_url).await
    }
}

/// Longest prefix of `text` holding at most `max` characters
fn truncate_chars(text: &str, max: usize) -> &str {
    text.char_indices().nth(max).map_or(text, |(end, _)| &text[..end])
}
