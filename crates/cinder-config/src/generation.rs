use std::time::Duration;

use serde::Deserialize;

/// Chunking limits and the per-chunk retry policy
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Upper bound on characters sent upstream in one request
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
    /// Longest accepted input; the generator truncates beyond this
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    /// Pause before the single degraded retry of a failed chunk
    #[serde(default = "default_retry_pause", deserialize_with = "crate::duration::deserialize")]
    pub retry_pause: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
            max_text_chars: default_max_text_chars(),
            retry_pause: default_retry_pause(),
        }
    }
}

const fn default_max_chunk_chars() -> usize {
    2800
}

const fn default_max_text_chars() -> usize {
    10_000
}

const fn default_retry_pause() -> Duration {
    Duration::from_secs(1)
}
