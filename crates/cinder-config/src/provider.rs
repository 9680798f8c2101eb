use cinder_core::Voice;
use serde::Deserialize;
use url::Url;

const DEFAULT_PROVIDER_URL: &str = "https://ai-chat.apisimpacientes.workers.dev/audio";

/// Upstream speech provider settings
///
/// The provider answers `{model, voice, text, speed}` with a JSON body
/// carrying an `audio_url` that points at the rendered clip.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// Synthesis endpoint
    #[serde(default = "default_url")]
    pub url: Url,
    /// Model identifier sent with every chunk
    #[serde(default = "default_model")]
    pub model: String,
    /// Voice used when a request does not name one
    #[serde(default)]
    pub default_voice: Voice,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            model: default_model(),
            default_voice: Voice::default(),
        }
    }
}

fn default_url() -> Url {
    Url::parse(DEFAULT_PROVIDER_URL).expect("default provider URL must parse")
}

fn default_model() -> String {
    "openai-tts".to_string()
}
