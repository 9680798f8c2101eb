#![allow(clippy::must_use_candidate)]

pub mod cors;
mod duration;
mod env;
pub mod generation;
pub mod health;
mod loader;
pub mod provider;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod transport;

use serde::Deserialize;

pub use cors::*;
pub use generation::*;
pub use health::*;
pub use provider::*;
pub use server::*;
pub use store::*;
pub use telemetry::*;
pub use transport::*;

/// Top-level cinder configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream speech provider
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Chunking and retry policy
    #[serde(default)]
    pub generation: GenerationConfig,
    /// Outbound identities, resolution and timeouts
    #[serde(default)]
    pub transport: TransportConfig,
    /// Artifact persistence
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
