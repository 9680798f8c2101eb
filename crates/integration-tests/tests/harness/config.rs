//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use cinder_config::{Config, CorsConfig};

/// Builder for constructing test configurations
///
/// Jitter is disabled and retries pause only briefly so tests stay fast.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Minimal config storing artifacts under `store_dir`
    pub fn new(store_dir: &Path) -> Self {
        let mut config = Config::default();

        config.server.listen_address = Some(SocketAddr::from(([127, 0, 0, 1], 0)));
        config.store.directory = store_dir.to_path_buf();
        config.generation.retry_pause = Duration::from_millis(10);
        config.transport.jitter_min = Duration::ZERO;
        config.transport.jitter_max = Duration::ZERO;
        config.transport.request_timeout = Duration::from_secs(2);
        config.transport.fetch_timeout = Duration::from_secs(2);

        Self { config }
    }

    /// Point the relay at a mock provider endpoint
    pub fn with_provider(mut self, url: &str) -> Self {
        self.config.provider.url = url.parse().expect("valid URL");
        self
    }

    pub fn with_max_chunk_chars(mut self, max: usize) -> Self {
        self.config.generation.max_chunk_chars = max;
        self
    }

    pub fn with_max_text_chars(mut self, max: usize) -> Self {
        self.config.generation.max_text_chars = max;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.config.store.ttl = ttl;
        self
    }

    pub fn with_public_url(mut self, url: &str) -> Self {
        self.config.server.public_url = Some(url.parse().expect("valid URL"));
        self
    }

    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = Some(config);
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
