use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        tracing::debug!(
            provider = %config.provider.url,
            store = %config.store.directory.display(),
            "configuration loaded"
        );

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error describing the first inconsistency found
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_generation()?;
        self.validate_transport()?;
        self.validate_store()?;
        Ok(())
    }

    fn validate_generation(&self) -> anyhow::Result<()> {
        let generation = &self.generation;

        if generation.max_chunk_chars == 0 {
            anyhow::bail!("generation.max_chunk_chars must be greater than 0");
        }

        if generation.max_text_chars < generation.max_chunk_chars {
            anyhow::bail!("generation.max_text_chars must not be smaller than generation.max_chunk_chars");
        }

        if !is_http(&self.provider.url) {
            anyhow::bail!("provider.url must use http or https: {}", self.provider.url);
        }

        Ok(())
    }

    fn validate_transport(&self) -> anyhow::Result<()> {
        let transport = &self.transport;

        if transport.jitter_min > transport.jitter_max {
            anyhow::bail!("transport.jitter_min must not exceed transport.jitter_max");
        }

        if transport.identity_history == 0 {
            anyhow::bail!("transport.identity_history must be greater than 0");
        }

        if transport.identity_window.is_zero() {
            anyhow::bail!("transport.identity_window must be greater than 0");
        }

        if !is_http(&transport.doh_url) {
            anyhow::bail!("transport.doh_url must use http or https: {}", transport.doh_url);
        }

        Ok(())
    }

    fn validate_store(&self) -> anyhow::Result<()> {
        if self.store.ttl.is_zero() {
            anyhow::bail!("store.ttl must be greater than 0");
        }

        if self.store.sweep_interval.is_zero() {
            anyhow::bail!("store.sweep_interval must be greater than 0");
        }

        Ok(())
    }
}

fn is_http(url: &url::Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
