//! Logging for cinder
//!
//! Installs a `tracing-subscriber` registry with an `EnvFilter` and a fmt
//! layer, either human-readable or JSON.

use cinder_config::TelemetryConfig;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber from configuration
///
/// `RUST_LOG` takes precedence over the configured level. An unparsable
/// directive falls back to `info` rather than failing startup.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed
pub fn init(config: &TelemetryConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), &config.level);

    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false);

        registry
            .with(fmt_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false);

        registry
            .with(fmt_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
    }

    Ok(())
}

/// Pick the effective filter: `RUST_LOG`, then the configured level, then `info`
fn build_filter(env_directive: Option<&str>, configured: &str) -> EnvFilter {
    env_directive
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_new(configured).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}
