use std::path::PathBuf;

use clap::Parser;

/// Cinder text-to-speech relay
#[derive(Debug, Parser)]
#[command(name = "cinder", about = "Text-to-speech relay with expiring audio downloads")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "cinder.toml", env = "CINDER_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "CINDER_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,
}
