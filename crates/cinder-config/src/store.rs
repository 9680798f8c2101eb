use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

/// Artifact store location and lifetimes
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Directory holding the index file and one payload file per artifact
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    /// How long a generated artifact stays redeemable
    #[serde(default = "default_ttl", deserialize_with = "crate::duration::deserialize")]
    pub ttl: Duration,
    /// Period of the background sweep that reclaims expired artifacts
    #[serde(default = "default_sweep_interval", deserialize_with = "crate::duration::deserialize")]
    pub sweep_interval: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            ttl: default_ttl(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

fn default_directory() -> PathBuf {
    PathBuf::from("./artifacts")
}

const fn default_ttl() -> Duration {
    Duration::from_secs(3600)
}

const fn default_sweep_interval() -> Duration {
    Duration::from_secs(300)
}
