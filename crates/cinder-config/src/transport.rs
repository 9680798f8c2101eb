use std::time::Duration;

use serde::Deserialize;
use url::Url;

const DEFAULT_DOH_URL: &str = "https://dns.google/resolve";

/// Outbound transport tuning
///
/// Identity rotation and jitter are fingerprinting countermeasures; their
/// timings are tunables rather than guarantees.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Timeout for provider synthesis calls
    #[serde(default = "default_request_timeout", deserialize_with = "crate::duration::deserialize")]
    pub request_timeout: Duration,
    /// Timeout for media downloads
    #[serde(default = "default_fetch_timeout", deserialize_with = "crate::duration::deserialize")]
    pub fetch_timeout: Duration,
    /// Timeout for DNS-over-HTTPS lookups
    #[serde(default = "default_dns_timeout", deserialize_with = "crate::duration::deserialize")]
    pub dns_timeout: Duration,
    /// DNS-over-HTTPS JSON endpoint
    #[serde(default = "default_doh_url")]
    pub doh_url: Url,
    /// Width of the time bucket an identity is bound to
    #[serde(default = "default_identity_window", deserialize_with = "crate::duration::deserialize")]
    pub identity_window: Duration,
    /// Number of most recent identities kept alive
    #[serde(default = "default_identity_history")]
    pub identity_history: u64,
    #[serde(default = "default_jitter_min", deserialize_with = "crate::duration::deserialize")]
    pub jitter_min: Duration,
    #[serde(default = "default_jitter_max", deserialize_with = "crate::duration::deserialize")]
    pub jitter_max: Duration,
    /// Redirect hops the fetcher follows before giving up
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    /// Accept self-signed or otherwise untrusted certificates on media hosts
    #[serde(default = "default_accept_invalid_certs")]
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            fetch_timeout: default_fetch_timeout(),
            dns_timeout: default_dns_timeout(),
            doh_url: default_doh_url(),
            identity_window: default_identity_window(),
            identity_history: default_identity_history(),
            jitter_min: default_jitter_min(),
            jitter_max: default_jitter_max(),
            max_redirects: default_max_redirects(),
            accept_invalid_certs: default_accept_invalid_certs(),
        }
    }
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(45)
}

const fn default_fetch_timeout() -> Duration {
    Duration::from_secs(60)
}

const fn default_dns_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_doh_url() -> Url {
    Url::parse(DEFAULT_DOH_URL).expect("default DoH URL must parse")
}

const fn default_identity_window() -> Duration {
    Duration::from_secs(60)
}

const fn default_identity_history() -> u64 {
    3
}

const fn default_jitter_min() -> Duration {
    Duration::from_millis(100)
}

const fn default_jitter_max() -> Duration {
    Duration::from_millis(400)
}

const fn default_max_redirects() -> usize {
    5
}

#[allow(clippy::missing_const_for_fn)]
fn default_accept_invalid_certs() -> bool {
    true
}
