//! Outbound request plumbing
//!
//! Rotates browser-like identities per time bucket, resolves hostnames over
//! DNS-over-HTTPS and issues jittered provider calls. Nothing here raises
//! to the caller: failures are logged and reported as `None`.

mod identity;
mod resolver;

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use cinder_config::TransportConfig;
use jiff::Timestamp;
use rand::Rng;
use serde::Serialize;
use url::Url;

pub use identity::Identity;
use identity::IdentityPool;
pub use resolver::Resolver;

/// HTTP method for provider calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Parameters are sent as a query string
    Get,
    /// Parameters are sent as a JSON body
    Post,
}

/// Shared outbound transport
pub struct Transport {
    identities: Mutex<IdentityPool>,
    resolver: Resolver,
    request_timeout: Duration,
    jitter: (Duration, Duration),
}

impl Transport {
    /// Build the transport
    ///
    /// Identity cookies are scoped to `cookie_scope`, the provider endpoint.
    pub fn new(config: &TransportConfig, cookie_scope: Url) -> crate::Result<Self> {
        let resolver = Resolver::new(config.doh_url.clone(), config.dns_timeout)
            .map_err(|e| crate::TtsError::ConfigError(format!("failed to build DoH client: {e}")))?;

        let identities = IdentityPool::new(
            config.identity_window,
            config.identity_history,
            config.request_timeout,
            cookie_scope,
        );

        Ok(Self {
            identities: Mutex::new(identities),
            resolver,
            request_timeout: config.request_timeout,
            jitter: (config.jitter_min, config.jitter_max),
        })
    }

    /// Identity bound to the time bucket containing `now`
    pub fn identity_for(&self, now: Timestamp) -> reqwest::Result<Arc<Identity>> {
        self.identities
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .identity_for(now)
    }

    /// Identity for the current time bucket
    pub fn current_identity(&self) -> reqwest::Result<Arc<Identity>> {
        self.identity_for(Timestamp::now())
    }

    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Issue a provider call on the current identity
    ///
    /// Sleeps a random jitter first so request timing does not form a
    /// recognizable pattern. Returns whatever response arrives, including
    /// error statuses; `None` means the request never completed.
    pub async fn request<P>(&self, url: &Url, params: &P, method: Method) -> Option<reqwest::Response>
    where
        P: Serialize + ?Sized,
    {
        let identity = match self.current_identity() {
            Ok(identity) => identity,
            Err(e) => {
                tracing::error!(error = %e, "failed to build outbound identity");
                return None;
            }
        };

        tokio::time::sleep(self.jitter_delay()).await;

        let builder = match method {
            Method::Get => identity.client().get(url.clone()).query(params),
            Method::Post => identity.client().post(url.clone()).json(params),
        };

        match builder.timeout(self.request_timeout).send().await {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(%url, bucket = identity.bucket(), timeout = e.is_timeout(), error = %e, "request failed");
                None
            }
        }
    }

    fn jitter_delay(&self) -> Duration {
        let (min, max) = self.jitter;

        if max <= min {
            return min;
        }

        let millis = rand::rng().random_range(min.as_millis()..=max.as_millis());
        Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
    }
}
