use std::{collections::BTreeMap, sync::Arc, time::Duration};

use http::{HeaderMap, HeaderValue, header};
use jiff::Timestamp;
use rand::seq::IndexedRandom;
use reqwest::{Client, cookie::Jar};
use url::Url;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36",
];

const ACCEPT_LANGUAGES: &[&str] = &["en-US,en;q=0.9", "en-GB,en;q=0.9", "en-US,en;q=0.8,es;q=0.6"];

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// Outbound identity bound to one time bucket
///
/// Headers and cookies are chosen once at creation. Each identity owns its
/// own client, so its connection pool and cookie jar are not shared with
/// other identities.
#[derive(Debug)]
pub struct Identity {
    bucket: u64,
    user_agent: &'static str,
    client: Client,
}

impl Identity {
    fn new(bucket: u64, created: Timestamp, cookie_scope: &Url, timeout: Duration) -> reqwest::Result<Self> {
        let mut rng = rand::rng();
        let user_agent = USER_AGENTS.choose(&mut rng).copied().unwrap_or(USER_AGENTS[0]);
        let language = ACCEPT_LANGUAGES.choose(&mut rng).copied().unwrap_or(ACCEPT_LANGUAGES[0]);

        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(user_agent));
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static(language));
        headers.insert(header::REFERER, HeaderValue::from_static("https://www.google.com/"));
        headers.insert(header::DNT, HeaderValue::from_static("1"));
        headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

        let jar = Jar::default();
        jar.add_cookie_str(&format!("session_id={}", created.as_second()), cookie_scope);
        jar.add_cookie_str("consent=true", cookie_scope);

        let client = Client::builder()
            .default_headers(headers)
            .cookie_provider(Arc::new(jar))
            .timeout(timeout)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .tcp_keepalive(Some(Duration::from_secs(60)))
            .build()?;

        Ok(Self {
            bucket,
            user_agent,
            client,
        })
    }

    /// Time bucket this identity belongs to
    pub const fn bucket(&self) -> u64 {
        self.bucket
    }

    pub const fn user_agent(&self) -> &'static str {
        self.user_agent
    }

    pub const fn client(&self) -> &Client {
        &self.client
    }
}

/// Bounded set of identities keyed by time bucket
///
/// Superseded identities are dropped from the pool, not drained: a request
/// still holding an `Arc<Identity>` finishes on it undisturbed.
pub(super) struct IdentityPool {
    window_secs: u64,
    history: u64,
    request_timeout: Duration,
    cookie_scope: Url,
    identities: BTreeMap<u64, Arc<Identity>>,
}

impl IdentityPool {
    pub(super) fn new(window: Duration, history: u64, request_timeout: Duration, cookie_scope: Url) -> Self {
        Self {
            window_secs: window.as_secs().max(1),
            history: history.max(1),
            request_timeout,
            cookie_scope,
            identities: BTreeMap::new(),
        }
    }

    pub(super) fn bucket_of(&self, now: Timestamp) -> u64 {
        u64::try_from(now.as_second()).unwrap_or(0) / self.window_secs
    }

    /// Identity for the bucket containing `now`, creating it on first use
    pub(super) fn identity_for(&mut self, now: Timestamp) -> reqwest::Result<Arc<Identity>> {
        let bucket = self.bucket_of(now);

        if let Some(identity) = self.identities.get(&bucket) {
            return Ok(Arc::clone(identity));
        }

        let identity = Arc::new(Identity::new(bucket, now, &self.cookie_scope, self.request_timeout)?);
        self.identities.insert(bucket, Arc::clone(&identity));

        let newest = self.identities.keys().next_back().copied().unwrap_or(bucket);
        let oldest_kept = newest.max(bucket).saturating_sub(self.history - 1);
        self.identities.retain(|key, _| *key >= oldest_kept);

        tracing::debug!(bucket, live = self.identities.len(), "rotated outbound identity");

        Ok(identity)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.identities.len()
    }
}
