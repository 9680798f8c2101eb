use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr},
    sync::{Mutex, PoisonError},
    time::Duration,
};

use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// DNS record type for IPv4 addresses
const RECORD_A: u16 = 1;

/// Hostname resolution over a DNS-over-HTTPS JSON endpoint
///
/// Results live for the whole process. Lookups are best effort: every
/// failure yields `None` and callers connect by hostname instead.
pub struct Resolver {
    client: Client,
    endpoint: Url,
    cache: Mutex<HashMap<String, IpAddr>>,
}

#[derive(Debug, Deserialize)]
struct DohResponse {
    #[serde(rename = "Answer", default)]
    answer: Vec<DohAnswer>,
}

#[derive(Debug, Deserialize)]
struct DohAnswer {
    #[serde(rename = "type")]
    record_type: u16,
    data: String,
}

impl Resolver {
    pub fn new(endpoint: Url, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Resolve `hostname` to an IPv4 address
    pub async fn resolve(&self, hostname: &str) -> Option<IpAddr> {
        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return Some(ip);
        }

        if let Some(ip) = self.cached(hostname) {
            return Some(ip);
        }

        let ip = match self.query(hostname).await {
            Ok(Some(ip)) => ip,
            Ok(None) => {
                tracing::debug!(hostname, "DoH lookup returned no A record");
                return None;
            }
            Err(e) => {
                tracing::debug!(hostname, error = %e, "DoH lookup failed");
                return None;
            }
        };

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hostname.to_owned(), ip);

        tracing::debug!(hostname, %ip, "resolved via DoH");
        Some(ip)
    }

    fn cached(&self, hostname: &str) -> Option<IpAddr> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(hostname)
            .copied()
    }

    async fn query(&self, hostname: &str) -> reqwest::Result<Option<IpAddr>> {
        let response: DohResponse = self
            .client
            .get(self.endpoint.clone())
            .query(&[("name", hostname), ("type", "A")])
            .header(http::header::ACCEPT, "application/dns-json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response
            .answer
            .iter()
            .filter(|answer| answer.record_type == RECORD_A)
            .find_map(|answer| answer.data.parse::<Ipv4Addr>().ok())
            .map(IpAddr::V4))
    }
}
