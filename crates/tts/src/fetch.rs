use std::{net::SocketAddr, sync::Arc, time::Duration};

use bytes::Bytes;
use cinder_config::TransportConfig;
use reqwest::{Client, StatusCode, redirect::Policy};
use url::{Host, Url};

use crate::transport::Transport;

/// Downloads rendered media from the URL the provider hands back
///
/// Redirects are followed here, one hop at a time, rather than by reqwest.
/// Every hop resolves its host over DNS-over-HTTPS and pins the connection to that
/// address while the request still carries the original hostname.
pub struct Fetcher {
    transport: Arc<Transport>,
    timeout: Duration,
    max_redirects: usize,
    accept_invalid_certs: bool,
}

impl Fetcher {
    pub fn new(transport: Arc<Transport>, config: &TransportConfig) -> Self {
        Self {
            transport,
            timeout: config.fetch_timeout,
            max_redirects: config.max_redirects,
            accept_invalid_certs: config.accept_invalid_certs,
        }
    }

    /// Download `url`, returning `None` on any failure
    pub async fn fetch(&self, url: &str) -> Option<Bytes> {
        let mut target = match Url::parse(url) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(url, error = %e, "media URL is not valid");
                return None;
            }
        };

        for hop in 0..=self.max_redirects {
            let response = self.get(&target).await?;
            let status = response.status();

            match status {
                StatusCode::OK => {
                    return match response.bytes().await {
                        Ok(body) => Some(body),
                        Err(e) => {
                            tracing::warn!(url = %target, error = %e, "media body read failed");
                            None
                        }
                    };
                }
                StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::TEMPORARY_REDIRECT => {
                    let next = response
                        .headers()
                        .get(http::header::LOCATION)
                        .and_then(|value| value.to_str().ok())
                        .and_then(|location| target.join(location).ok());

                    let Some(next) = next else {
                        tracing::warn!(url = %target, %status, "redirect without a usable Location");
                        return None;
                    };

                    tracing::debug!(from = %target, to = %next, hop, "following media redirect");
                    target = next;
                }
                _ => {
                    tracing::warn!(url = %target, %status, "media download rejected");
                    return None;
                }
            }
        }

        tracing::warn!(url, max = self.max_redirects, "media redirect limit exceeded");
        None
    }

    async fn get(&self, url: &Url) -> Option<reqwest::Response> {
        let client = match self.client_for(url).await {
            Ok(client) => client,
            Err(e) => {
                tracing::warn!(%url, error = %e, "failed to build media client");
                return None;
            }
        };

        let mut request = client.get(url.clone());

        match self.transport.current_identity() {
            Ok(identity) => request = request.header(http::header::USER_AGENT, identity.user_agent()),
            Err(e) => tracing::debug!(error = %e, "fetching without identity headers"),
        }

        match request.send().await {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(%url, timeout = e.is_timeout(), error = %e, "media download failed");
                None
            }
        }
    }

    /// One-shot client pinned to the resolved address for the URL's host, if any
    async fn client_for(&self, url: &Url) -> reqwest::Result<Client> {
        let mut builder = Client::builder()
            .redirect(Policy::none())
            .timeout(self.timeout)
            .danger_accept_invalid_certs(self.accept_invalid_certs);

        let pinned = match url.host() {
            Some(Host::Domain(domain)) => self.transport.resolver().resolve(domain).await.map(|ip| (domain, ip)),
            _ => None,
        };

        if let Some((domain, ip)) = pinned {
            // Port is taken from the URL; the one given here is ignored
            builder = builder.resolve(domain, SocketAddr::new(ip, 0));
        }

        builder.build()
    }
}
