use std::net::SocketAddr;

use serde::Deserialize;
use url::Url;

use crate::{cors::CorsConfig, health::HealthConfig};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub listen_address: Option<SocketAddr>,
    /// Public base URL used when building download links
    ///
    /// When absent, links are derived from the request `Host` header.
    #[serde(default)]
    pub public_url: Option<Url>,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub cors: Option<CorsConfig>,
}
