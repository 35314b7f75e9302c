// Shared transport configuration for building reqwest::Client instances.
//
// Controllers reached through a public tunnel sit behind an interstitial
// warning page unless the request carries the bypass header, so the header
// set is part of the transport rather than of each request.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::Error;

/// Header that tells localtunnel-style proxies to skip their reminder page.
pub const TUNNEL_BYPASS_HEADER: &str = "bypass-tunnel-reminder";

/// Default `User-Agent` sent to the controller.
pub const DEFAULT_USER_AGENT: &str = concat!("brewbot/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Send `Bypass-Tunnel-Reminder: true` on every request.
    pub bypass_tunnel_reminder: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            bypass_tunnel_reminder: true,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .default_headers(self.default_headers())
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self.bypass_tunnel_reminder {
            headers.insert(
                HeaderName::from_static(TUNNEL_BYPASS_HEADER),
                HeaderValue::from_static("true"),
            );
        }
        headers
    }
}
