// Machine controller HTTP client
//
// Wraps `reqwest::Client` with controller URL construction and JSON body
// handling. Guard rejections come back as HTTP 200 with `success: false`,
// so the caller always inspects the body rather than the status code.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{BrewCommand, CommandRequest, CommandResponse, SimulateRequest, StatusResponse};

/// Raw HTTP client for a brewbot machine controller.
///
/// Every method is a single request-response round trip; there is no
/// retry here. Pollers decide what a failure means.
#[derive(Debug, Clone)]
pub struct MachineClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl MachineClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the controller root, e.g. `http://192.168.1.40:5000`
    /// or a tunnel URL.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout.as_secs(),
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            timeout_secs: 0,
        })
    }

    /// The controller base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the current machine snapshot.
    ///
    /// `GET /status`
    pub async fn get_status(&self) -> Result<StatusResponse, Error> {
        let url = self.url("status")?;
        self.get(url).await
    }

    /// Submit a step command.
    ///
    /// `POST /command` with `{"command": "START_GRIND"}`
    pub async fn send_command(&self, command: BrewCommand) -> Result<CommandResponse, Error> {
        self.send_raw_command(&CommandRequest::new(command)).await
    }

    /// Submit a command body as-is, including names the controller may not know.
    pub async fn send_raw_command(&self, request: &CommandRequest) -> Result<CommandResponse, Error> {
        let url = self.url("command")?;
        debug!(command = %request.command, "sending command");
        self.post(url, request).await
    }

    /// Apply a manual override and return the resulting snapshot.
    ///
    /// `POST /simulate` with a partial body. Test/ops tooling only.
    pub async fn simulate(&self, request: &SimulateRequest) -> Result<StatusResponse, Error> {
        let url = self.url("simulate")?;
        self.post(url, request).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        let full = format!("{}/{path}", self.base_url.as_str().trim_end_matches('/'));
        Ok(Url::parse(&full)?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(|e| self.map_send(e))?;

        Self::parse_body(resp).await
    }

    async fn post<T: DeserializeOwned>(&self, url: Url, body: &impl Serialize) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.map_send(e))?;

        Self::parse_body(resp).await
    }

    fn map_send(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() && self.timeout_secs > 0 {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }

    /// Reject non-success statuses, then decode the JSON body.
    async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
