// ── Core error types ──
//
// User-facing errors from brewbot-core. Guard rejections are not errors:
// they travel as `CommandOutcome` / `CommandResponse` data. The
// `From<brewbot_api::Error>` impl translates transport-layer failures.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Controller request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// The in-process controller task has shut down.
    #[error("Controller stopped")]
    ControllerStopped,

    /// The brew session driver is no longer running.
    #[error("Brew session has ended")]
    SessionEnded,

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Controller error: {message}")]
    Api { message: String, status: Option<u16> },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Worth retrying on the next poll tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::Api { status: Some(500..), .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<brewbot_api::Error> for CoreError {
    fn from(err: brewbot_api::Error) -> Self {
        match err {
            brewbot_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout { timeout_secs: 0 }
                } else if e.is_connect() || e.is_request() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            brewbot_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            brewbot_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            brewbot_api::Error::Http { status, body } => CoreError::Api {
                message: if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status}: {body}")
                },
                status: Some(status),
            },
            brewbot_api::Error::ClientBuild(message) => CoreError::Config { message },
            brewbot_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = CoreError::from(brewbot_api::Error::Http {
            status: 503,
            body: String::new(),
        });
        assert!(err.is_transient());
        assert_eq!(err.to_string(), "Controller error: HTTP 503");

        let err = CoreError::from(brewbot_api::Error::Http {
            status: 404,
            body: "not found".into(),
        });
        assert!(!err.is_transient());
    }

    #[test]
    fn timeouts_keep_their_duration() {
        let err = CoreError::from(brewbot_api::Error::Timeout { timeout_secs: 5 });
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 5 }));
        assert!(err.is_transient());
    }
}
