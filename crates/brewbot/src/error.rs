//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError`, `ConfigError` and `ServerError` into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use brewbot_config::ConfigError;
use brewbot_core::CoreError;
use brewbot_server::ServerError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to controller at {url}")]
    #[diagnostic(
        code(brewbot::connection_failed),
        help(
            "Check that the controller is running and reachable.\n\
             URL: {url}\n\
             For a local simulator, run: brewbot serve"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(brewbot::timeout),
        help("Increase timeout with --timeout or check controller responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Controller ───────────────────────────────────────────────────

    #[error("{command} rejected while {status}: {message}")]
    #[diagnostic(
        code(brewbot::rejected),
        help("Run: brewbot status to see what the machine is missing")
    )]
    Rejected {
        command: String,
        status: String,
        message: String,
    },

    #[error("API error ({code}): {message}")]
    #[diagnostic(code(brewbot::api_error))]
    ApiError { code: String, message: String },

    #[error("Brew abandoned in phase {phase}")]
    #[diagnostic(
        code(brewbot::abandoned),
        help("Commands already sent keep running on the controller.")
    )]
    Abandoned { phase: String },

    #[error("Brew stuck in {phase} after {retries} retries: {message}")]
    #[diagnostic(
        code(brewbot::stuck),
        help("Fix the machine (see: brewbot status), then run: brewbot brew")
    )]
    Stuck {
        phase: String,
        retries: u32,
        message: String,
    },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(brewbot::validation))]
    Validation { field: String, reason: String },

    #[error("'{action}' needs an answer but stdin is not interactive")]
    #[diagnostic(
        code(brewbot::confirmation_required),
        help("Use --yes (-y) to continue automatically in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration could not be loaded: {message}")]
    #[diagnostic(
        code(brewbot::config),
        help("Check the file at: {path}\nOr recreate it with: brewbot config init")
    )]
    Config { message: String, path: String },

    // ── Server ───────────────────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(brewbot::server))]
    Server(#[from] ServerError),

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Rejected { .. } | Self::Stuck { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::ControllerStopped | CoreError::SessionEnded => CliError::ApiError {
                code: "stopped".into(),
                message: err.to_string(),
            },

            CoreError::Api { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "api".into(), |s| s.to_string()),
                message,
            },

            CoreError::Config { message } => CliError::Validation {
                field: "controller".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
                path: brewbot_config::config_path().display().to_string(),
            },
        }
    }
}
