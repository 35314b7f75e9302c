//! Shared configuration for the brewbot CLI and simulator.
//!
//! One TOML file layered under environment variables, translated into the
//! runtime types of `brewbot_core` (`ClientConfig`, `SimulationConfig`,
//! `DriverConfig`). The CLI adds flag overrides on top.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use brewbot_api::TransportConfig;
use brewbot_api::transport::DEFAULT_USER_AGENT;
use brewbot_core::model::{MAX_BEAN_G, MAX_WATER_ML};
use brewbot_core::{BrewTimings, ClientConfig, DriverConfig, ProgressConfig, SimulationConfig};

/// Prefix of environment overrides; nested keys are split on `__`
/// (e.g. `BREWBOT_SIMULATOR__REQUIRE_CUPS=true`).
pub const ENV_PREFIX: &str = "BREWBOT_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        field: field.into(),
        reason: reason.into(),
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,

    /// The controller the client talks to.
    #[serde(default)]
    pub controller: ControllerSection,

    /// The in-process simulator started by `brewbot serve`.
    #[serde(default)]
    pub simulator: SimulatorSection,

    /// Brew session pacing.
    #[serde(default)]
    pub session: SessionSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ControllerSection {
    /// Controller base URL (e.g., "http://192.168.1.40:5000").
    #[serde(default = "default_controller_url")]
    pub url: String,

    /// Send `Bypass-Tunnel-Reminder: true` for tunnelled controllers.
    #[serde(default = "default_true")]
    pub bypass_tunnel_reminder: bool,

    /// Override the `User-Agent` header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for ControllerSection {
    fn default() -> Self {
        Self {
            url: default_controller_url(),
            bypass_tunnel_reminder: true,
            user_agent: None,
        }
    }
}

fn default_controller_url() -> String {
    "http://127.0.0.1:5000".into()
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SimulatorSection {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_bean_g")]
    pub initial_bean_g: f64,

    #[serde(default = "default_water_ml")]
    pub initial_water_ml: f64,

    #[serde(default = "default_grind_secs")]
    pub grind_secs: f64,

    #[serde(default = "default_pump_secs")]
    pub pump_secs: f64,

    #[serde(default = "default_heat_secs")]
    pub heat_secs: f64,

    #[serde(default = "default_dispense_secs")]
    pub dispense_secs: f64,

    /// Reject commands while the relevant cup is missing.
    #[serde(default)]
    pub require_cups: bool,
}

impl Default for SimulatorSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            initial_bean_g: default_bean_g(),
            initial_water_ml: default_water_ml(),
            grind_secs: default_grind_secs(),
            pump_secs: default_pump_secs(),
            heat_secs: default_heat_secs(),
            dispense_secs: default_dispense_secs(),
            require_cups: false,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".into()
}
fn default_bean_g() -> f64 {
    SimulationConfig::default().initial_bean_g
}
fn default_water_ml() -> f64 {
    SimulationConfig::default().initial_water_ml
}
fn default_grind_secs() -> f64 {
    BrewTimings::default().grind.as_secs_f64()
}
fn default_pump_secs() -> f64 {
    BrewTimings::default().pump.as_secs_f64()
}
fn default_heat_secs() -> f64 {
    BrewTimings::default().heat.as_secs_f64()
}
fn default_dispense_secs() -> f64 {
    BrewTimings::default().dispense.as_secs_f64()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SessionSection {
    #[serde(default = "default_poll_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_tick_ms")]
    pub progress_tick_ms: u64,

    #[serde(default = "default_step")]
    pub progress_step: u8,

    #[serde(default = "default_cap")]
    pub progress_cap: u8,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_ms(),
            progress_tick_ms: default_tick_ms(),
            progress_step: default_step(),
            progress_cap: default_cap(),
        }
    }
}

fn default_poll_ms() -> u64 {
    1_000
}
fn default_tick_ms() -> u64 {
    200
}
fn default_step() -> u8 {
    3
}
fn default_cap() -> u8 {
    95
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "brewbot", "brewbot").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("brewbot");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from an explicit file path, layered under the environment.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        // Only nested keys: `BREWBOT_CONTROLLER` itself is the CLI's URL flag.
        .merge(
            Env::prefixed(ENV_PREFIX)
                .filter(|key| key.as_str().contains("__"))
                .split("__"),
        );

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to runtime types ────────────────────────────────────

/// Build a `ClientConfig` from the `[controller]` section.
pub fn client_config(cfg: &Config) -> Result<ClientConfig, ConfigError> {
    let url: url::Url = cfg
        .controller
        .url
        .parse()
        .map_err(|_| invalid("controller.url", format!("invalid URL: {}", cfg.controller.url)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(
            "controller.url",
            format!("expected an http(s) URL, got scheme '{}'", url.scheme()),
        ));
    }
    if cfg.defaults.timeout == 0 {
        return Err(invalid("defaults.timeout", "must be at least 1 second"));
    }

    Ok(ClientConfig {
        url,
        transport: TransportConfig {
            timeout: Duration::from_secs(cfg.defaults.timeout),
            user_agent: cfg
                .controller
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_owned()),
            bypass_tunnel_reminder: cfg.controller.bypass_tunnel_reminder,
        },
    })
}

/// Build a `SimulationConfig` from the `[simulator]` section.
pub fn simulation_config(cfg: &Config) -> Result<SimulationConfig, ConfigError> {
    let sim = &cfg.simulator;

    if !(0.0..=MAX_BEAN_G).contains(&sim.initial_bean_g) {
        return Err(invalid(
            "simulator.initial_bean_g",
            format!("must be between 0 and {MAX_BEAN_G}"),
        ));
    }
    if !(0.0..=MAX_WATER_ML).contains(&sim.initial_water_ml) {
        return Err(invalid(
            "simulator.initial_water_ml",
            format!("must be between 0 and {MAX_WATER_ML}"),
        ));
    }

    Ok(SimulationConfig {
        timings: BrewTimings {
            grind: phase_duration("simulator.grind_secs", sim.grind_secs)?,
            pump: phase_duration("simulator.pump_secs", sim.pump_secs)?,
            heat: phase_duration("simulator.heat_secs", sim.heat_secs)?,
            dispense: phase_duration("simulator.dispense_secs", sim.dispense_secs)?,
        },
        initial_bean_g: sim.initial_bean_g,
        initial_water_ml: sim.initial_water_ml,
        require_cups: sim.require_cups,
    })
}

fn phase_duration(field: &str, secs: f64) -> Result<Duration, ConfigError> {
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if !d.is_zero() => Ok(d),
        _ => Err(invalid(field, format!("expected a positive number of seconds, got {secs}"))),
    }
}

/// Parse the simulator bind address.
pub fn bind_addr(cfg: &Config) -> Result<SocketAddr, ConfigError> {
    cfg.simulator
        .bind
        .parse()
        .map_err(|_| invalid("simulator.bind", format!("not a socket address: {}", cfg.simulator.bind)))
}

/// Build a `DriverConfig` from the `[session]` section.
pub fn driver_config(cfg: &Config) -> Result<DriverConfig, ConfigError> {
    let s = &cfg.session;

    if s.poll_interval_ms == 0 {
        return Err(invalid("session.poll_interval_ms", "must be greater than 0"));
    }
    if s.progress_tick_ms == 0 {
        return Err(invalid("session.progress_tick_ms", "must be greater than 0"));
    }
    if s.progress_cap > 100 {
        return Err(invalid("session.progress_cap", "must be at most 100"));
    }

    Ok(DriverConfig {
        poll_interval: Duration::from_millis(s.poll_interval_ms),
        progress: ProgressConfig {
            tick: Duration::from_millis(s.progress_tick_ms),
            step: s.progress_step,
            cap: s.progress_cap,
        },
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_translate_to_runtime_defaults() {
        let cfg = Config::default();

        assert_eq!(simulation_config(&cfg).unwrap(), SimulationConfig::default());
        assert_eq!(driver_config(&cfg).unwrap(), DriverConfig::default());

        let client = client_config(&cfg).unwrap();
        assert_eq!(client.url.as_str(), "http://127.0.0.1:5000/");
        assert!(client.transport.bypass_tunnel_reminder);
        assert_eq!(client.transport.timeout, Duration::from_secs(5));
        assert_eq!(bind_addr(&cfg).unwrap().port(), 5000);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.controller.url = "https://brewbot.loca.lt".into();
        cfg.controller.user_agent = Some("CustomApp/1.0".into());
        cfg.simulator.require_cups = true;
        cfg.simulator.grind_secs = 1.5;
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.controller, cfg.controller);
        assert_eq!(loaded.simulator, cfg.simulator);

        let sim = simulation_config(&loaded).unwrap();
        assert!(sim.require_cups);
        assert_eq!(sim.timings.grind, Duration::from_millis(1_500));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\npoll_interval_ms = 250\n").unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.session.poll_interval_ms, 250);
        assert_eq!(loaded.session.progress_cap, 95);
        assert_eq!(loaded.defaults, Defaults::default());
    }

    #[test]
    fn validation_names_the_field() {
        let mut cfg = Config::default();
        cfg.session.progress_cap = 150;
        let err = driver_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("session.progress_cap"), "{err}");

        let mut cfg = Config::default();
        cfg.simulator.dispense_secs = 0.0;
        let err = simulation_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("simulator.dispense_secs"), "{err}");

        let mut cfg = Config::default();
        cfg.controller.url = "ftp://machine".into();
        let err = client_config(&cfg).unwrap_err();
        assert!(err.to_string().contains("controller.url"), "{err}");

        let mut cfg = Config::default();
        cfg.simulator.initial_water_ml = 1_500.0;
        assert!(simulation_config(&cfg).is_err());
    }
}
