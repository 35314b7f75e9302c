//! CLI configuration: thin wrapper around `brewbot_config`.
//!
//! Re-exports the shared types and resolves runtime configs with
//! `GlobalOpts` / per-command flag overrides applied on top of the file.

use brewbot_core::{ClientConfig, DriverConfig, SimulationConfig};

use crate::cli::{BrewArgs, GlobalOpts, ServeArgs};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use brewbot_config::{Config, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Load the config file (defaults when it is missing) with flag overrides.
///
/// A file that exists but does not parse is an error, not a silent default.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = load_config()?;
    apply_global(&mut cfg, global);
    Ok(cfg)
}

/// Flag > env > file, for the options every command shares.
fn apply_global(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(ref url) = global.controller {
        cfg.controller.url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        cfg.defaults.timeout = timeout;
    }
}

/// Connection settings for talking to a controller.
pub fn resolve_client(cfg: &Config) -> Result<ClientConfig, CliError> {
    Ok(brewbot_config::client_config(cfg)?)
}

/// Polling and progress settings for `brew`.
pub fn resolve_driver(cfg: &Config, args: &BrewArgs) -> Result<DriverConfig, CliError> {
    let mut driver = brewbot_config::driver_config(cfg)?;
    if let Some(interval) = args.poll_interval {
        if interval.is_zero() {
            return Err(CliError::Validation {
                field: "poll-interval".into(),
                reason: "must be greater than 0".into(),
            });
        }
        driver.poll_interval = interval;
    }
    Ok(driver)
}

/// Simulator settings for `serve`.
pub fn resolve_simulation(cfg: &Config, args: &ServeArgs) -> Result<SimulationConfig, CliError> {
    let mut cfg = cfg.clone();
    if let Some(beans) = args.beans {
        cfg.simulator.initial_bean_g = beans;
    }
    if let Some(water) = args.water {
        cfg.simulator.initial_water_ml = water;
    }
    if args.require_cups {
        cfg.simulator.require_cups = true;
    }

    let mut sim = brewbot_config::simulation_config(&cfg)?;
    let overrides = [
        ("grind-time", args.grind_time, &mut sim.timings.grind),
        ("pump-time", args.pump_time, &mut sim.timings.pump),
        ("heat-time", args.heat_time, &mut sim.timings.heat),
        ("dispense-time", args.dispense_time, &mut sim.timings.dispense),
    ];
    for (field, value, slot) in overrides {
        let Some(value) = value else { continue };
        if value.is_zero() {
            return Err(CliError::Validation {
                field: field.into(),
                reason: "must be greater than 0".into(),
            });
        }
        *slot = value;
    }
    Ok(sim)
}

/// Listen address for `serve`.
pub fn resolve_bind(cfg: &Config, args: &ServeArgs) -> Result<std::net::SocketAddr, CliError> {
    match args.bind {
        Some(addr) => Ok(addr),
        None => Ok(brewbot_config::bind_addr(cfg)?),
    }
}
