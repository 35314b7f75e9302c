// ── Runtime configuration ──
//
// These types describe how to run a simulated controller, how to reach a
// remote one and how a brew session paces itself. They never touch disk:
// `brewbot-config` builds them from the layered config file.

use std::time::Duration;

use brewbot_api::TransportConfig;
use url::Url;

use crate::machine::BrewTimings;
use crate::model::{INITIAL_BEAN_G, INITIAL_WATER_ML};

/// How to reach a remote machine controller.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Controller root URL (e.g., `http://192.168.1.40:5000`).
    pub url: Url,
    pub transport: TransportConfig,
}

/// Settings for an in-process simulated controller.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub timings: BrewTimings,
    /// Hopper contents at startup, in grams.
    pub initial_bean_g: f64,
    /// Tank contents at startup, in mL.
    pub initial_water_ml: f64,
    /// Reject commands while the relevant cup sensor reads absent.
    pub require_cups: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            timings: BrewTimings::default(),
            initial_bean_g: INITIAL_BEAN_G,
            initial_water_ml: INITIAL_WATER_ML,
            require_cups: false,
        }
    }
}

/// Cosmetic progress pacing for the active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressConfig {
    pub tick: Duration,
    pub step: u8,
    pub cap: u8,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(200),
            step: 3,
            cap: 95,
        }
    }
}

/// Pacing of a `BrewDriver` session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// How often the controller status is polled.
    pub poll_interval: Duration,
    pub progress: ProgressConfig,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            progress: ProgressConfig::default(),
        }
    }
}
