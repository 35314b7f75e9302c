// Manual override channel: direct writes that bypass the transition table.

use brewbot_api::MachineStatus;

/// A partial set of values to force onto the machine. Absent fields are
/// left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManualOverride {
    /// Tank fill in percent; translated to mL and clamped.
    pub water_level: Option<f64>,
    /// Hopper fill in percent; translated to grams and clamped.
    pub bean_level: Option<f64>,
    /// Absolute boiler temperature in °C.
    pub water_temperature: Option<f64>,
    pub status: Option<MachineStatus>,
    pub grinder_cup_detected: Option<bool>,
    pub dispenser_cup_detected: Option<bool>,
}

impl ManualOverride {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Message used when `ERROR` is forced without an earlier fault.
pub(crate) const OVERRIDE_ERROR_MESSAGE: &str = "Set by manual override";
