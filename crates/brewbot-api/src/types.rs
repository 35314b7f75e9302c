//! Wire types for the machine controller API.
//!
//! All bodies are JSON with camelCase field names. Status and command names
//! travel as SCREAMING_SNAKE_CASE strings (`"USER_PROMPT"`, `"START_GRIND"`).

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

// ── Status ───────────────────────────────────────────────────────────

/// Controller status, as reported by `GET /status`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MachineStatus {
    Idle,
    Grind,
    UserPrompt,
    Pump,
    Heat,
    Dispense,
    Error,
}

impl MachineStatus {
    /// Phases of the water side of the cycle (`PUMP`, `HEAT`, `DISPENSE`).
    pub fn is_dispensing(self) -> bool {
        matches!(self, Self::Pump | Self::Heat | Self::Dispense)
    }
}

/// Full machine snapshot, from `GET /status` and `POST /simulate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: MachineStatus,
    /// Grams of beans in the hopper.
    pub bean_weight: f64,
    /// Millilitres of water in the tank.
    pub water_weight: f64,
    /// Boiler temperature in °C.
    pub boiler_temp: f64,
    /// Dispense flow in mL/s; `0.0` outside `DISPENSE`.
    #[serde(default)]
    pub flow_rate: f64,
    /// Empty unless `status` is `ERROR`.
    #[serde(default)]
    pub error_message: String,
    pub grinder_cup_detected: bool,
    pub dispenser_cup_detected: bool,
    /// Tank fill, 0–100.
    pub water_level: u8,
    /// Hopper fill, 0–100.
    pub bean_level: u8,
    pub water_level_warning: bool,
}

// ── Commands ─────────────────────────────────────────────────────────

/// The two step commands a controller accepts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BrewCommand {
    StartGrind,
    StartDispense,
}

/// Body of `POST /command`.
///
/// The command travels as a plain string so that a controller can answer
/// an unknown name with a structured rejection instead of a parse failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
}

impl CommandRequest {
    pub fn new(command: BrewCommand) -> Self {
        Self {
            command: command.to_string(),
        }
    }

    /// Parse the command name, `None` when it is not a known command.
    pub fn parse(&self) -> Option<BrewCommand> {
        self.command.parse().ok()
    }
}

impl From<BrewCommand> for CommandRequest {
    fn from(command: BrewCommand) -> Self {
        Self::new(command)
    }
}

/// Response of `POST /command`.
///
/// Always delivered with HTTP 200; `success: false` carries guard
/// rejections and ignored commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    /// Controller status right after the guard was evaluated.
    pub status: MachineStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ── Manual override ──────────────────────────────────────────────────

/// Body of `POST /simulate`. Every field is optional; absent fields are
/// left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateRequest {
    /// Tank fill in percent (0–100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_level: Option<f64>,
    /// Hopper fill in percent (0–100).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bean_level: Option<f64>,
    /// Absolute boiler temperature in °C.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MachineStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grinder_cup_detected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispenser_cup_detected: Option<bool>,
}

impl SimulateRequest {
    /// `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn status_strings_match_the_wire() {
        assert_eq!(MachineStatus::UserPrompt.to_string(), "USER_PROMPT");
        assert_eq!("DISPENSE".parse::<MachineStatus>().ok(), Some(MachineStatus::Dispense));
        assert_eq!(serde_json::to_value(MachineStatus::Grind).unwrap(), json!("GRIND"));
        assert!("grind".parse::<MachineStatus>().is_err());
    }

    #[test]
    fn command_request_round_trips_known_names_only() {
        let req = CommandRequest::new(BrewCommand::StartDispense);
        assert_eq!(req.command, "START_DISPENSE");
        assert_eq!(req.parse(), Some(BrewCommand::StartDispense));

        let unknown = CommandRequest {
            command: "MAKE_TEA".into(),
        };
        assert_eq!(unknown.parse(), None);
    }

    #[test]
    fn command_response_omits_missing_error() {
        let ok = CommandResponse {
            success: true,
            status: MachineStatus::Grind,
            error: None,
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({ "success": true, "status": "GRIND" })
        );
    }

    #[test]
    fn simulate_request_uses_camel_case() {
        let body: SimulateRequest = serde_json::from_value(json!({
            "waterLevel": 5,
            "grinderCupDetected": true,
            "status": "ERROR"
        }))
        .unwrap();

        assert_eq!(body.water_level, Some(5.0));
        assert_eq!(body.grinder_cup_detected, Some(true));
        assert_eq!(body.status, Some(MachineStatus::Error));
        assert_eq!(body.bean_level, None);
        assert!(!body.is_empty());
        assert!(SimulateRequest::default().is_empty());
    }
}
