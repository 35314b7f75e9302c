// ── Domain-to-wire conversions ──
//
// Bridges controller-side types into the `brewbot_api` bodies served over
// HTTP, and the `/simulate` body back into a `ManualOverride`.

use brewbot_api::{CommandResponse, SimulateRequest, StatusResponse};

use crate::machine::{CommandOutcome, ManualOverride};
use crate::model::MachineState;

// ── Status ─────────────────────────────────────────────────────────

impl From<&MachineState> for StatusResponse {
    fn from(state: &MachineState) -> Self {
        Self {
            status: state.status(),
            bean_weight: state.bean_weight(),
            water_weight: state.water_weight(),
            boiler_temp: state.boiler_temp(),
            flow_rate: state.flow_rate(),
            error_message: state.error_message().to_owned(),
            grinder_cup_detected: state.grinder_cup_detected(),
            dispenser_cup_detected: state.dispenser_cup_detected(),
            water_level: state.water_level(),
            bean_level: state.bean_level(),
            water_level_warning: state.water_level_warning(),
        }
    }
}

impl From<MachineState> for StatusResponse {
    fn from(state: MachineState) -> Self {
        Self::from(&state)
    }
}

// ── Commands ───────────────────────────────────────────────────────

impl From<CommandOutcome> for CommandResponse {
    fn from(outcome: CommandOutcome) -> Self {
        Self {
            success: outcome.accepted,
            status: outcome.status,
            error: outcome.error,
        }
    }
}

// ── Manual override ────────────────────────────────────────────────

impl From<SimulateRequest> for ManualOverride {
    fn from(req: SimulateRequest) -> Self {
        Self {
            water_level: req.water_level,
            bean_level: req.bean_level,
            water_temperature: req.water_temperature,
            status: req.status,
            grinder_cup_detected: req.grinder_cup_detected,
            dispenser_cup_detected: req.dispenser_cup_detected,
        }
    }
}

impl From<&ManualOverride> for SimulateRequest {
    fn from(overrides: &ManualOverride) -> Self {
        Self {
            water_level: overrides.water_level,
            bean_level: overrides.bean_level,
            water_temperature: overrides.water_temperature,
            status: overrides.status,
            grinder_cup_detected: overrides.grinder_cup_detected,
            dispenser_cup_detected: overrides.dispenser_cup_detected,
        }
    }
}
