// ── Session phases ──
//
// The client-side view of a brew, derived from polled controller status
// and the phase the session was already in.

use brewbot_api::{BrewCommand, MachineStatus, StatusResponse};
use serde::Serialize;
use strum::{Display, IntoStaticStr};

use crate::machine::MachineFault;
use crate::model::{BEANS_PER_BREW_G, WATER_PER_BREW_ML};

/// Where a brew session stands, from the user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    InstructGrinder,
    ErrorGrinder,
    ErrorBeans,
    Grinding,
    InstructDispenser,
    ErrorDispenser,
    ErrorWater,
    Dispensing,
    Done,
}

impl SessionPhase {
    pub fn is_error(self) -> bool {
        matches!(
            self,
            Self::ErrorGrinder | Self::ErrorBeans | Self::ErrorDispenser | Self::ErrorWater
        )
    }

    /// Phases that run a cosmetic progress bar.
    pub fn is_working(self) -> bool {
        matches!(self, Self::Grinding | Self::Dispensing)
    }

    /// Phases that wait for the user to press on.
    pub fn awaits_user(self) -> bool {
        matches!(self, Self::InstructGrinder | Self::InstructDispenser) || self.is_error()
    }

    pub fn is_grinder_side(self) -> bool {
        matches!(
            self,
            Self::InstructGrinder | Self::ErrorGrinder | Self::ErrorBeans | Self::Grinding
        )
    }

    /// The command that moves the session forward (or retries) from here.
    pub fn next_command(self) -> Option<BrewCommand> {
        match self {
            Self::InstructGrinder | Self::ErrorGrinder | Self::ErrorBeans => {
                Some(BrewCommand::StartGrind)
            }
            Self::InstructDispenser | Self::ErrorDispenser | Self::ErrorWater => {
                Some(BrewCommand::StartDispense)
            }
            Self::Grinding | Self::Dispensing | Self::Done => None,
        }
    }

    /// Short heading for this phase.
    pub fn title(self) -> &'static str {
        match self {
            Self::InstructGrinder => "Add Cup Under Grinder",
            Self::ErrorGrinder => "No Cup Detected",
            Self::ErrorBeans => "Out of Beans",
            Self::Grinding => "Grinding Beans...",
            Self::InstructDispenser => "Move Filtered Cup",
            Self::ErrorDispenser => "Cup Not Found",
            Self::ErrorWater => "Out of Water",
            Self::Dispensing => "Extracting Coffee...",
            Self::Done => "Enjoy your Coffee!",
        }
    }

    /// What the user should do next, if anything.
    pub fn hint(self) -> Option<&'static str> {
        match self {
            Self::InstructGrinder => {
                Some("Place your empty filter cup exactly under the grinder spout.")
            }
            Self::ErrorGrinder => {
                Some("Insert the filter cup securely under the grinder and try again.")
            }
            Self::ErrorBeans => Some("Refill the coffee beans in the hopper to continue."),
            Self::InstructDispenser => Some(
                "Slide the filtered cup with the ground beans under the water dispenser.",
            ),
            Self::ErrorDispenser => {
                Some("Make sure the cup is aligned directly under the water dispenser.")
            }
            Self::ErrorWater => Some("Refill the water tank to continue."),
            Self::Grinding | Self::Dispensing | Self::Done => None,
        }
    }
}

/// Derive the next phase from a polled status and the current phase.
///
/// Combinations not listed leave the phase unchanged; `DONE` is final.
pub fn next_phase(status: &StatusResponse, prior: SessionPhase) -> SessionPhase {
    phase_after(status.status, &status.error_message, prior)
}

/// [`next_phase`] for a bare status, as carried by a command response.
pub fn phase_after(status: MachineStatus, error_message: &str, prior: SessionPhase) -> SessionPhase {
    if prior == SessionPhase::Done {
        return prior;
    }

    match status {
        MachineStatus::Grind => SessionPhase::Grinding,
        // Ground coffee is already waiting, even if this session did not grind it.
        MachineStatus::UserPrompt if prior.is_grinder_side() => SessionPhase::InstructDispenser,
        s if s.is_dispensing() => SessionPhase::Dispensing,
        MachineStatus::Idle if prior == SessionPhase::Dispensing => SessionPhase::Done,
        MachineStatus::Error => error_phase(error_message, prior.is_grinder_side()),
        _ => prior,
    }
}

const FAULT_PHASES: [(MachineFault, SessionPhase); 4] = [
    (MachineFault::NotEnoughBeans, SessionPhase::ErrorBeans),
    (MachineFault::NoGrinderCup, SessionPhase::ErrorGrinder),
    (MachineFault::NotEnoughWater, SessionPhase::ErrorWater),
    (MachineFault::NoDispenserCup, SessionPhase::ErrorDispenser),
];

/// Map a controller error message onto an error phase.
///
/// Known faults name their own phase regardless of where the session
/// stands. Anything else (a forced ERROR, say) reads as a resource
/// shortage on the session's current side.
pub fn error_phase(message: &str, grinder_side: bool) -> SessionPhase {
    FAULT_PHASES
        .into_iter()
        .find(|(fault, _)| message == fault.to_string())
        .map_or(
            if grinder_side {
                SessionPhase::ErrorBeans
            } else {
                SessionPhase::ErrorWater
            },
            |(_, phase)| phase,
        )
}

/// Client-side precondition for `command` against a fresh snapshot.
///
/// Returns the error phase the session should move to, or `None` when
/// the command may be sent. Resources are checked before the cup.
pub fn precheck(command: BrewCommand, status: &StatusResponse) -> Option<SessionPhase> {
    match command {
        BrewCommand::StartGrind if status.bean_weight < BEANS_PER_BREW_G => {
            Some(SessionPhase::ErrorBeans)
        }
        BrewCommand::StartGrind if !status.grinder_cup_detected => Some(SessionPhase::ErrorGrinder),
        BrewCommand::StartDispense if status.water_weight < WATER_PER_BREW_ML => {
            Some(SessionPhase::ErrorWater)
        }
        BrewCommand::StartDispense if !status.dispenser_cup_detected => {
            Some(SessionPhase::ErrorDispenser)
        }
        BrewCommand::StartGrind | BrewCommand::StartDispense => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::MachineState;

    fn status(status: MachineStatus) -> StatusResponse {
        StatusResponse {
            status,
            ..StatusResponse::from(&MachineState::default())
        }
    }

    #[test]
    fn mapping_table() {
        use SessionPhase as P;

        let cases = [
            (MachineStatus::Grind, P::InstructGrinder, P::Grinding),
            (MachineStatus::Grind, P::ErrorBeans, P::Grinding),
            (MachineStatus::UserPrompt, P::Grinding, P::InstructDispenser),
            (MachineStatus::UserPrompt, P::InstructGrinder, P::InstructDispenser),
            (MachineStatus::UserPrompt, P::Dispensing, P::Dispensing),
            (MachineStatus::Pump, P::InstructDispenser, P::Dispensing),
            (MachineStatus::Heat, P::Dispensing, P::Dispensing),
            (MachineStatus::Dispense, P::ErrorWater, P::Dispensing),
            (MachineStatus::Idle, P::Dispensing, P::Done),
            (MachineStatus::Idle, P::InstructGrinder, P::InstructGrinder),
            (MachineStatus::Idle, P::ErrorBeans, P::ErrorBeans),
            (MachineStatus::Grind, P::Done, P::Done),
        ];

        for (machine, prior, expected) in cases {
            assert_eq!(
                next_phase(&status(machine), prior),
                expected,
                "{machine} after {prior}"
            );
        }
    }

    #[test]
    fn polled_error_maps_by_message() {
        let mut body = status(MachineStatus::Error);

        body.error_message = "Not enough beans".into();
        assert_eq!(next_phase(&body, SessionPhase::InstructGrinder), SessionPhase::ErrorBeans);

        body.error_message = "No cup under grinder".into();
        assert_eq!(next_phase(&body, SessionPhase::Grinding), SessionPhase::ErrorGrinder);

        body.error_message = "Not enough water".into();
        assert_eq!(next_phase(&body, SessionPhase::InstructDispenser), SessionPhase::ErrorWater);

        body.error_message = "No cup under dispenser".into();
        assert_eq!(next_phase(&body, SessionPhase::InstructDispenser), SessionPhase::ErrorDispenser);
    }

    #[test]
    fn polled_fault_wins_over_session_side() {
        let mut body = status(MachineStatus::Error);

        body.error_message = "Not enough water".into();
        assert_eq!(next_phase(&body, SessionPhase::InstructGrinder), SessionPhase::ErrorWater);

        body.error_message = "No cup under dispenser".into();
        assert_eq!(next_phase(&body, SessionPhase::ErrorBeans), SessionPhase::ErrorDispenser);

        body.error_message = "Not enough beans".into();
        assert_eq!(next_phase(&body, SessionPhase::InstructDispenser), SessionPhase::ErrorBeans);

        body.error_message = "Set by manual override".into();
        assert_eq!(next_phase(&body, SessionPhase::InstructGrinder), SessionPhase::ErrorBeans);
        assert_eq!(next_phase(&body, SessionPhase::Dispensing), SessionPhase::ErrorWater);
    }

    #[test]
    fn precheck_orders_resources_before_cups() {
        let mut body = status(MachineStatus::Idle);
        body.bean_weight = 10.0;
        body.grinder_cup_detected = false;
        assert_eq!(precheck(BrewCommand::StartGrind, &body), Some(SessionPhase::ErrorBeans));

        body.bean_weight = 15.0;
        assert_eq!(precheck(BrewCommand::StartGrind, &body), Some(SessionPhase::ErrorGrinder));

        body.grinder_cup_detected = true;
        assert_eq!(precheck(BrewCommand::StartGrind, &body), None);

        body.water_weight = 249.0;
        body.dispenser_cup_detected = true;
        assert_eq!(precheck(BrewCommand::StartDispense, &body), Some(SessionPhase::ErrorWater));

        body.water_weight = 250.0;
        body.dispenser_cup_detected = false;
        assert_eq!(precheck(BrewCommand::StartDispense, &body), Some(SessionPhase::ErrorDispenser));
    }

    #[test]
    fn every_waiting_phase_has_a_command() {
        for phase in [
            SessionPhase::InstructGrinder,
            SessionPhase::ErrorGrinder,
            SessionPhase::ErrorBeans,
            SessionPhase::InstructDispenser,
            SessionPhase::ErrorDispenser,
            SessionPhase::ErrorWater,
        ] {
            assert!(phase.awaits_user());
            assert!(phase.next_command().is_some());
            assert!(phase.hint().is_some());
        }
        assert_eq!(SessionPhase::InstructDispenser.to_string(), "INSTRUCT_DISPENSER");
    }
}
