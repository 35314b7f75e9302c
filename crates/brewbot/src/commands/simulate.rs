//! `brewbot simulate`: manual override on a simulated controller.

use brewbot_api::{MachineStatus, SimulateRequest};
use brewbot_core::{CoreError, RemoteMachine};

use crate::cli::{GlobalOpts, SimulateArgs, StatusArg};
use crate::error::CliError;

use super::status::print_status;

pub async fn handle(
    remote: &RemoteMachine,
    args: SimulateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let req = build_request(args)?;
    tracing::debug!(?req, "sending manual override");

    let status = remote
        .client()
        .simulate(&req)
        .await
        .map_err(CoreError::from)?;
    print_status(&status, global);
    Ok(())
}

fn build_request(args: SimulateArgs) -> Result<SimulateRequest, CliError> {
    for (field, value) in [
        ("water-level", args.water_level),
        ("bean-level", args.bean_level),
        ("temperature", args.temperature),
    ] {
        if value.is_some_and(|v| !v.is_finite()) {
            return Err(CliError::Validation {
                field: field.into(),
                reason: "must be a finite number".into(),
            });
        }
    }

    let req = SimulateRequest {
        water_level: args.water_level,
        bean_level: args.bean_level,
        water_temperature: args.temperature,
        status: args.status.map(machine_status),
        grinder_cup_detected: args.grinder_cup,
        dispenser_cup_detected: args.dispenser_cup,
    };
    if req.is_empty() {
        return Err(CliError::Validation {
            field: "simulate".into(),
            reason: "nothing to override; pass at least one sensor or --status".into(),
        });
    }
    Ok(req)
}

fn machine_status(arg: StatusArg) -> MachineStatus {
    match arg {
        StatusArg::Idle => MachineStatus::Idle,
        StatusArg::Grind => MachineStatus::Grind,
        StatusArg::UserPrompt => MachineStatus::UserPrompt,
        StatusArg::Pump => MachineStatus::Pump,
        StatusArg::Heat => MachineStatus::Heat,
        StatusArg::Dispense => MachineStatus::Dispense,
        StatusArg::Error => MachineStatus::Error,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn args() -> SimulateArgs {
        SimulateArgs {
            water_level: None,
            bean_level: None,
            temperature: None,
            status: None,
            grinder_cup: None,
            dispenser_cup: None,
        }
    }

    #[test]
    fn empty_override_is_rejected() {
        assert!(matches!(
            build_request(args()),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn flags_map_onto_the_request() {
        let req = build_request(SimulateArgs {
            water_level: Some(5.0),
            status: Some(StatusArg::UserPrompt),
            grinder_cup: Some(true),
            ..args()
        })
        .unwrap();

        assert_eq!(req.water_level, Some(5.0));
        assert_eq!(req.status, Some(MachineStatus::UserPrompt));
        assert_eq!(req.grinder_cup_detected, Some(true));
        assert_eq!(req.bean_level, None);
    }

    #[test]
    fn non_finite_levels_are_rejected() {
        let err = build_request(SimulateArgs {
            bean_level: Some(f64::NAN),
            ..args()
        })
        .unwrap_err();
        assert!(matches!(err, CliError::Validation { field, .. } if field == "bean-level"));
    }
}
