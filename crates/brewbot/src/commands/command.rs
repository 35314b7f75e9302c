//! `brewbot command grind|dispense`.

use brewbot_api::{BrewCommand, CommandResponse};
use brewbot_core::{MachineLink, RemoteMachine};

use crate::cli::{CommandArgs, GlobalOpts, StepArg};
use crate::error::CliError;
use crate::output;

pub async fn handle(
    remote: &RemoteMachine,
    args: CommandArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let command = match args.step {
        StepArg::Grind => BrewCommand::StartGrind,
        StepArg::Dispense => BrewCommand::StartDispense,
    };

    let resp = remote.issue_command(command).await?;
    if !resp.success {
        return Err(CliError::Rejected {
            command: command.to_string(),
            status: resp.status.to_string(),
            message: resp
                .error
                .unwrap_or_else(|| "no reason given".into()),
        });
    }

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &resp,
        |r: &CommandResponse| {
            output::detail_lines(&[
                ("Command", command.to_string()),
                ("Status", output::status_label(r.status, color)),
            ])
        },
        |r| r.status.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
