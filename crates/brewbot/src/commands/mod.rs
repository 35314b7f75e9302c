//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod brew;
pub mod command;
pub mod config_cmd;
pub mod serve;
pub mod simulate;
pub mod status;
pub mod util;

use brewbot_core::RemoteMachine;

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let client = config::resolve_client(cfg)?;
    let remote = RemoteMachine::connect(&client)?;
    tracing::debug!(url = %client.url, "controller link ready");

    match cmd {
        Command::Status => status::handle(&remote, global).await,
        Command::Command(args) => command::handle(&remote, args, global).await,
        Command::Simulate(args) => simulate::handle(&remote, args, global).await,
        Command::Brew(args) => {
            let driver = config::resolve_driver(cfg, &args)?;
            brew::handle(remote, driver, args, global).await
        }
        // Serve, Config and Completions are handled before dispatch
        Command::Serve(_) | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
