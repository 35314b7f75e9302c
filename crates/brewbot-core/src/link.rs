// ── Controller link ──
//
// What a brew session needs from a controller: read the status, send a
// step command. Implemented over HTTP by `RemoteMachine` and in-process
// by `MachineController`, so the same driver runs against either.

use std::future::Future;

use brewbot_api::{BrewCommand, CommandResponse, MachineClient, StatusResponse};

use crate::config::ClientConfig;
use crate::controller::MachineController;
use crate::error::CoreError;

/// The status/command surface of a machine controller.
pub trait MachineLink: Send + Sync {
    fn get_status(&self) -> impl Future<Output = Result<StatusResponse, CoreError>> + Send;

    fn issue_command(
        &self,
        command: BrewCommand,
    ) -> impl Future<Output = Result<CommandResponse, CoreError>> + Send;
}

// ── Remote ───────────────────────────────────────────────────────

/// A controller reached over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteMachine {
    client: MachineClient,
}

impl RemoteMachine {
    pub fn new(client: MachineClient) -> Self {
        Self { client }
    }

    pub fn connect(config: &ClientConfig) -> Result<Self, CoreError> {
        let client = MachineClient::new(config.url.clone(), &config.transport)?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &MachineClient {
        &self.client
    }
}

impl MachineLink for RemoteMachine {
    async fn get_status(&self) -> Result<StatusResponse, CoreError> {
        Ok(self.client.get_status().await?)
    }

    async fn issue_command(&self, command: BrewCommand) -> Result<CommandResponse, CoreError> {
        Ok(self.client.send_command(command).await?)
    }
}

// ── In-process ───────────────────────────────────────────────────

impl MachineLink for MachineController {
    async fn get_status(&self) -> Result<StatusResponse, CoreError> {
        Ok(StatusResponse::from(self.status().await?))
    }

    async fn issue_command(&self, command: BrewCommand) -> Result<CommandResponse, CoreError> {
        Ok(CommandResponse::from(
            MachineController::issue_command(self, command).await?,
        ))
    }
}
