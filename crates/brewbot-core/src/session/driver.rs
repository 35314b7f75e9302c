// ── Brew driver ──
//
// Runs one `BrewSession` against a controller: polls status on a fixed
// interval, animates progress on another, and turns user actions into
// step commands. The session is published on a `watch` channel after
// every change.

use std::time::Duration;

use brewbot_api::BrewCommand;
use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::phase::{phase_after, precheck};
use super::{BrewSession, SessionView};
use crate::config::DriverConfig;
use crate::error::CoreError;
use crate::link::MachineLink;

const ACTION_CHANNEL_SIZE: usize = 16;

/// Something the user asked the session to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverAction {
    /// Send `START_GRIND` from the grinder instruction.
    StartGrinding,
    /// Send `START_DISPENSE` from the dispenser instruction.
    StartDispensing,
    /// Re-send the command of the current error phase.
    Retry,
    Abandon,
}

// ── DriverHandle ─────────────────────────────────────────────────

/// The caller's side of a running driver.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    actions: mpsc::Sender<DriverAction>,
    view: watch::Receiver<SessionView>,
    cancel: CancellationToken,
}

impl DriverHandle {
    pub async fn send(&self, action: DriverAction) -> Result<(), CoreError> {
        self.actions
            .send(action)
            .await
            .map_err(|_| CoreError::SessionEnded)
    }

    /// Latest published view.
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Stop the driver; the session ends as abandoned.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

// ── BrewDriver ───────────────────────────────────────────────────

/// Drives a brew session over any [`MachineLink`].
pub struct BrewDriver<L> {
    link: L,
    config: DriverConfig,
    session: BrewSession,
    view_tx: watch::Sender<SessionView>,
    actions: mpsc::Receiver<DriverAction>,
    cancel: CancellationToken,
}

impl<L: MachineLink> BrewDriver<L> {
    pub fn new(link: L, config: DriverConfig, name: Option<String>) -> (Self, DriverHandle) {
        let session = BrewSession::new(name, config.progress);
        let (view_tx, view_rx) = watch::channel(session.view());
        let (action_tx, action_rx) = mpsc::channel(ACTION_CHANNEL_SIZE);
        let cancel = CancellationToken::new();

        let handle = DriverHandle {
            actions: action_tx,
            view: view_rx,
            cancel: cancel.clone(),
        };
        let driver = Self {
            link,
            config,
            session,
            view_tx,
            actions: action_rx,
            cancel,
        };
        (driver, handle)
    }

    pub fn session(&self) -> &BrewSession {
        &self.session
    }

    /// Run until the session is done, abandoned or cancelled, and return
    /// the final view.
    pub async fn run(mut self) -> SessionView {
        let mut poll = ticker(self.config.poll_interval);
        let mut progress = ticker(self.config.progress.tick);
        // Progress starts one tick after entering a working phase.
        progress.reset();
        let mut actions_open = true;

        debug!(session = %self.session.id(), "brew driver started");

        while !self.session.is_finished() {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => self.session.abandon(),
                action = self.actions.recv(), if actions_open => match action {
                    Some(action) => self.perform(action).await,
                    None => actions_open = false,
                },
                _ = poll.tick() => self.poll_once().await,
                _ = progress.tick() => {
                    if self.session.tick_progress() {
                        self.publish();
                    }
                }
            }
        }

        self.publish();
        debug!(session = %self.session.id(), phase = %self.session.phase(), "brew driver finished");
        self.session.view()
    }

    /// Poll the controller once and fold the result into the session.
    pub async fn poll_once(&mut self) {
        match self.link.get_status().await {
            Ok(status) => self.session.observe(status),
            Err(e) => self.session.record_failure(&e),
        }
        self.publish();
    }

    /// Apply one user action.
    pub async fn perform(&mut self, action: DriverAction) {
        let phase = self.session.phase();
        let command = match action {
            DriverAction::Abandon => {
                self.session.abandon();
                None
            }
            DriverAction::StartGrinding => Some(BrewCommand::StartGrind),
            DriverAction::StartDispensing => Some(BrewCommand::StartDispense),
            DriverAction::Retry if phase.is_error() => phase.next_command(),
            DriverAction::Retry => None,
        };

        match command {
            Some(command) if phase.next_command() == Some(command) => self.step(command).await,
            Some(command) => debug!(%command, %phase, "action does not apply to this phase"),
            None => {}
        }
        self.publish();
    }

    /// Fresh snapshot, client-side precheck, then the command itself.
    async fn step(&mut self, command: BrewCommand) {
        self.session.record_attempt();
        let status = match self.link.get_status().await {
            Ok(status) => status,
            Err(e) => {
                self.session.record_failure(&e);
                return;
            }
        };

        let blocked = precheck(command, &status);
        self.session.remember(status);
        if let Some(error_phase) = blocked {
            debug!(%command, phase = %error_phase, "precheck failed, command not sent");
            self.session.set_phase(error_phase);
            return;
        }

        match self.link.issue_command(command).await {
            Ok(resp) => {
                let error = resp.error.clone().unwrap_or_default();
                if !resp.success {
                    self.session.record_rejection(resp.error);
                }
                let next = phase_after(resp.status, &error, self.session.phase());
                self.session.set_phase(next);
            }
            Err(e) => self.session.record_failure(&e),
        }
    }

    fn publish(&self) {
        let view = self.session.view();
        self.view_tx.send_if_modified(|current| {
            if *current == view {
                false
            } else {
                *current = view;
                true
            }
        });
    }
}

fn ticker(period: Duration) -> Interval {
    let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}
