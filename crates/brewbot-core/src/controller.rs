// ── Machine controller ──
//
// A single tokio task owns the `BrewMachine`. Commands, overrides and
// status reads arrive over an mpsc queue with oneshot replies; timed
// transitions fire from the same `select!` loop, so every mutation is
// serialized. Snapshots are published on a `watch` channel.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use brewbot_api::BrewCommand;
use futures_core::Stream;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::error::CoreError;
use crate::machine::{BrewMachine, CommandOutcome, ManualOverride};
use crate::model::MachineState;

const REQUEST_CHANNEL_SIZE: usize = 64;

/// A request sent through the controller queue.
enum ControllerRequest {
    Status {
        reply: oneshot::Sender<MachineState>,
    },
    Command {
        command: BrewCommand,
        reply: oneshot::Sender<CommandOutcome>,
    },
    Override {
        overrides: ManualOverride,
        reply: oneshot::Sender<MachineState>,
    },
}

// ── MachineController ────────────────────────────────────────────

/// Handle to a running simulated controller.
///
/// Cheaply cloneable. The task stops when [`shutdown`](Self::shutdown)
/// is called or the last handle is dropped.
#[derive(Clone)]
pub struct MachineController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    request_tx: mpsc::Sender<ControllerRequest>,
    state_rx: watch::Receiver<MachineState>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MachineController {
    /// Spawn a controller task for a fresh machine built from `config`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(config: &SimulationConfig) -> Self {
        Self::with_machine(BrewMachine::from_config(config))
    }

    /// Spawn a controller task that owns `machine`.
    pub fn with_machine(machine: BrewMachine) -> Self {
        let (request_tx, request_rx) = mpsc::channel(REQUEST_CHANNEL_SIZE);
        let (state_tx, state_rx) = watch::channel(machine.state().clone());
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(controller_task(machine, request_rx, state_tx, cancel.clone()));
        info!("machine controller started");

        Self {
            inner: Arc::new(ControllerInner {
                request_tx,
                state_rx,
                cancel,
                task: Mutex::new(Some(handle)),
            }),
        }
    }

    // ── Requests ─────────────────────────────────────────────────

    /// Current machine snapshot, with any due timers applied first.
    pub async fn status(&self) -> Result<MachineState, CoreError> {
        self.request(|reply| ControllerRequest::Status { reply }).await
    }

    /// Evaluate a step command. Guard rejections come back as an
    /// outcome with `accepted: false`, never as an `Err`.
    pub async fn issue_command(&self, command: BrewCommand) -> Result<CommandOutcome, CoreError> {
        self.request(|reply| ControllerRequest::Command { command, reply })
            .await
    }

    /// Force values onto the machine and return the resulting snapshot.
    pub async fn apply_override(&self, overrides: ManualOverride) -> Result<MachineState, CoreError> {
        self.request(|reply| ControllerRequest::Override { overrides, reply })
            .await
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ControllerRequest,
    ) -> Result<T, CoreError> {
        let (tx, rx) = oneshot::channel();
        self.inner
            .request_tx
            .send(build(tx))
            .await
            .map_err(|_| CoreError::ControllerStopped)?;
        rx.await.map_err(|_| CoreError::ControllerStopped)
    }

    // ── State observation ────────────────────────────────────────

    /// Latest published snapshot, without going through the queue.
    pub fn snapshot(&self) -> MachineState {
        self.inner.state_rx.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<MachineState> {
        self.inner.state_rx.clone()
    }

    /// Snapshot changes as a `Stream`, starting with the current one.
    pub fn status_stream(&self) -> StatusStream {
        StatusStream {
            inner: WatchStream::new(self.subscribe()),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        !self.inner.cancel.is_cancelled() && !self.inner.request_tx.is_closed()
    }

    /// Stop the controller task and wait for it to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(handle) = self.inner.task.lock().await.take() {
            let _ = handle.await;
        }
        info!("machine controller stopped");
    }
}

// ── StatusStream ─────────────────────────────────────────────────

/// `Stream` adapter over the controller's snapshot channel.
pub struct StatusStream {
    inner: WatchStream<MachineState>,
}

impl Stream for StatusStream {
    type Item = MachineState;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

// ── Background task ──────────────────────────────────────────────

async fn controller_task(
    mut machine: BrewMachine,
    mut rx: mpsc::Receiver<ControllerRequest>,
    state_tx: watch::Sender<MachineState>,
    cancel: CancellationToken,
) {
    loop {
        let deadline = machine.next_deadline();

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = sleep_until(deadline) => {
                machine.advance(Instant::now());
                publish(&state_tx, &machine);
            }
            request = rx.recv() => {
                let Some(request) = request else { break };
                let now = Instant::now();
                machine.advance(now);
                handle_request(&mut machine, request, now, &state_tx);
            }
        }
    }
    debug!("controller task exited");
}

fn handle_request(
    machine: &mut BrewMachine,
    request: ControllerRequest,
    now: Instant,
    state_tx: &watch::Sender<MachineState>,
) {
    match request {
        ControllerRequest::Status { reply } => {
            publish(state_tx, machine);
            let _ = reply.send(machine.state().clone());
        }
        ControllerRequest::Command { command, reply } => {
            let outcome = machine.handle_command(command, now);
            debug!(%command, accepted = outcome.accepted, status = %outcome.status, "command handled");
            publish(state_tx, machine);
            let _ = reply.send(outcome);
        }
        ControllerRequest::Override { overrides, reply } => {
            machine.apply_override(&overrides, now);
            publish(state_tx, machine);
            let _ = reply.send(machine.state().clone());
        }
    }
}

/// Publish only when the snapshot actually changed.
fn publish(state_tx: &watch::Sender<MachineState>, machine: &BrewMachine) {
    state_tx.send_if_modified(|current| {
        if current == machine.state() {
            false
        } else {
            current.clone_from(machine.state());
            true
        }
    });
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use std::time::Duration;

    use brewbot_api::MachineStatus;
    use pretty_assertions::assert_eq;
    use tokio_stream::StreamExt;

    use super::*;

    fn controller() -> MachineController {
        MachineController::spawn(&SimulationConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn status_is_idempotent() {
        let ctrl = controller();
        let a = ctrl.status().await.unwrap();
        let b = ctrl.status().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a, MachineState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn grind_completes_without_further_commands() {
        let ctrl = controller();

        let outcome = ctrl.issue_command(BrewCommand::StartGrind).await.unwrap();
        assert!(outcome.accepted);
        assert_eq!(outcome.status, MachineStatus::Grind);

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(ctrl.status().await.unwrap().status(), MachineStatus::Grind);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(ctrl.status().await.unwrap().status(), MachineStatus::UserPrompt);
        assert_eq!(ctrl.snapshot().status(), MachineStatus::UserPrompt);
    }

    #[tokio::test(start_paused = true)]
    async fn full_cycle_over_the_queue() {
        let ctrl = controller();
        let mut stream = ctrl.status_stream();
        assert_eq!(stream.next().await.unwrap().status(), MachineStatus::Idle);

        ctrl.issue_command(BrewCommand::StartGrind).await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        let outcome = ctrl.issue_command(BrewCommand::StartDispense).await.unwrap();
        assert_eq!(outcome.status, MachineStatus::Pump);

        let mut seen = Vec::new();
        while let Some(state) = stream.next().await {
            seen.push(state.status());
            if state.status() == MachineStatus::Idle {
                assert_eq!(state.bean_weight(), 45.0);
                assert_eq!(state.water_weight(), 550.0);
                assert_eq!(state.boiler_temp(), 22.0);
                break;
            }
        }
        assert_eq!(seen.last(), Some(&MachineStatus::Idle));
        assert!(seen.contains(&MachineStatus::Dispense));
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_command_is_data() {
        let ctrl = MachineController::spawn(&SimulationConfig {
            initial_bean_g: 10.0,
            ..SimulationConfig::default()
        });

        let outcome = ctrl.issue_command(BrewCommand::StartGrind).await.unwrap();
        assert!(!outcome.accepted);
        assert_eq!(outcome.error.as_deref(), Some("Not enough beans"));

        let state = ctrl.status().await.unwrap();
        assert_eq!(state.status(), MachineStatus::Error);
        assert_eq!(state.bean_weight(), 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn override_round_trip() {
        let ctrl = controller();
        let state = ctrl
            .apply_override(ManualOverride {
                water_level: Some(5.0),
                dispenser_cup_detected: Some(true),
                ..ManualOverride::default()
            })
            .await
            .unwrap();

        assert!(state.water_level_warning());
        assert!(state.dispenser_cup_detected());
        assert_eq!(ctrl.snapshot(), state);
    }

    #[tokio::test(start_paused = true)]
    async fn requests_fail_after_shutdown() {
        let ctrl = controller();
        ctrl.shutdown().await;

        assert!(!ctrl.is_running());
        let err = ctrl.status().await.unwrap_err();
        assert!(matches!(err, CoreError::ControllerStopped));
    }
}
