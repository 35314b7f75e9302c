// ── Brew sessions ──
//
// Client-side state of one brew: the phase derived from polling, a
// cosmetic progress value and bookkeeping about the controller link.
// `BrewDriver` runs the polling loop; `BrewSession` is the plain state
// it mutates.

mod driver;
pub mod phase;
mod progress;

use brewbot_api::StatusResponse;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ProgressConfig;
use crate::error::CoreError;

pub use driver::{BrewDriver, DriverAction, DriverHandle};
pub use phase::{SessionPhase, error_phase, next_phase, phase_after, precheck};
pub use progress::Progress;

/// Read-only snapshot of a session, published by the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub name: Option<String>,
    pub started_at: DateTime<Utc>,
    pub phase: SessionPhase,
    pub progress: u8,
    /// Last snapshot the controller answered with.
    pub last_status: Option<StatusResponse>,
    /// Step commands the user has asked for, including retries.
    pub attempts: u32,
    /// Polls that failed in transport since the session started.
    pub failed_polls: u32,
    /// Most recent rejection or transport failure, for display.
    pub last_error: Option<String>,
    pub abandoned: bool,
}

impl SessionView {
    pub fn is_finished(&self) -> bool {
        self.abandoned || self.phase == SessionPhase::Done
    }
}

/// One brew, from the grinder instruction to `DONE`.
#[derive(Debug, Clone)]
pub struct BrewSession {
    id: Uuid,
    name: Option<String>,
    started_at: DateTime<Utc>,
    phase: SessionPhase,
    progress: Progress,
    last_status: Option<StatusResponse>,
    attempts: u32,
    failed_polls: u32,
    last_error: Option<String>,
    abandoned: bool,
}

impl BrewSession {
    pub fn new(name: Option<String>, progress: ProgressConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            started_at: Utc::now(),
            phase: SessionPhase::InstructGrinder,
            progress: Progress::new(progress),
            last_status: None,
            attempts: 0,
            failed_polls: 0,
            last_error: None,
            abandoned: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.progress.value()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn failed_polls(&self) -> u32 {
        self.failed_polls
    }

    pub fn last_status(&self) -> Option<&StatusResponse> {
        self.last_status.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.abandoned || self.phase == SessionPhase::Done
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            id: self.id,
            name: self.name.clone(),
            started_at: self.started_at,
            phase: self.phase,
            progress: self.progress.value(),
            last_status: self.last_status.clone(),
            attempts: self.attempts,
            failed_polls: self.failed_polls,
            last_error: self.last_error.clone(),
            abandoned: self.abandoned,
        }
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Fold a polled snapshot into the session.
    pub fn observe(&mut self, status: StatusResponse) {
        let next = next_phase(&status, self.phase);
        self.last_status = Some(status);
        self.set_phase(next);
    }

    /// Keep a fresh snapshot without deriving a phase from it.
    pub(crate) fn remember(&mut self, status: StatusResponse) {
        self.last_status = Some(status);
    }

    pub(crate) fn set_phase(&mut self, phase: SessionPhase) {
        if phase == self.phase {
            return;
        }
        info!(session = %self.id, from = %self.phase, to = %phase, "session phase");
        if phase.is_working() {
            self.progress.reset();
        }
        if phase == SessionPhase::Done {
            self.progress.complete();
        }
        if !phase.is_error() {
            self.last_error = None;
        }
        self.phase = phase;
    }

    pub(crate) fn record_attempt(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
    }

    pub(crate) fn record_rejection(&mut self, message: Option<String>) {
        warn!(session = %self.id, error = message.as_deref().unwrap_or(""), "command rejected");
        self.last_error = message;
    }

    /// Count a failed controller call. The phase never changes here.
    pub(crate) fn record_failure(&mut self, err: &CoreError) {
        self.failed_polls = self.failed_polls.saturating_add(1);
        warn!(session = %self.id, failed = self.failed_polls, error = %err, "controller unreachable");
        self.last_error = Some(err.to_string());
    }

    /// Advance the cosmetic progress. Returns `false` outside working phases.
    pub(crate) fn tick_progress(&mut self) -> bool {
        if self.phase.is_working() {
            self.progress.tick();
            true
        } else {
            false
        }
    }

    pub(crate) fn abandon(&mut self) {
        if !self.abandoned {
            info!(session = %self.id, phase = %self.phase, "session abandoned");
        }
        self.abandoned = true;
    }
}
