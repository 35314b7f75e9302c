// ── Brew state machine ──
//
// Pure transition logic over `MachineState`. Time is injected: commands
// and `advance` both take `now`, and timed phases are recorded as
// `ScheduledTransition`s rather than sleeps. The controller task owns
// the only live instance.

mod manual;
mod schedule;

use std::time::Duration;

use brewbot_api::{BrewCommand, MachineStatus};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::SimulationConfig;
use crate::model::{
    AMBIENT_TEMP_C, BEANS_PER_BREW_G, BREW_TEMP_C, MachineState, SensorUpdate, WATER_PER_BREW_ML,
    percent_to_bean_g, percent_to_water_ml,
};

pub use manual::ManualOverride;
pub use schedule::ScheduledTransition;

use manual::OVERRIDE_ERROR_MESSAGE;
use schedule::Schedule;

// ── Timings ─────────────────────────────────────────────────────────

/// How long each timed phase lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrewTimings {
    pub grind: Duration,
    pub pump: Duration,
    pub heat: Duration,
    pub dispense: Duration,
}

impl Default for BrewTimings {
    fn default() -> Self {
        Self {
            grind: Duration::from_secs(5),
            pump: Duration::from_secs(3),
            heat: Duration::from_secs(5),
            dispense: Duration::from_secs(10),
        }
    }
}

impl BrewTimings {
    /// Duration of a timed phase, `None` for phases that wait on a command.
    pub fn duration_of(&self, status: MachineStatus) -> Option<Duration> {
        match status {
            MachineStatus::Grind => Some(self.grind),
            MachineStatus::Pump => Some(self.pump),
            MachineStatus::Heat => Some(self.heat),
            MachineStatus::Dispense => Some(self.dispense),
            MachineStatus::Idle | MachineStatus::UserPrompt | MachineStatus::Error => None,
        }
    }

    /// Time from `START_DISPENSE` to the machine returning to `IDLE`.
    pub fn dispense_cycle(&self) -> Duration {
        self.pump + self.heat + self.dispense
    }

    /// Nominal flow while dispensing, in mL/s.
    pub fn flow_rate(&self) -> f64 {
        let secs = self.dispense.as_secs_f64();
        if secs > 0.0 { WATER_PER_BREW_ML / secs } else { 0.0 }
    }
}

/// The status a timed phase moves to when its timer expires.
pub fn timed_exit(status: MachineStatus) -> Option<MachineStatus> {
    match status {
        MachineStatus::Grind => Some(MachineStatus::UserPrompt),
        MachineStatus::Pump => Some(MachineStatus::Heat),
        MachineStatus::Heat => Some(MachineStatus::Dispense),
        MachineStatus::Dispense => Some(MachineStatus::Idle),
        MachineStatus::Idle | MachineStatus::UserPrompt | MachineStatus::Error => None,
    }
}

// ── Faults and outcomes ─────────────────────────────────────────────

/// Why a guard sent the machine to `ERROR`. The display strings are the
/// `errorMessage` values clients see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MachineFault {
    #[error("Not enough beans")]
    NotEnoughBeans,
    #[error("Not enough water")]
    NotEnoughWater,
    #[error("No cup under grinder")]
    NoGrinderCup,
    #[error("No cup under dispenser")]
    NoDispenserCup,
}

/// Result of a single command, evaluated synchronously.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub accepted: bool,
    /// Status right after the guard was evaluated.
    pub status: MachineStatus,
    pub error: Option<String>,
}

impl CommandOutcome {
    fn accepted(status: MachineStatus) -> Self {
        Self {
            accepted: true,
            status,
            error: None,
        }
    }

    fn rejected(status: MachineStatus, error: String) -> Self {
        Self {
            accepted: false,
            status,
            error: Some(error),
        }
    }
}

// ── BrewMachine ─────────────────────────────────────────────────────

/// The brew state machine.
///
/// ```text
/// IDLE --START_GRIND--> GRIND --timer--> USER_PROMPT --START_DISPENSE--> PUMP
///   ^                                                                     |
///   +--timer-- DISPENSE <--timer-- HEAT <--timer-------------------------+
/// ```
///
/// A failed guard moves to `ERROR`; any step command sent from `ERROR`
/// re-evaluates the guard that failed.
#[derive(Debug)]
pub struct BrewMachine {
    state: MachineState,
    timings: BrewTimings,
    require_cups: bool,
    schedule: Schedule,
    failed_command: Option<BrewCommand>,
}

impl BrewMachine {
    pub fn new(state: MachineState, timings: BrewTimings, require_cups: bool) -> Self {
        Self {
            state,
            timings,
            require_cups,
            schedule: Schedule::default(),
            failed_command: None,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            MachineState::new(config.initial_bean_g, config.initial_water_ml),
            config.timings,
            config.require_cups,
        )
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn timings(&self) -> &BrewTimings {
        &self.timings
    }

    /// Transitions waiting on a timer, earliest first.
    pub fn pending(&self) -> &[ScheduledTransition] {
        self.schedule.as_slice()
    }

    /// When the earliest pending transition is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.schedule.next_deadline()
    }

    /// The command whose guard put the machine into `ERROR`, if any.
    pub fn failed_command(&self) -> Option<BrewCommand> {
        self.failed_command
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Evaluate `command` against the current state.
    ///
    /// Commands with no transition from the current status leave the
    /// machine untouched and come back with `accepted: false`.
    pub fn handle_command(&mut self, command: BrewCommand, now: Instant) -> CommandOutcome {
        let status = self.state.status();
        let command = match (status, command) {
            (MachineStatus::Idle, BrewCommand::StartGrind)
            | (MachineStatus::UserPrompt, BrewCommand::StartDispense) => command,
            // Any retry re-runs the guard that failed.
            (MachineStatus::Error, _) => self.failed_command.unwrap_or(command),
            _ => {
                debug!(%command, %status, "command ignored");
                return CommandOutcome::rejected(
                    status,
                    format!("{command} is not allowed while the machine is {status}"),
                );
            }
        };

        match command {
            BrewCommand::StartGrind => self.start_grind(now),
            BrewCommand::StartDispense => self.start_dispense(now),
        }
    }

    fn start_grind(&mut self, now: Instant) -> CommandOutcome {
        if self.state.bean_weight() < BEANS_PER_BREW_G {
            return self.fault(BrewCommand::StartGrind, MachineFault::NotEnoughBeans);
        }
        if self.require_cups && !self.state.grinder_cup_detected() {
            return self.fault(BrewCommand::StartGrind, MachineFault::NoGrinderCup);
        }

        self.state
            .apply_sensor_update(SensorUpdate::beans(-BEANS_PER_BREW_G));
        self.failed_command = None;
        self.enter(MachineStatus::Grind, now);
        CommandOutcome::accepted(MachineStatus::Grind)
    }

    fn start_dispense(&mut self, now: Instant) -> CommandOutcome {
        if self.state.water_weight() < WATER_PER_BREW_ML {
            return self.fault(BrewCommand::StartDispense, MachineFault::NotEnoughWater);
        }
        if self.require_cups && !self.state.dispenser_cup_detected() {
            return self.fault(BrewCommand::StartDispense, MachineFault::NoDispenserCup);
        }

        self.state
            .apply_sensor_update(SensorUpdate::water(-WATER_PER_BREW_ML));
        self.failed_command = None;
        self.enter(MachineStatus::Pump, now);
        CommandOutcome::accepted(MachineStatus::Pump)
    }

    fn fault(&mut self, command: BrewCommand, fault: MachineFault) -> CommandOutcome {
        warn!(%command, %fault, "guard failed");
        let message = fault.to_string();
        self.schedule.clear();
        self.state.set_flow_rate(0.0);
        self.state.fail(message.clone());
        self.failed_command = Some(command);
        CommandOutcome::rejected(MachineStatus::Error, message)
    }

    // ── Timers ──────────────────────────────────────────────────────

    /// Fire every transition due at `now`, in order, and return them.
    ///
    /// Follow-on transitions are scheduled from the due time of the one
    /// that produced them, so a late call catches up in a single pass.
    pub fn advance(&mut self, now: Instant) -> Vec<ScheduledTransition> {
        let mut fired = Vec::new();
        while let Some(transition) = self.schedule.pop_due(now) {
            if self.state.status() != transition.from {
                debug!(?transition, "dropping stale transition");
                continue;
            }

            match transition.to {
                MachineStatus::Heat => self
                    .state
                    .apply_sensor_update(SensorUpdate::temperature(BREW_TEMP_C)),
                MachineStatus::Idle => self
                    .state
                    .apply_sensor_update(SensorUpdate::temperature(AMBIENT_TEMP_C)),
                _ => {}
            }
            self.enter(transition.to, transition.due);
            fired.push(transition);
        }
        fired
    }

    /// Set `status` and arm its exit timer, counting from `since`.
    fn enter(&mut self, status: MachineStatus, since: Instant) {
        let from = self.state.status();
        self.state.set_status(status);
        self.state.set_flow_rate(if status == MachineStatus::Dispense {
            self.timings.flow_rate()
        } else {
            0.0
        });
        info!(%from, to = %status, "machine transition");

        if let (Some(next), Some(duration)) = (timed_exit(status), self.timings.duration_of(status)) {
            self.schedule.push(ScheduledTransition {
                due: since + duration,
                from: status,
                to: next,
            });
        }
    }

    // ── Manual override ─────────────────────────────────────────────

    /// Force values onto the machine, bypassing the transition table.
    ///
    /// Forcing a status drops every pending timer and forgets the failed
    /// command. A forced timed phase gets a fresh exit timer from `now`.
    pub fn apply_override(&mut self, overrides: &ManualOverride, now: Instant) {
        if let Some(percent) = overrides.water_level {
            self.state.set_water_ml(percent_to_water_ml(percent));
        }
        if let Some(percent) = overrides.bean_level {
            self.state.set_bean_g(percent_to_bean_g(percent));
        }
        if let Some(celsius) = overrides.water_temperature {
            self.state
                .apply_sensor_update(SensorUpdate::temperature(celsius));
        }
        self.state
            .set_cups(overrides.grinder_cup_detected, overrides.dispenser_cup_detected);

        if let Some(status) = overrides.status {
            self.schedule.clear();
            self.failed_command = None;
            if status == MachineStatus::Error {
                let message = if self.state.error_message().is_empty() {
                    OVERRIDE_ERROR_MESSAGE.to_owned()
                } else {
                    self.state.error_message().to_owned()
                };
                self.state.set_flow_rate(0.0);
                self.state.fail(message);
            } else {
                self.enter(status, now);
            }
        }

        debug!(?overrides, "manual override applied");
    }
}
