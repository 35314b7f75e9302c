// brewbot-core: brew state machine, simulated controller and client session
// driver, shared by the server and the CLI.

pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod link;
pub mod machine;
pub mod model;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, DriverConfig, ProgressConfig, SimulationConfig};
pub use controller::{MachineController, StatusStream};
pub use error::CoreError;
pub use link::{MachineLink, RemoteMachine};
pub use machine::{
    BrewMachine, BrewTimings, CommandOutcome, MachineFault, ManualOverride, ScheduledTransition,
};
pub use model::{MachineState, SensorUpdate};
pub use session::{
    BrewDriver, BrewSession, DriverAction, DriverHandle, SessionPhase, SessionView,
};

// Wire types consumers need alongside the core API.
pub use brewbot_api::{BrewCommand, CommandResponse, MachineStatus, StatusResponse};
