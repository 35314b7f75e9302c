// brewbot-api: Async Rust client and wire types for the machine controller API

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::MachineClient;
pub use error::Error;
pub use transport::TransportConfig;
pub use types::{
    BrewCommand, CommandRequest, CommandResponse, MachineStatus, SimulateRequest, StatusResponse,
};
