// End-to-end tests: axum server on an ephemeral port, driven by the real
// `MachineClient`.
#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::net::SocketAddr;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use brewbot_api::{
    BrewCommand, CommandRequest, MachineClient, MachineStatus, SimulateRequest, StatusResponse,
};
use brewbot_core::{BrewTimings, MachineController, SimulationConfig};

// ── Helpers ─────────────────────────────────────────────────────────

struct TestServer {
    client: MachineClient,
    addr: SocketAddr,
    shutdown: CancellationToken,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn fast_timings() -> BrewTimings {
    BrewTimings {
        grind: Duration::from_millis(150),
        pump: Duration::from_millis(50),
        heat: Duration::from_millis(50),
        dispense: Duration::from_millis(100),
    }
}

async fn start(config: SimulationConfig) -> TestServer {
    let controller = MachineController::spawn(&config);
    let listener = brewbot_server::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = CancellationToken::new();
    tokio::spawn(brewbot_server::serve(
        listener,
        controller,
        shutdown.clone().cancelled_owned(),
    ));

    let client = MachineClient::from_reqwest(&format!("http://{addr}"), reqwest::Client::new())
        .unwrap();
    TestServer {
        client,
        addr,
        shutdown,
    }
}

async fn start_default() -> TestServer {
    start(SimulationConfig {
        timings: fast_timings(),
        ..SimulationConfig::default()
    })
    .await
}

/// Poll until the controller reports `want`, or fail after a few seconds.
async fn wait_for_status(client: &MachineClient, want: MachineStatus) -> StatusResponse {
    let poll = async {
        loop {
            let status = client.get_status().await.unwrap();
            if status.status == want {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), poll)
        .await
        .unwrap_or_else(|_| panic!("controller never reached {want}"))
}

// ── Status ──────────────────────────────────────────────────────────

#[tokio::test]
async fn status_reports_startup_defaults() {
    let server = start_default().await;

    let status = server.client.get_status().await.unwrap();

    assert_eq!(status.status, MachineStatus::Idle);
    assert_eq!(status.bean_weight, 60.0);
    assert_eq!(status.water_weight, 800.0);
    assert_eq!(status.boiler_temp, 22.0);
    assert_eq!(status.bean_level, 80);
    assert_eq!(status.water_level, 80);
    assert!(!status.water_level_warning);
    assert!(status.error_message.is_empty());
}

#[tokio::test]
async fn repeated_status_reads_are_identical() {
    let server = start_default().await;

    let first = server.client.get_status().await.unwrap();
    let second = server.client.get_status().await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn dashboard_polls_are_served() {
    let server = start_default().await;

    let resp = reqwest::get(format!("http://{}/status?source=web", server.addr))
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "IDLE");
    assert_eq!(body["waterLevelWarning"], false);
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn full_brew_cycle() {
    let server = start_default().await;
    let client = &server.client;

    let resp = client.send_command(BrewCommand::StartGrind).await.unwrap();
    assert!(resp.success);
    assert_eq!(resp.status, MachineStatus::Grind);

    wait_for_status(client, MachineStatus::UserPrompt).await;

    let resp = client.send_command(BrewCommand::StartDispense).await.unwrap();
    assert!(resp.success);
    assert_eq!(resp.status, MachineStatus::Pump);

    let idle = wait_for_status(client, MachineStatus::Idle).await;
    assert_eq!(idle.bean_weight, 45.0);
    assert_eq!(idle.water_weight, 550.0);
    assert_eq!(idle.boiler_temp, 22.0);
    assert_eq!(idle.flow_rate, 0.0);
}

#[tokio::test]
async fn not_enough_beans() {
    let server = start(SimulationConfig {
        initial_bean_g: 10.0,
        ..SimulationConfig::default()
    })
    .await;

    let resp = server
        .client
        .send_command(BrewCommand::StartGrind)
        .await
        .unwrap();

    assert!(!resp.success);
    assert_eq!(resp.status, MachineStatus::Error);
    assert_eq!(resp.error.as_deref(), Some("Not enough beans"));

    let status = server.client.get_status().await.unwrap();
    assert_eq!(status.status, MachineStatus::Error);
    assert_eq!(status.error_message, "Not enough beans");
    assert_eq!(status.bean_weight, 10.0);
}

#[tokio::test]
async fn command_without_transition_is_a_no_op() {
    let server = start_default().await;

    let resp = server
        .client
        .send_command(BrewCommand::StartDispense)
        .await
        .unwrap();

    assert!(!resp.success);
    assert_eq!(resp.status, MachineStatus::Idle);
    assert_eq!(server.client.get_status().await.unwrap().water_weight, 800.0);
}

#[tokio::test]
async fn unknown_command_is_answered_with_ok() {
    let server = start_default().await;

    let resp = server
        .client
        .send_raw_command(&CommandRequest {
            command: "MAKE_TEA".into(),
        })
        .await
        .unwrap();

    assert!(!resp.success);
    assert_eq!(resp.status, MachineStatus::Idle);
    assert_eq!(resp.error.as_deref(), Some("Unknown command: MAKE_TEA"));
}

#[tokio::test]
async fn missing_cup_blocks_when_required() {
    let server = start(SimulationConfig {
        require_cups: true,
        ..SimulationConfig::default()
    })
    .await;

    let resp = server
        .client
        .send_command(BrewCommand::StartGrind)
        .await
        .unwrap();

    assert_eq!(resp.error.as_deref(), Some("No cup under grinder"));
    assert_eq!(server.client.get_status().await.unwrap().bean_weight, 60.0);
}

// ── Manual override ─────────────────────────────────────────────────

#[tokio::test]
async fn low_water_override_raises_warning() {
    let server = start_default().await;

    let status = server
        .client
        .simulate(&SimulateRequest {
            water_level: Some(5.0),
            ..SimulateRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(status.water_weight, 50.0);
    assert_eq!(status.water_level, 5);
    assert!(status.water_level_warning);
    assert_eq!(server.client.get_status().await.unwrap(), status);
}

#[tokio::test]
async fn override_clamps_and_sets_sensors() {
    let server = start_default().await;

    let status = server
        .client
        .simulate(&SimulateRequest {
            bean_level: Some(250.0),
            water_temperature: Some(40.0),
            grinder_cup_detected: Some(true),
            ..SimulateRequest::default()
        })
        .await
        .unwrap();

    assert_eq!(status.bean_weight, 75.0);
    assert_eq!(status.bean_level, 100);
    assert_eq!(status.boiler_temp, 40.0);
    assert!(status.grinder_cup_detected);
    assert!(!status.dispenser_cup_detected);
}

#[tokio::test]
async fn override_status_runs_the_timed_phase_to_completion() {
    let server = start_default().await;

    let status = server
        .client
        .simulate(&SimulateRequest {
            status: Some(MachineStatus::Heat),
            ..SimulateRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(status.status, MachineStatus::Heat);

    let idle = wait_for_status(&server.client, MachineStatus::Idle).await;
    assert_eq!(idle.boiler_temp, 22.0);
}

#[tokio::test]
async fn unknown_override_status_is_a_client_error() {
    let server = start_default().await;

    let resp = reqwest::Client::new()
        .post(format!("http://{}/simulate", server.addr))
        .json(&json!({ "status": "BREWING" }))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_client_error(), "got {}", resp.status());
    assert_eq!(
        server.client.get_status().await.unwrap().status,
        MachineStatus::Idle
    );
}
