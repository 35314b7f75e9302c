// Integration tests for `MachineClient` using wiremock.
#![allow(clippy::unwrap_used, clippy::float_cmp)]

use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use brewbot_api::{
    BrewCommand, CommandRequest, Error, MachineClient, MachineStatus, SimulateRequest,
    TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, MachineClient) {
    let server = MockServer::start().await;
    let client = MachineClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn idle_status() -> serde_json::Value {
    json!({
        "status": "IDLE",
        "beanWeight": 60.0,
        "waterWeight": 800.0,
        "boilerTemp": 22.0,
        "flowRate": 0.0,
        "errorMessage": "",
        "grinderCupDetected": false,
        "dispenserCupDetected": true,
        "waterLevel": 80,
        "beanLevel": 80,
        "waterLevelWarning": false
    })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_get_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(idle_status()))
        .mount(&server)
        .await;

    let status = client.get_status().await.unwrap();

    assert_eq!(status.status, MachineStatus::Idle);
    assert_eq!(status.bean_weight, 60.0);
    assert_eq!(status.water_weight, 800.0);
    assert_eq!(status.water_level, 80);
    assert!(status.dispenser_cup_detected);
    assert!(!status.water_level_warning);
    assert!(status.error_message.is_empty());
}

#[tokio::test]
async fn test_send_command_accepted() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/command"))
        .and(body_json(json!({ "command": "START_GRIND" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "status": "GRIND" })),
        )
        .mount(&server)
        .await;

    let resp = client.send_command(BrewCommand::StartGrind).await.unwrap();

    assert!(resp.success);
    assert_eq!(resp.status, MachineStatus::Grind);
    assert_eq!(resp.error, None);
}

#[tokio::test]
async fn test_guard_rejection_is_data_not_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/command"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "status": "ERROR",
            "error": "Not enough beans"
        })))
        .mount(&server)
        .await;

    let resp = client.send_command(BrewCommand::StartGrind).await.unwrap();

    assert!(!resp.success);
    assert_eq!(resp.status, MachineStatus::Error);
    assert_eq!(resp.error.as_deref(), Some("Not enough beans"));
}

#[tokio::test]
async fn test_raw_command_passes_unknown_names_through() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/command"))
        .and(body_json(json!({ "command": "DESCALE" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "status": "IDLE",
            "error": "Unknown command: DESCALE"
        })))
        .mount(&server)
        .await;

    let req = CommandRequest {
        command: "DESCALE".into(),
    };
    let resp = client.send_raw_command(&req).await.unwrap();

    assert!(!resp.success);
    assert_eq!(resp.status, MachineStatus::Idle);
}

#[tokio::test]
async fn test_simulate_sends_only_set_fields() {
    let (server, client) = setup().await;

    let mut after = idle_status();
    after["waterWeight"] = json!(50.0);
    after["waterLevel"] = json!(5);
    after["waterLevelWarning"] = json!(true);

    Mock::given(method("POST"))
        .and(path("/simulate"))
        .and(body_json(json!({ "waterLevel": 5.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(after))
        .mount(&server)
        .await;

    let req = SimulateRequest {
        water_level: Some(5.0),
        ..SimulateRequest::default()
    };
    let status = client.simulate(&req).await.unwrap();

    assert_eq!(status.water_weight, 50.0);
    assert!(status.water_level_warning);
}

#[tokio::test]
async fn test_tunnel_bypass_header_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .and(header("bypass-tunnel-reminder", "true"))
        .and(header("user-agent", "CustomApp/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(idle_status()))
        .expect(1)
        .mount(&server)
        .await;

    let transport = TransportConfig {
        user_agent: "CustomApp/1.0".into(),
        ..TransportConfig::default()
    };
    let client = MachineClient::new(server.uri().parse().unwrap(), &transport).unwrap();

    client.get_status().await.unwrap();
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_http_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(503).set_body_string("warming up"))
        .mount(&server)
        .await;

    let err = client.get_status().await.unwrap_err();

    match err {
        Error::Http { status, ref body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "warming up");
        }
        other => panic!("expected Http error, got {other:?}"),
    }
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_malformed_status_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "brewing" })))
        .mount(&server)
        .await;

    let err = client.get_status().await.unwrap_err();

    assert!(
        matches!(err, Error::Deserialization { ref body, .. } if body.contains("brewing")),
        "expected Deserialization error, got {err:?}"
    );
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_unreachable_controller() {
    // Nothing listens on port 9 (discard) in the test environment.
    let client = MachineClient::from_reqwest("http://127.0.0.1:9", reqwest::Client::new()).unwrap();

    let err = client.get_status().await.unwrap_err();

    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    assert!(err.is_transient());
}
