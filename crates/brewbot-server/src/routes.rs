// ── Machine routes ──

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use brewbot_api::{CommandRequest, CommandResponse, SimulateRequest, StatusResponse};
use brewbot_core::ManualOverride;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::error::ApiError;

type AppStateArc = Arc<AppState>;

pub(crate) fn machine_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/status", get(get_status))
        .route("/command", post(post_command))
        .route("/simulate", post(post_simulate))
}

#[derive(Debug, Deserialize)]
struct StatusQuery {
    source: Option<String>,
}

async fn get_status(
    State(state): State<AppStateArc>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>, ApiError> {
    let snapshot = state.controller.status().await?;

    // The web dashboard polls constantly; keep it out of the info log.
    if query.source.as_deref() == Some("web") {
        debug!(status = %snapshot.status(), "dashboard status poll");
    } else {
        info!(status = %snapshot.status(), "client checked machine status");
    }

    Ok(Json(StatusResponse::from(snapshot)))
}

async fn post_command(
    State(state): State<AppStateArc>,
    Json(req): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, ApiError> {
    let Some(command) = req.parse() else {
        let status = state.controller.status().await?.status();
        warn!(command = %req.command, "unknown command");
        return Ok(Json(CommandResponse {
            success: false,
            status,
            error: Some(format!("Unknown command: {}", req.command)),
        }));
    };

    info!(%command, "command received");
    let outcome = state.controller.issue_command(command).await?;
    if !outcome.accepted {
        warn!(%command, error = outcome.error.as_deref().unwrap_or(""), "command rejected");
    }

    Ok(Json(CommandResponse::from(outcome)))
}

async fn post_simulate(
    State(state): State<AppStateArc>,
    Json(req): Json<SimulateRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let overrides = ManualOverride::from(req);
    info!(?overrides, "manual override");

    let snapshot = state.controller.apply_override(overrides).await?;
    Ok(Json(StatusResponse::from(snapshot)))
}
