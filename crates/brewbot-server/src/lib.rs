//! HTTP status/command interface for a simulated brewbot controller.
//!
//! `GET /status`, `POST /command` and `POST /simulate`, served by axum in
//! front of a [`MachineController`]. Guard rejections and unknown commands
//! are answered with HTTP 200 and `success: false`; only a stopped
//! controller produces an HTTP error.

mod error;
mod routes;

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use brewbot_core::MachineController;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::ServerError;

/// Application state shared across handlers.
pub struct AppState {
    pub controller: MachineController,
}

/// Build the router for a controller.
pub fn router(controller: MachineController) -> Router {
    let state = Arc::new(AppState { controller });

    Router::new()
        .merge(routes::machine_routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind a listener for the simulator.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    controller: MachineController,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let addr = listener.local_addr().map_err(ServerError::Serve)?;
    info!("simulator listening on http://{addr}");

    axum::serve(listener, router(controller))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServerError::Serve)?;

    info!("simulator stopped");
    Ok(())
}
