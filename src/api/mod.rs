//! Read-only REST API over a finished episode.
//!
//! Provides two GET endpoints:
//! - `/state` returns the scenario, episode summary and latest record
//! - `/telemetry` returns step records with optional range filtering

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::Result;
use crate::sim::kpi::EpisodeSummary;
use crate::sim::types::StepRecord;

pub use types::{ErrorResponse, StateResponse, TelemetryQuery};

/// Immutable application state shared across all request handlers.
///
/// Built once after the episode completes and wrapped in `Arc`; all data
/// is read-only so no locks are needed.
pub struct AppState {
    /// Scenario the episode ran with.
    pub config: ScenarioConfig,
    pub summary: EpisodeSummary,
    /// Settled hours in order.
    pub records: Vec<StepRecord>,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .with_state(state)
}

/// Binds to the given address and serves the API until the process exits.
///
/// # Errors
///
/// Returns `SimError::Io` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
