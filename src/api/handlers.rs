//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, StateResponse, TelemetryQuery};
use crate::sim::types::StepRecord;

/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse {
        config: state.config.clone(),
        summary: state.summary.clone(),
        latest_step: state.records.last().cloned(),
    })
}

/// Returns step records, optionally filtered by time step range.
///
/// `GET /telemetry` → 200 + `Vec<StepRecord>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<StepRecord> = state
        .records
        .iter()
        .filter(|r| r.time_step >= from && r.time_step <= to)
        .cloned()
        .collect();

    Ok(Json(records))
}
