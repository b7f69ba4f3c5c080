//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::config::ScenarioConfig;
use crate::sim::kpi::EpisodeSummary;
use crate::sim::types::StepRecord;

/// Combined state response: scenario, summary and latest record.
#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub config: ScenarioConfig,
    pub summary: EpisodeSummary,
    /// Last settled hour, `null` for an empty episode.
    pub latest_step: Option<StepRecord>,
}

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// First time step (inclusive).
    pub from: Option<usize>,
    /// Last time step (inclusive).
    pub to: Option<usize>,
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
