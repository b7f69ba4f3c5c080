//! File formats: input series and episode telemetry.

/// CSV export of step records.
pub mod export;
pub mod series;
