//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while building or driving a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// A time series does not cover the hours an episode would read.
    #[error("series `{series}` has {len} hours, at least {required} are required")]
    SeriesTooShort {
        series: &'static str,
        len: usize,
        required: usize,
    },

    /// Action components outside their declared ranges.
    #[error("invalid action: {0}")]
    InvalidAction(String),

    /// Random day range is empty or otherwise unusable.
    #[error("day range {start}..{end} is empty")]
    EmptyDayRange { start: usize, end: usize },

    /// `step` called before the first `reset`.
    #[error("no live episode, call reset first")]
    NotStarted,

    /// `step` called on an episode that already reached its terminal step.
    #[error("episode is terminal, call reset before stepping again")]
    EpisodeTerminated,

    /// Parameter sampling distribution rejected its arguments.
    #[error("invalid sampling distribution for {name}: {message}")]
    InvalidDistribution { name: &'static str, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// A numeric cell could not be parsed.
    #[error("{}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SimError>;
