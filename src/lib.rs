//! Hourly microgrid simulator with a fleet of thermostatically controlled
//! loads, price-responsive deferrable demand, a storage battery and a grid
//! connection, exposed as an episodic decision environment.

#[cfg(feature = "api")]
pub mod api;
pub mod config;
pub mod data;
pub mod devices;
pub mod error;
pub mod forecast;
pub mod io;
pub mod runner;
/// Simulation engine, actions, observations and episode records.
pub mod sim;

pub use config::{ConfigError, ScenarioConfig};
pub use data::MarketData;
pub use error::{Result, SimError};
pub use sim::action::Action;
pub use sim::engine::MicrogridSimulator;
pub use sim::types::{DaySelection, Environment, StepOutcome, StepRecord};
