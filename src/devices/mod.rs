//! Physical sub-models of the microgrid.

/// Aggregated storage battery.
pub mod battery;
/// Price-responsive deferrable loads.
pub mod demand;
/// Renewable generation series.
pub mod generation;
/// Thermostatically controlled loads.
pub mod thermal;

// Re-export the main types for convenience
pub use battery::Battery;
pub use demand::{DemandParams, DemandResponseLoad, NEUTRAL_TIER};
pub use generation::GenerationSource;
pub use thermal::{ThermalParams, ThermalUnit};
