//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hourly base-load profile used when a scenario does not override it.
pub const DEFAULT_BASE_LOAD: [f64; 24] = [
    0.4, 0.3, 0.2, 0.2, 0.2, 0.2, 0.3, 0.5, 0.6, 0.6, 0.5, 0.5, 0.5, 0.4, 0.4, 0.6, 0.8, 1.4, 1.2,
    0.9, 0.8, 0.6, 0.5, 0.4,
];

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Episode length, fleet sizes, day range and seed.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// TCL comfort band and parameter sampling.
    #[serde(default)]
    pub fleet: FleetConfig,
    /// Deferrable load profile and parameter sampling.
    #[serde(default)]
    pub loads: LoadsConfig,
    /// Battery storage parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Tariffs, transfer fees and reward scaling.
    #[serde(default)]
    pub market: MarketConfig,
    /// Where hourly input series come from.
    #[serde(default)]
    pub data: DataConfig,
}

/// Episode length, fleet sizes, day range and seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Hours per episode (must be > 1).
    pub iterations: usize,
    /// Number of TCLs in the fleet.
    pub num_tcls: usize,
    /// Number of deferrable loads.
    pub num_loads: usize,
    /// First day eligible for random selection (inclusive).
    pub day0: usize,
    /// Last day eligible for random selection (exclusive).
    pub dayn: usize,
    /// Master random seed.
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            iterations: 24,
            num_tcls: 100,
            num_loads: 150,
            day0: 0,
            dayn: 10,
            seed: 1,
        }
    }
}

/// A normal distribution given by mean and standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NormalSpec {
    pub mean: f64,
    pub std: f64,
}

impl NormalSpec {
    pub const fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }
}

/// TCL comfort band and parameter sampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FleetConfig {
    /// Comfort floor (°C).
    pub t_min: f64,
    /// Comfort ceiling (°C).
    pub t_max: f64,
    /// Nominal unit power, used for the dispatch budget.
    pub avg_power: f64,
    /// Outdoor coupling coefficient.
    pub ca: NormalSpec,
    /// Thermal-mass coupling coefficient.
    pub cm: NormalSpec,
    /// Constant heat gain.
    pub q: NormalSpec,
    /// Standard deviation of unit power around `avg_power`.
    pub power_std: f64,
    /// Lower bound of the uniform initial temperature (°C).
    pub init_temp_min: f64,
    /// Upper bound of the uniform initial temperature (°C).
    pub init_temp_max: f64,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            t_min: 19.0,
            t_max: 25.0,
            avg_power: 1.5,
            ca: NormalSpec::new(0.004, 0.0008),
            cm: NormalSpec::new(0.3, 0.004),
            q: NormalSpec::new(0.0, 0.01),
            power_std: 0.01,
            init_temp_min: 15.0,
            init_temp_max: 24.0,
        }
    }
}

/// Deferrable load profile and parameter sampling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadsConfig {
    /// Hourly base-load profile, repeated cyclically.
    pub base_load: Vec<f64>,
    /// Price sensitivity (clamped to >= 0 after sampling).
    pub price_sens: NormalSpec,
    /// Maximum variable load.
    pub max_v_load: NormalSpec,
    /// Patience in hours (truncated, clamped to >= 1 after sampling).
    pub patience: NormalSpec,
}

impl Default for LoadsConfig {
    fn default() -> Self {
        Self {
            base_load: DEFAULT_BASE_LOAD.to_vec(),
            price_sens: NormalSpec::new(0.4, 0.3),
            max_v_load: NormalSpec::new(0.4, 0.01),
            patience: NormalSpec::new(10.0, 6.0),
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Full-charge capacity.
    pub capacity: f64,
    /// Discharge efficiency (0.0–1.0].
    pub use_d: f64,
    /// Self-discharge rate per hour.
    pub dissipation: f64,
    /// Charge efficiency (0.0–1.0].
    pub rate_c: f64,
    /// Maximum draw per hour.
    pub max_dd: f64,
    /// Maximum charging input per hour.
    pub charge_e: f64,
    /// Apply self-discharge after every settlement.
    pub dissipate_each_step: bool,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity: 500.0,
            use_d: 0.9,
            dissipation: 0.001,
            rate_c: 0.9,
            max_dd: 250.0,
            charge_e: 250.0,
            dissipate_each_step: false,
        }
    }
}

/// Tariffs, transfer fees and reward scaling. Prices are in cents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketConfig {
    /// Retail price before the tier offset.
    pub market_price: f64,
    /// Offset added to the market price for each tier.
    pub price_tiers: [f64; 5],
    /// Price earned per unit of TCL consumption.
    pub tcl_sale_price: f64,
    /// Penalty per unit the high-price counter exceeds its cap.
    pub high_price_penalty: f64,
    /// Cost per unit of renewable generation.
    pub generation_cost: f64,
    /// Fee added to the grid buy price.
    pub import_transfer_price: f64,
    /// Fee added to the grid sell price.
    pub export_transfer_price: f64,
    /// Divisor converting price units into reward currency.
    pub currency_scale: f64,
    /// Divisor applied to the accumulated step reward.
    pub reward_scale: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            market_price: 5.48,
            price_tiers: [-3.0, -1.5, 0.0, 1.5, 3.0],
            tcl_sale_price: 3.2,
            high_price_penalty: 0.0,
            generation_cost: 3.2,
            import_transfer_price: 0.97,
            export_transfer_price: 0.09,
            currency_scale: 100.0,
            reward_scale: 100.0,
        }
    }
}

/// Where hourly input series come from.
///
/// With `dir` unset a seeded synthetic dataset covering `synthetic_days`
/// is generated instead of reading files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Directory holding the CSV files.
    pub dir: Option<PathBuf>,
    /// Outdoor temperature file.
    pub temperatures_file: String,
    /// Zero-based column of the temperature value.
    pub temperature_column: usize,
    /// Grid import price file (value in the last column).
    pub buy_prices_file: String,
    /// Grid export price file (value in the last column).
    pub sell_prices_file: String,
    /// Renewable generation file (value in the last column).
    pub generation_file: String,
    /// Whether the generation file starts with a header row.
    pub generation_has_header: bool,
    /// Multiplier applied to both price series on load.
    pub price_scale: f64,
    /// Multiplier applied to the generation series on load.
    pub generation_scale: f64,
    /// Days generated when no directory is configured.
    pub synthetic_days: usize,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: None,
            temperatures_file: "temperatures.csv".to_string(),
            temperature_column: 5,
            buy_prices_file: "up_regulation.csv".to_string(),
            sell_prices_file: "down_regulation.csv".to_string(),
            generation_file: "wind_generation.csv".to_string(),
            generation_has_header: false,
            price_scale: 0.1,
            generation_scale: 0.01,
            synthetic_days: 60,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.iterations"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the inelastic preset: loads ignore the price signal entirely.
    pub fn inelastic() -> Self {
        Self {
            loads: LoadsConfig {
                price_sens: NormalSpec::new(0.0, 0.0),
                ..LoadsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the storage-heavy preset: larger, faster battery with self-discharge.
    pub fn storage_heavy() -> Self {
        Self {
            battery: BatteryConfig {
                capacity: 1500.0,
                max_dd: 500.0,
                charge_e: 500.0,
                dissipate_each_step: true,
                ..BatteryConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "inelastic", "storage_heavy"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "inelastic" => Ok(Self::inelastic()),
            "storage_heavy" => Ok(Self::storage_heavy()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Hours every input series must cover for the configured day range:
    /// `dayn * 24 + iterations + 24`, the last 24 being the forecast horizon.
    ///
    /// Returns `None` if the sum does not fit in `usize`.
    pub fn required_hours(&self) -> Option<usize> {
        let s = &self.simulation;
        s.dayn.checked_mul(24)?.checked_add(s.iterations)?.checked_add(24)
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Every float must be
    /// finite, so `nan` and `inf` in a TOML file are reported here rather
    /// than reaching a device constructor.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.iterations < 2 {
            errors.push(ConfigError::new("simulation.iterations", "must be >= 2"));
        }
        if s.day0 >= s.dayn {
            errors.push(ConfigError::new("simulation.day0", "must be < simulation.dayn"));
        }

        let f = &self.fleet;
        require_finite(
            &mut errors,
            &[
                ("fleet.t_min", f.t_min),
                ("fleet.t_max", f.t_max),
                ("fleet.avg_power", f.avg_power),
                ("fleet.ca.mean", f.ca.mean),
                ("fleet.cm.mean", f.cm.mean),
                ("fleet.q.mean", f.q.mean),
                ("fleet.power_std", f.power_std),
                ("fleet.init_temp_min", f.init_temp_min),
                ("fleet.init_temp_max", f.init_temp_max),
            ],
        );
        if !(f.t_min < f.t_max) {
            errors.push(ConfigError::new("fleet.t_min", "must be < fleet.t_max"));
        }
        if !(f.avg_power > 0.0) {
            errors.push(ConfigError::new("fleet.avg_power", "must be > 0"));
        }
        if !(f.init_temp_min < f.init_temp_max) {
            errors.push(ConfigError::new(
                "fleet.init_temp_min",
                "must be < fleet.init_temp_max",
            ));
        }
        for (field, spec) in [("fleet.ca", f.ca), ("fleet.cm", f.cm), ("fleet.q", f.q)] {
            if !spec.std.is_finite() || !(spec.std >= 0.0) {
                errors.push(ConfigError::new(format!("{field}.std"), "must be >= 0"));
            }
        }
        if !(f.power_std >= 0.0) {
            errors.push(ConfigError::new("fleet.power_std", "must be >= 0"));
        }

        let l = &self.loads;
        if l.base_load.is_empty() {
            errors.push(ConfigError::new("loads.base_load", "must not be empty"));
        }
        if l.base_load.iter().any(|v| !v.is_finite()) {
            errors.push(ConfigError::new("loads.base_load", "must be finite"));
        }
        for (field, spec) in [
            ("loads.price_sens", l.price_sens),
            ("loads.max_v_load", l.max_v_load),
            ("loads.patience", l.patience),
        ] {
            if !spec.mean.is_finite() {
                errors.push(ConfigError::new(format!("{field}.mean"), "must be finite"));
            }
            if !spec.std.is_finite() || !(spec.std >= 0.0) {
                errors.push(ConfigError::new(format!("{field}.std"), "must be >= 0"));
            }
        }

        let b = &self.battery;
        require_finite(
            &mut errors,
            &[
                ("battery.capacity", b.capacity),
                ("battery.dissipation", b.dissipation),
                ("battery.max_dd", b.max_dd),
                ("battery.charge_e", b.charge_e),
            ],
        );
        if !(b.capacity > 0.0) {
            errors.push(ConfigError::new("battery.capacity", "must be > 0"));
        }
        if !(b.use_d > 0.0 && b.use_d <= 1.0) {
            errors.push(ConfigError::new("battery.use_d", "must be in (0.0, 1.0]"));
        }
        if !(b.rate_c > 0.0 && b.rate_c <= 1.0) {
            errors.push(ConfigError::new("battery.rate_c", "must be in (0.0, 1.0]"));
        }
        if !(b.dissipation >= 0.0) {
            errors.push(ConfigError::new("battery.dissipation", "must be >= 0"));
        }
        if !(b.max_dd >= 0.0 && b.charge_e >= 0.0) {
            errors.push(ConfigError::new(
                "battery.max_dd",
                "max_dd and charge_e must be >= 0",
            ));
        }

        let m = &self.market;
        require_finite(
            &mut errors,
            &[
                ("market.market_price", m.market_price),
                ("market.tcl_sale_price", m.tcl_sale_price),
                ("market.high_price_penalty", m.high_price_penalty),
                ("market.generation_cost", m.generation_cost),
                ("market.import_transfer_price", m.import_transfer_price),
                ("market.export_transfer_price", m.export_transfer_price),
                ("market.currency_scale", m.currency_scale),
                ("market.reward_scale", m.reward_scale),
            ],
        );
        if m.price_tiers.iter().any(|v| !v.is_finite()) {
            errors.push(ConfigError::new("market.price_tiers", "must be finite"));
        }
        if !(m.currency_scale > 0.0) {
            errors.push(ConfigError::new("market.currency_scale", "must be > 0"));
        }
        if !(m.reward_scale > 0.0) {
            errors.push(ConfigError::new("market.reward_scale", "must be > 0"));
        }

        let d = &self.data;
        require_finite(
            &mut errors,
            &[
                ("data.price_scale", d.price_scale),
                ("data.generation_scale", d.generation_scale),
            ],
        );
        match self.required_hours() {
            None => errors.push(ConfigError::new(
                "simulation.dayn",
                "day range overflows the hour index",
            )),
            Some(required) if d.dir.is_none() && d.synthetic_days.saturating_mul(24) < required => {
                errors.push(ConfigError::new(
                    "data.synthetic_days",
                    "must cover simulation.dayn plus the episode and forecast horizon",
                ));
            }
            Some(_) => {}
        }

        errors
    }
}

fn require_finite(errors: &mut Vec<ConfigError>, fields: &[(&str, f64)]) {
    for &(field, value) in fields {
        if !value.is_finite() {
            errors.push(ConfigError::new(field, "must be finite"));
        }
    }
}
