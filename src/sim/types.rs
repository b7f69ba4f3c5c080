//! Core simulation types: episode contract, step outcomes and step records.

use std::fmt;

use serde::Serialize;

use super::action::Action;
use crate::error::Result;

/// How `reset` picks the episode day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaySelection {
    /// Uniformly from the simulator's configured `day0..dayn`.
    Configured,
    /// Uniformly from `start..end`.
    Range { start: usize, end: usize },
    /// Exactly this day.
    Fixed(usize),
}

/// Episodic environment driven by an external decision-maker.
pub trait Environment {
    /// Starts a new episode and returns its first observation.
    fn reset(&mut self, selection: DaySelection) -> Result<Vec<f64>>;

    /// Applies `action` for the current hour and advances one hour.
    fn step(&mut self, action: Action) -> Result<StepOutcome>;

    /// Length of every observation vector.
    fn observation_len(&self) -> usize;

    /// Number of distinct actions.
    fn action_count(&self) -> usize;
}

/// Side information returned with every step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    /// Outdoor temperature for the 24 hours after the current hour.
    pub temperature_forecast: Vec<f64>,
    /// Offsets `0..24` parallel to `temperature_forecast`.
    pub forecast_hours: Vec<usize>,
}

/// Result of one `step` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    /// Observation of the next hour.
    pub observation: Vec<f64>,
    /// Normalized reward for the hour just settled.
    pub reward: f64,
    /// True once the episode reached its last step.
    pub terminal: bool,
    pub info: StepInfo,
}

/// Reward contributions of one step, in currency units before normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RewardBreakdown {
    /// Penalty for exceeding the high-price cap (<= 0).
    pub high_price_penalty: f64,
    /// Cost of renewable generation (<= 0).
    pub generation_cost: f64,
    /// Revenue from serving deferrable demand.
    pub load_revenue: f64,
    /// Revenue from TCL consumption.
    pub tcl_revenue: f64,
    /// Revenue from exports (>= 0).
    pub grid_sale: f64,
    /// Cost of imports (<= 0).
    pub grid_purchase: f64,
}

impl RewardBreakdown {
    pub fn total(&self) -> f64 {
        self.high_price_penalty
            + self.generation_cost
            + self.load_revenue
            + self.tcl_revenue
            + self.grid_sale
            + self.grid_purchase
    }
}

/// Complete record of one settled hour, as seen by a renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// Hour within the episode that was settled.
    pub time_step: usize,
    /// Absolute hour (`day * 24 + time_step`).
    pub absolute_hour: usize,
    pub action: Action,
    /// Price tier actually applied after the high-price override.
    pub effective_price_tier: u8,
    /// High-price counter after this step.
    pub high_price: i32,
    /// Normalized reward.
    pub reward: f64,
    pub breakdown: RewardBreakdown,
    /// Consumer tariff charged this hour.
    pub sale_price: f64,
    pub outdoor_temp: f64,
    pub generation: f64,
    /// Demand served per deferrable load.
    pub loads: Vec<f64>,
    pub total_load: f64,
    /// TCL dispatch budget derived from the action.
    pub tcl_budget: f64,
    /// Realized TCL consumption.
    pub tcl_consumption: f64,
    /// SoC of every TCL after the thermal update.
    pub tcl_socs: Vec<f64>,
    /// Energy moved from the bus into the battery.
    pub battery_charged: f64,
    /// Energy delivered from the battery to the bus.
    pub battery_discharged: f64,
    pub battery_soc: f64,
    pub energy_sold: f64,
    pub energy_bought: f64,
    pub grid_buy_price: f64,
    pub grid_sell_price: f64,
    /// Deferred-load entries pending across all loads after this step.
    pub pending_deferrals: usize,
}

impl StepRecord {
    /// Bus imbalance after settlement; zero up to rounding.
    pub fn energy_residual(&self) -> f64 {
        self.generation - self.total_load - self.tcl_consumption - self.battery_charged
            + self.battery_discharged
            - self.energy_sold
            + self.energy_bought
    }

    /// Total demand on the bus (deferrable loads plus TCLs).
    pub fn total_consumption(&self) -> f64 {
        self.total_load + self.tcl_consumption
    }
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>2} (h{:>5}) {} | r={:>8.4} | price={:>5.2} gen={:>7.2} load={:>7.2} \
             tcl={:>6.2}/{:>6.2} | bat +{:.2}/-{:.2} (SoC={:.1}%) | sold={:.2} bought={:.2}",
            self.time_step,
            self.absolute_hour,
            self.action,
            self.reward,
            self.sale_price,
            self.generation,
            self.total_load,
            self.tcl_consumption,
            self.tcl_budget,
            self.battery_charged,
            self.battery_discharged,
            self.battery_soc * 100.0,
            self.energy_sold,
            self.energy_bought,
        )
    }
}
