//! Simulation engine that owns the microgrid and settles one hour per step.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{debug, info, warn};

use crate::config::{NormalSpec, ScenarioConfig};
use crate::data::MarketData;
use crate::devices::{
    Battery, DemandParams, DemandResponseLoad, GenerationSource, NEUTRAL_TIER, ThermalParams,
    ThermalUnit,
};
use crate::error::{Result, SimError};
use crate::forecast::{FORECAST_HORIZON, PerfectForecast};

use super::action::{ACTION_COUNT, Action};
use super::grid::GridPriceOracle;
use super::observation::{mean_std, min_max, rescale_soc, standardize};
use super::types::{DaySelection, Environment, RewardBreakdown, StepInfo, StepOutcome, StepRecord};

/// Cap on the high-price counter; exceeding it forces the neutral tier.
pub const HIGH_PRICE_CAP: i32 = 4;
/// Observation features that follow the per-TCL SoCs.
pub const EXTRA_FEATURES: usize = 7;
/// Divisor of the time-of-day observation feature.
const TIME_FEATURE_SCALE: f64 = 23.0;
/// The dispatch budget is `bucket * fleet * avg_power / TCL_BUCKET_DIVISOR`.
const TCL_BUCKET_DIVISOR: f64 = 3.0;

/// Lifecycle of the current episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    /// Constructed, never reset.
    Init,
    /// Between reset and the terminal step.
    Running,
    /// The last step has been taken; only `reset` is allowed.
    Terminal,
}

/// Hour-by-hour microgrid simulator.
///
/// Owns the TCL fleet, the deferrable loads, the battery, the grid price
/// oracle and the generation source, plus the random source that drives
/// every stochastic decision. Generic over `R: Rng` so tests and callers
/// can supply any seedable generator.
pub struct MicrogridSimulator<R: Rng = StdRng> {
    config: ScenarioConfig,
    temperatures: Arc<[f64]>,
    base_load: Arc<[f64]>,
    tcl_params: Vec<ThermalParams>,
    load_params: Vec<DemandParams>,
    tcls: Vec<ThermalUnit>,
    loads: Vec<DemandResponseLoad>,
    battery: Battery,
    grid: GridPriceOracle,
    generation: GenerationSource,
    rng: R,
    phase: EpisodePhase,
    day: usize,
    time_step: usize,
    high_price: i32,
    sale_price: f64,
    energy_sold: f64,
    energy_bought: f64,
    control: f64,
    last_record: Option<StepRecord>,
}

impl MicrogridSimulator<StdRng> {
    /// Creates a simulator driven by a `StdRng` seeded from
    /// `config.simulation.seed`.
    ///
    /// # Errors
    ///
    /// See [`MicrogridSimulator::new`].
    pub fn from_seed(config: ScenarioConfig, data: MarketData) -> Result<Self> {
        let rng = StdRng::seed_from_u64(config.simulation.seed);
        Self::new(config, data, rng)
    }
}

impl<R: Rng> MicrogridSimulator<R> {
    /// Creates a simulator and samples the per-unit TCL and load parameters
    /// from `rng`.
    ///
    /// Parameters are drawn unit by unit (TCLs first, then loads) and kept
    /// for the lifetime of the simulator; every reset rebuilds the fleet
    /// from them.
    ///
    /// # Errors
    ///
    /// Returns `SimError::Config` for the first validation failure,
    /// `SimError::SeriesTooShort` if the data does not cover the configured
    /// day range, or `SimError::InvalidDistribution` for unusable sampling
    /// parameters.
    pub fn new(config: ScenarioConfig, data: MarketData, mut rng: R) -> Result<Self> {
        if let Some(err) = config.validate().into_iter().next() {
            return Err(err.into());
        }
        data.validate_horizon(config.required_hours().unwrap_or(usize::MAX))?;

        let tcl_params = sample_tcl_params(&config, &mut rng)?;
        let load_params = sample_load_params(&config, &mut rng)?;

        let m = &config.market;
        let grid = GridPriceOracle::new(
            Arc::clone(&data.sell_prices),
            Arc::clone(&data.buy_prices),
            m.export_transfer_price,
            m.import_transfer_price,
        );
        let sale_price = m.price_tiers[usize::from(NEUTRAL_TIER)] + m.market_price;

        Ok(Self {
            battery: build_battery(&config),
            base_load: Arc::from(config.loads.base_load.as_slice()),
            temperatures: Arc::clone(&data.temperatures),
            generation: GenerationSource::new(Arc::clone(&data.generation)),
            grid,
            tcl_params,
            load_params,
            tcls: Vec::new(),
            loads: Vec::new(),
            rng,
            phase: EpisodePhase::Init,
            day: config.simulation.day0,
            time_step: 0,
            high_price: 0,
            sale_price,
            energy_sold: 0.0,
            energy_bought: 0.0,
            control: 0.0,
            last_record: None,
            config,
        })
    }

    /// Starts a new episode on the selected day and returns its first
    /// observation.
    ///
    /// # Errors
    ///
    /// Returns `SimError::EmptyDayRange` for an empty range, or
    /// `SimError::SeriesTooShort` if the chosen day plus the episode and
    /// forecast horizon runs past the data.
    pub fn reset(&mut self, selection: DaySelection) -> Result<Vec<f64>> {
        let s = &self.config.simulation;
        let day = match selection {
            DaySelection::Configured => self.pick_day(s.day0, s.dayn)?,
            DaySelection::Range { start, end } => self.pick_day(start, end)?,
            DaySelection::Fixed(day) => day,
        };
        self.check_horizon(day)?;

        self.day = day;
        self.time_step = 0;
        self.battery = build_battery(&self.config);
        self.tcls = self
            .tcl_params
            .iter()
            .map(|&p| ThermalUnit::new(p, self.config.fleet.t_min, self.config.fleet.t_max))
            .collect();
        self.loads = self
            .load_params
            .iter()
            .map(|&p| DemandResponseLoad::new(p, Arc::clone(&self.base_load)))
            .collect();
        self.high_price = 0;
        let m = &self.config.market;
        self.sale_price = m.price_tiers[usize::from(NEUTRAL_TIER)] + m.market_price;
        self.energy_sold = 0.0;
        self.energy_bought = 0.0;
        self.control = 0.0;
        self.last_record = None;
        self.phase = EpisodePhase::Running;

        info!(
            day,
            tcls = self.tcls.len(),
            loads = self.loads.len(),
            "episode reset"
        );
        self.warn_flat_windows();

        Ok(self.build_observation())
    }

    /// Settles the current hour under `action` and advances one hour.
    ///
    /// # Errors
    ///
    /// Returns `SimError::NotStarted` before the first reset and
    /// `SimError::EpisodeTerminated` once the terminal step was taken.
    pub fn step(&mut self, action: Action) -> Result<StepOutcome> {
        match self.phase {
            EpisodePhase::Init => return Err(SimError::NotStarted),
            EpisodePhase::Terminal => return Err(SimError::EpisodeTerminated),
            EpisodePhase::Running => {}
        }

        let hour = self.absolute_hour();
        let m = &self.config.market;
        let scale = m.currency_scale;
        let mut breakdown = RewardBreakdown::default();

        // 1. Price cursor.
        self.grid.set_time(hour);

        // 2. High-price counter.
        let mut tier = action.price_tier();
        self.high_price += i32::from(tier) - i32::from(NEUTRAL_TIER);
        if self.high_price > HIGH_PRICE_CAP {
            tier = NEUTRAL_TIER;
            breakdown.high_price_penalty =
                -(m.high_price_penalty * f64::from(self.high_price - HIGH_PRICE_CAP)).abs();
            self.high_price = HIGH_PRICE_CAP;
        }

        // 3. Renewable generation.
        let generation = self.generation.current_generation(hour);
        let mut available = generation;
        breakdown.generation_cost = -available * m.generation_cost / scale;

        // 4. Deferrable demand.
        for load in &mut self.loads {
            load.react(tier, self.time_step, &mut self.rng);
        }
        let load_values: Vec<f64> = self.loads.iter().map(DemandResponseLoad::load).collect();
        let total_load: f64 = load_values.iter().sum();
        available -= total_load;
        self.sale_price = m.price_tiers[usize::from(tier)] + m.market_price;
        breakdown.load_revenue = total_load * self.sale_price / scale;

        // 5. TCL dispatch, coldest relative to band first.
        let outdoor_temp = self.temperatures[hour];
        let mut order: Vec<usize> = (0..self.tcls.len()).collect();
        order.sort_by(|&a, &b| self.tcls[a].soc().total_cmp(&self.tcls[b].soc()));

        let requested = f64::from(action.tcl_bucket()) * self.tcls.len() as f64
            * self.config.fleet.avg_power
            / TCL_BUCKET_DIVISOR;
        let budget = requested.min(available).max(0.0);
        self.control = budget;

        let mut remaining = budget;
        for &i in &order {
            let tcl = &mut self.tcls[i];
            if remaining > 0.0 {
                tcl.control(true);
                remaining -= tcl.consumption();
            } else {
                tcl.control(false);
            }
            tcl.update_state(outdoor_temp);
        }

        // 6. TCL consumption.
        let tcl_consumption: f64 = self.tcls.iter().map(ThermalUnit::consumption).sum();
        available -= tcl_consumption;
        breakdown.tcl_revenue = tcl_consumption * m.tcl_sale_price / scale;

        // 7. Settlement against battery and grid.
        let mut battery_charged = 0.0;
        let mut battery_discharged = 0.0;
        if available > 0.0 {
            let surplus = available;
            let to_grid = if action.excess() {
                let leftover = self.battery.charge(surplus);
                battery_charged = surplus - leftover;
                leftover
            } else {
                surplus
            };
            breakdown.grid_sale = self.grid.sell(to_grid) / scale;
            self.energy_sold = to_grid;
            self.energy_bought = 0.0;
        } else {
            if action.deficiency() {
                battery_discharged = self.battery.supply(-available);
                available += battery_discharged;
            }
            self.energy_bought = -available;
            breakdown.grid_purchase = self.grid.buy(self.energy_bought) / scale;
            self.energy_sold = 0.0;
        }

        if self.config.battery.dissipate_each_step {
            self.battery.dissipate();
        }

        let reward = breakdown.total() / m.reward_scale;

        let record = StepRecord {
            time_step: self.time_step,
            absolute_hour: hour,
            action,
            effective_price_tier: tier,
            high_price: self.high_price,
            reward,
            breakdown,
            sale_price: self.sale_price,
            outdoor_temp,
            generation,
            loads: load_values,
            total_load,
            tcl_budget: budget,
            tcl_consumption,
            tcl_socs: self.tcls.iter().map(ThermalUnit::soc).collect(),
            battery_charged,
            battery_discharged,
            battery_soc: self.battery.soc(),
            energy_sold: self.energy_sold,
            energy_bought: self.energy_bought,
            grid_buy_price: self.grid.buy_price_at(hour),
            grid_sell_price: self.grid.sell_price_at(hour),
            pending_deferrals: self.pending_deferrals(),
        };
        debug!(
            time_step = self.time_step,
            action = %action,
            reward,
            total_load,
            tcl_consumption,
            sold = self.energy_sold,
            bought = self.energy_bought,
            "step settled"
        );
        self.last_record = Some(record);

        // 8. Advance.
        self.time_step += 1;
        let terminal = self.time_step == self.config.simulation.iterations - 1;
        if terminal {
            self.phase = EpisodePhase::Terminal;
        }

        Ok(StepOutcome {
            observation: self.build_observation(),
            reward,
            terminal,
            info: self.build_info(),
        })
    }

    /// Observation of the current hour.
    ///
    /// Layout: one rescaled SoC per TCL, then base load, high-price
    /// counter, time of day, battery SoC, generation, buy price and sell
    /// price.
    pub fn build_observation(&self) -> Vec<f64> {
        let hour = self.absolute_hour();
        let mut obs = Vec::with_capacity(self.observation_len());
        obs.extend(self.tcls.iter().map(|t| rescale_soc(t.soc())));

        let base = self.base_load[self.time_step % self.base_load.len()];
        obs.push(min_max(base, &self.base_load));
        obs.push((f64::from(self.high_price) / f64::from(HIGH_PRICE_CAP)).min(1.0));
        obs.push(self.time_step as f64 / TIME_FEATURE_SCALE);
        obs.push(self.battery.soc());
        obs.push(standardize(
            self.generation.current_generation(hour),
            self.generation.day_window(self.day),
        ));
        obs.push(standardize(
            self.grid.buy_price_at(hour),
            self.grid.buy_day_window(self.day),
        ));
        obs.push(standardize(
            self.grid.sell_price_at(hour),
            self.grid.sell_day_window(self.day),
        ));
        obs
    }

    /// Temperature forecast for the hours after the current one.
    pub fn build_info(&self) -> StepInfo {
        StepInfo {
            temperature_forecast: PerfectForecast.forecast(
                &self.temperatures,
                self.absolute_hour() + 1,
                FORECAST_HORIZON,
            ),
            forecast_hours: (0..FORECAST_HORIZON).collect(),
        }
    }

    pub fn observation_len(&self) -> usize {
        self.tcl_params.len() + EXTRA_FEATURES
    }

    /// Absolute hour index of the current step.
    ///
    /// `reset` only accepts days whose episode fits the data, so this
    /// saturates instead of overflowing before the first reset.
    pub fn absolute_hour(&self) -> usize {
        self.day.saturating_mul(24).saturating_add(self.time_step)
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase == EpisodePhase::Terminal
    }

    pub fn day(&self) -> usize {
        self.day
    }

    pub fn time_step(&self) -> usize {
        self.time_step
    }

    pub fn high_price(&self) -> i32 {
        self.high_price
    }

    /// Consumer tariff charged in the last settled hour.
    pub fn sale_price(&self) -> f64 {
        self.sale_price
    }

    pub fn energy_sold(&self) -> f64 {
        self.energy_sold
    }

    pub fn energy_bought(&self) -> f64 {
        self.energy_bought
    }

    /// TCL dispatch budget used in the last settled hour.
    pub fn tcl_control(&self) -> f64 {
        self.control
    }

    /// Current TCL consumption (`Σ u * P`).
    pub fn tcl_consumption(&self) -> f64 {
        self.tcls.iter().map(ThermalUnit::consumption).sum()
    }

    pub fn tcls(&self) -> &[ThermalUnit] {
        &self.tcls
    }

    pub fn loads(&self) -> &[DemandResponseLoad] {
        &self.loads
    }

    pub fn battery(&self) -> &Battery {
        &self.battery
    }

    pub fn grid(&self) -> &GridPriceOracle {
        &self.grid
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Snapshot of the most recently settled hour, if any.
    pub fn last_record(&self) -> Option<&StepRecord> {
        self.last_record.as_ref()
    }

    /// Deferred-load entries pending across all loads.
    pub fn pending_deferrals(&self) -> usize {
        self.loads.iter().map(|l| l.shifted_loads().len()).sum()
    }

    fn pick_day(&mut self, start: usize, end: usize) -> Result<usize> {
        if start >= end {
            return Err(SimError::EmptyDayRange { start, end });
        }
        Ok(self.rng.random_range(start..end))
    }

    /// A day whose hour range overflows `usize` is reported as needing
    /// `usize::MAX` hours, which no series can cover.
    fn check_horizon(&self, day: usize) -> Result<()> {
        let required = episode_end(day, self.config.simulation.iterations).unwrap_or(usize::MAX);
        let series = [
            ("temperatures", self.temperatures.len()),
            ("grid_prices", self.grid.len()),
            ("generation", self.generation.len()),
        ];
        for (name, len) in series {
            if len < required {
                return Err(SimError::SeriesTooShort {
                    series: name,
                    len,
                    required,
                });
            }
        }
        Ok(())
    }

    fn warn_flat_windows(&self) {
        let windows = [
            ("generation", self.generation.day_window(self.day)),
            ("buy_prices", self.grid.buy_day_window(self.day)),
            ("sell_prices", self.grid.sell_day_window(self.day)),
        ];
        for (name, window) in windows {
            if mean_std(window).1 == 0.0 {
                warn!(day = self.day, series = name, "flat day window, feature fixed at 0");
            }
        }
    }
}

impl<R: Rng> Environment for MicrogridSimulator<R> {
    fn reset(&mut self, selection: DaySelection) -> Result<Vec<f64>> {
        MicrogridSimulator::reset(self, selection)
    }

    fn step(&mut self, action: Action) -> Result<StepOutcome> {
        MicrogridSimulator::step(self, action)
    }

    fn observation_len(&self) -> usize {
        MicrogridSimulator::observation_len(self)
    }

    fn action_count(&self) -> usize {
        ACTION_COUNT
    }
}

/// Last hour (exclusive) an episode starting on `day` reads, forecast
/// window included. `None` on overflow.
fn episode_end(day: usize, iterations: usize) -> Option<usize> {
    day.checked_mul(24)?
        .checked_add(iterations)?
        .checked_add(FORECAST_HORIZON)
}

fn build_battery(config: &ScenarioConfig) -> Battery {
    let b = &config.battery;
    Battery::new(
        b.capacity,
        b.use_d,
        b.dissipation,
        b.rate_c,
        b.max_dd,
        b.charge_e,
    )
}

fn normal(name: &'static str, spec: NormalSpec) -> Result<Normal<f64>> {
    Normal::new(spec.mean, spec.std).map_err(|e| SimError::InvalidDistribution {
        name,
        message: e.to_string(),
    })
}

fn sample_tcl_params<R: Rng>(config: &ScenarioConfig, rng: &mut R) -> Result<Vec<ThermalParams>> {
    let f = &config.fleet;
    let ca = normal("fleet.ca", f.ca)?;
    let cm = normal("fleet.cm", f.cm)?;
    let q = normal("fleet.q", f.q)?;
    let power = normal("fleet.power", NormalSpec::new(f.avg_power, f.power_std))?;

    let mut params = Vec::with_capacity(config.simulation.num_tcls);
    for _ in 0..config.simulation.num_tcls {
        params.push(ThermalParams {
            ca: ca.sample(rng),
            cm: cm.sample(rng),
            q: q.sample(rng),
            power: power.sample(rng),
            initial_temp: rng.random_range(f.init_temp_min..f.init_temp_max),
        });
    }
    Ok(params)
}

fn sample_load_params<R: Rng>(config: &ScenarioConfig, rng: &mut R) -> Result<Vec<DemandParams>> {
    let l = &config.loads;
    let price_sens = normal("loads.price_sens", l.price_sens)?;
    let max_v_load = normal("loads.max_v_load", l.max_v_load)?;
    let patience = normal("loads.patience", l.patience)?;

    let mut params = Vec::with_capacity(config.simulation.num_loads);
    for _ in 0..config.simulation.num_loads {
        params.push(DemandParams {
            price_sens: price_sens.sample(rng).max(0.0),
            max_v_load: max_v_load.sample(rng),
            patience: patience.sample(rng).trunc().max(1.0) as u32,
        });
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_data(days: usize) -> MarketData {
        let hours = days * 24;
        let ramp: Vec<f64> = (0..hours).map(|h| (h % 24) as f64).collect();
        MarketData::new(
            vec![5.0; hours],
            ramp.iter().map(|v| 3.0 + v * 0.1).collect(),
            ramp.iter().map(|v| 2.0 + v * 0.1).collect(),
            ramp.iter().map(|v| 50.0 + v).collect(),
        )
    }

    fn small_config() -> ScenarioConfig {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.num_tcls = 5;
        cfg.simulation.num_loads = 4;
        cfg.simulation.day0 = 0;
        cfg.simulation.dayn = 2;
        cfg.data.synthetic_days = 4;
        cfg
    }

    fn sim() -> MicrogridSimulator<StdRng> {
        MicrogridSimulator::new(small_config(), flat_data(4), StdRng::seed_from_u64(3))
            .expect("simulator should build")
    }

    fn neutral() -> Action {
        Action::new(1, 2, false, false).expect("valid")
    }

    #[test]
    fn construction_samples_parameters() {
        let s = sim();
        assert_eq!(s.observation_len(), 12);
        assert_eq!(s.phase(), EpisodePhase::Init);
        assert!(s.tcls().is_empty());
    }

    #[test]
    fn construction_rejects_short_data() {
        let err = MicrogridSimulator::new(small_config(), flat_data(2), StdRng::seed_from_u64(3));
        assert!(matches!(err, Err(SimError::SeriesTooShort { .. })));
    }

    #[test]
    fn construction_rejects_invalid_config() {
        let mut cfg = small_config();
        cfg.battery.capacity = 0.0;
        let err = MicrogridSimulator::new(cfg, flat_data(4), StdRng::seed_from_u64(3));
        assert!(matches!(err, Err(SimError::Config(_))));
    }

    #[test]
    fn construction_rejects_nan_and_overflowing_days() {
        let mut cfg = small_config();
        cfg.battery.capacity = f64::NAN;
        let err = MicrogridSimulator::new(cfg, flat_data(4), StdRng::seed_from_u64(3));
        assert!(matches!(err, Err(SimError::Config(_))));

        let mut cfg = small_config();
        cfg.simulation.dayn = usize::MAX;
        let err = MicrogridSimulator::new(cfg, flat_data(4), StdRng::seed_from_u64(3));
        assert!(matches!(err, Err(SimError::Config(_))));
    }

    #[test]
    fn step_before_reset_is_rejected() {
        let mut s = sim();
        assert!(matches!(s.step(neutral()), Err(SimError::NotStarted)));
    }

    #[test]
    fn reset_builds_episode_state() {
        let mut s = sim();
        let obs = s.reset(DaySelection::Fixed(1)).expect("reset");
        assert_eq!(obs.len(), 12);
        assert_eq!(s.day(), 1);
        assert_eq!(s.time_step(), 0);
        assert_eq!(s.tcls().len(), 5);
        assert_eq!(s.loads().len(), 4);
        assert_eq!(s.phase(), EpisodePhase::Running);
        assert!((s.sale_price() - 5.48).abs() < 1e-12);
    }

    #[test]
    fn reset_rejects_day_past_data() {
        let mut s = sim();
        assert!(matches!(
            s.reset(DaySelection::Fixed(3)),
            Err(SimError::SeriesTooShort { .. })
        ));
    }

    #[test]
    fn reset_rejects_empty_range() {
        let mut s = sim();
        assert!(matches!(
            s.reset(DaySelection::Range { start: 1, end: 1 }),
            Err(SimError::EmptyDayRange { .. })
        ));
    }

    #[test]
    fn configured_range_picks_valid_day() {
        let mut s = sim();
        for _ in 0..10 {
            s.reset(DaySelection::Configured).expect("reset");
            assert!(s.day() < 2);
        }
    }

    #[test]
    fn episode_terminates_after_iterations_minus_one_steps() {
        let mut s = sim();
        s.reset(DaySelection::Fixed(0)).expect("reset");
        for i in 0..22 {
            let out = s.step(neutral()).expect("step");
            assert!(!out.terminal, "step {i} should not be terminal");
        }
        let out = s.step(neutral()).expect("last step");
        assert!(out.terminal);
        assert_eq!(s.time_step(), 23);
        assert!(matches!(s.step(neutral()), Err(SimError::EpisodeTerminated)));

        s.reset(DaySelection::Fixed(0)).expect("reset after terminal");
        assert!(s.step(neutral()).is_ok());
    }

    #[test]
    fn high_price_counter_caps_and_forces_neutral_tier() {
        let mut s = sim();
        s.reset(DaySelection::Fixed(0)).expect("reset");
        let hike = Action::new(0, 4, false, false).expect("valid");
        s.step(hike).expect("step"); // +2
        s.step(hike).expect("step"); // +4
        assert_eq!(s.high_price(), 4);
        s.step(hike).expect("step"); // 6 -> capped
        assert_eq!(s.high_price(), 4);
        let record = s.last_record().expect("record");
        assert_eq!(record.effective_price_tier, NEUTRAL_TIER);
        assert!((record.sale_price - 5.48).abs() < 1e-12);
    }

    #[test]
    fn high_price_penalty_applied_when_configured() {
        let mut cfg = small_config();
        cfg.market.high_price_penalty = 10.0;
        let mut s = MicrogridSimulator::new(cfg, flat_data(4), StdRng::seed_from_u64(3))
            .expect("simulator");
        s.reset(DaySelection::Fixed(0)).expect("reset");
        let hike = Action::new(0, 4, false, false).expect("valid");
        s.step(hike).expect("step");
        s.step(hike).expect("step");
        assert_eq!(s.last_record().map(|r| r.breakdown.high_price_penalty), Some(0.0));
        s.step(hike).expect("step");
        let penalty = s.last_record().map(|r| r.breakdown.high_price_penalty);
        assert_eq!(penalty, Some(-20.0));
    }

    #[test]
    fn zero_bucket_gives_zero_budget() {
        let mut s = sim();
        s.reset(DaySelection::Fixed(0)).expect("reset");
        s.step(Action::new(0, 2, false, false).expect("valid"))
            .expect("step");
        assert_eq!(s.tcl_control(), 0.0);
    }

    #[test]
    fn excess_flag_charges_battery() {
        let mut cfg = small_config();
        cfg.simulation.num_tcls = 0;
        let mut s = MicrogridSimulator::new(cfg, flat_data(4), StdRng::seed_from_u64(3))
            .expect("simulator");
        s.reset(DaySelection::Fixed(0)).expect("reset");
        s.step(Action::new(0, 2, false, true).expect("valid"))
            .expect("step");
        let r = s.last_record().expect("record");
        assert!(r.battery_charged > 0.0);
        assert!(s.battery().soc() > 0.0);
        assert!(r.energy_residual().abs() < 1e-9);
    }

    #[test]
    fn info_carries_next_day_of_temperatures() {
        let mut s = sim();
        s.reset(DaySelection::Fixed(0)).expect("reset");
        let out = s.step(neutral()).expect("step");
        assert_eq!(out.info.temperature_forecast.len(), 24);
        assert_eq!(out.info.forecast_hours, (0..24).collect::<Vec<_>>());
        assert!(out.info.temperature_forecast.iter().all(|&t| t == 5.0));
    }

    #[test]
    fn environment_trait_reports_dimensions() {
        let s = sim();
        let env: &dyn Environment = &s;
        assert_eq!(env.action_count(), 80);
        assert_eq!(env.observation_len(), 12);
    }

    #[test]
    fn reset_rejects_day_whose_hour_index_overflows() {
        let mut s = sim();
        let err = s.reset(DaySelection::Fixed(usize::MAX / 2));
        assert!(matches!(
            err,
            Err(SimError::SeriesTooShort { required: usize::MAX, .. })
        ));
        let err = s.reset(DaySelection::Range {
            start: usize::MAX - 1,
            end: usize::MAX,
        });
        assert!(matches!(err, Err(SimError::SeriesTooShort { .. })));
        assert_eq!(s.phase(), EpisodePhase::Init);
        assert_eq!(s.absolute_hour(), 0);
    }

    /// Three identical 1.5 kW units; indoor temperatures are set after
    /// reset so the dispatch order is known.
    fn dispatch_sim() -> MicrogridSimulator<StdRng> {
        let mut cfg = small_config();
        cfg.simulation.num_tcls = 3;
        cfg.fleet.power_std = 0.0;
        cfg.fleet.ca = NormalSpec::new(0.004, 0.0);
        cfg.fleet.cm = NormalSpec::new(0.3, 0.0);
        cfg.fleet.q = NormalSpec::new(0.0, 0.0);
        MicrogridSimulator::new(cfg, flat_data(4), StdRng::seed_from_u64(3)).expect("simulator")
    }

    fn dispatch(temps: [f64; 3], bucket: u8) -> (Vec<u8>, StepRecord) {
        let mut s = dispatch_sim();
        s.reset(DaySelection::Fixed(0)).expect("reset");
        for (tcl, t) in s.tcls.iter_mut().zip(temps) {
            tcl.t = t;
            tcl.tm = t;
        }
        s.step(Action::new(bucket, 2, false, false).expect("valid"))
            .expect("step");
        let u = s.tcls().iter().map(ThermalUnit::u).collect();
        (u, s.last_record().cloned().expect("record"))
    }

    #[test]
    fn dispatch_serves_lowest_soc_first_until_budget_is_spent() {
        // Band [19, 25]. Unit 1 is below the floor, unit 2 sits low in the
        // band and unit 0 high in it, so the order is 1, 2, 0.
        let temps = [24.0, 17.0, 20.0];

        // One unit's worth of budget: the forced unit takes it all.
        let (u, r) = dispatch(temps, 1);
        assert_eq!(r.tcl_budget, 1.5);
        assert_eq!(u, vec![0, 1, 0]);
        assert_eq!(r.tcl_consumption, 1.5);

        // Two units' worth: the cooler in-band unit is served before the
        // warmer one regardless of index.
        let (u, r) = dispatch(temps, 2);
        assert_eq!(r.tcl_budget, 3.0);
        assert_eq!(u, vec![0, 1, 1]);
        assert_eq!(r.tcl_consumption, 3.0);
    }

    #[test]
    fn hysteresis_overrides_budget_at_band_edges() {
        // Unit 0 is above the ceiling and is denied even with budget left.
        let (u, r) = dispatch([25.5, 17.0, 20.0], 3);
        assert_eq!(r.tcl_budget, 4.5);
        assert_eq!(u, vec![0, 1, 1]);
        assert_eq!(r.tcl_consumption, 3.0);

        // No budget at all: the unit below the floor still draws power.
        let (u, r) = dispatch([24.0, 17.0, 20.0], 0);
        assert_eq!(r.tcl_budget, 0.0);
        assert_eq!(u, vec![0, 1, 0]);
        assert_eq!(r.tcl_consumption, 1.5);
    }
}
