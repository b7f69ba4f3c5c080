//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use rand::SeedableRng;
use rand::rngs::StdRng;

use tcl_microgrid_sim::config::{NormalSpec, ScenarioConfig};
use tcl_microgrid_sim::data::{MarketData, synthetic};
use tcl_microgrid_sim::runner::run_episode;
use tcl_microgrid_sim::sim::action::Action;
use tcl_microgrid_sim::sim::controller::ConstantPolicy;
use tcl_microgrid_sim::sim::engine::MicrogridSimulator;
use tcl_microgrid_sim::sim::recorder::EpisodeRecorder;
use tcl_microgrid_sim::sim::types::{DaySelection, StepRecord};

/// Baseline scenario shrunk to 10 TCLs and 15 loads over days 0..5.
pub fn small_config() -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.simulation.num_tcls = 10;
    cfg.simulation.num_loads = 15;
    cfg.simulation.dayn = 5;
    cfg
}

/// Seeded synthetic data long enough for the default 60-day horizon.
pub fn synthetic_data() -> MarketData {
    synthetic::generate(60, 11)
}

/// Simulator over synthetic data with a seeded `StdRng`.
pub fn simulator(cfg: ScenarioConfig, seed: u64) -> MicrogridSimulator<StdRng> {
    MicrogridSimulator::new(cfg, synthetic_data(), StdRng::seed_from_u64(seed))
        .expect("simulator should build")
}

/// `[1,2,0,0]`: one third of the fleet budget at the neutral tier.
pub fn neutral_action() -> Action {
    Action::try_from([1, 2, 0, 0]).expect("valid action")
}

/// Runs one episode with a constant action and returns its records.
pub fn run_constant(
    sim: &mut MicrogridSimulator<StdRng>,
    day: usize,
    action: Action,
) -> Vec<StepRecord> {
    let mut recorder = EpisodeRecorder::new();
    run_episode(
        sim,
        DaySelection::Fixed(day),
        &mut ConstantPolicy(action),
        &mut recorder,
    )
    .expect("episode should run");
    recorder.into_records()
}

/// One inelastic load (demand fixed at `base_load`), no TCLs, flat series.
///
/// Every hour: generation `generation`, buy price 3.0, sell price 2.0,
/// outdoor temperature 10.
pub fn micro_simulator(base_load: f64, generation: f64) -> MicrogridSimulator<StdRng> {
    micro_simulator_with_generation(base_load, &[generation])
}

/// Like [`micro_simulator`], with generation given per hour of day 0.
///
/// Hours past the end of `generation` repeat its last value.
pub fn micro_simulator_with_generation(
    base_load: f64,
    generation: &[f64],
) -> MicrogridSimulator<StdRng> {
    let mut cfg = ScenarioConfig::baseline();
    cfg.simulation.num_tcls = 0;
    cfg.simulation.num_loads = 1;
    cfg.simulation.day0 = 0;
    cfg.simulation.dayn = 1;
    cfg.loads.base_load = vec![base_load; 24];
    cfg.loads.price_sens = NormalSpec::new(0.0, 0.0);
    cfg.loads.max_v_load = NormalSpec::new(0.4, 0.0);
    cfg.loads.patience = NormalSpec::new(10.0, 0.0);

    let hours = 72;
    let last = generation.last().copied().unwrap_or(0.0);
    let generation = (0..hours)
        .map(|h| generation.get(h).copied().unwrap_or(last))
        .collect();
    let data = MarketData::new(
        vec![10.0; hours],
        vec![3.0; hours],
        vec![2.0; hours],
        generation,
    );
    MicrogridSimulator::new(cfg, data, StdRng::seed_from_u64(0)).expect("micro simulator")
}
