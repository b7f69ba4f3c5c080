use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Price tier that leaves demand untouched.
pub const NEUTRAL_TIER: u8 = 2;

/// Per-load behavioral parameters, sampled once per simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DemandParams {
    /// Fraction of base load shifted per tier step away from neutral (>= 0).
    pub price_sens: f64,
    /// Maximum variable load (carried for reporting; not used by dispatch).
    pub max_v_load: f64,
    /// Hours after which a deferral is certain to be recalled (>= 1).
    pub patience: u32,
}

/// Aggregated price-elastic residential demand.
///
/// Each hour the load reacts to the chosen price tier: tiers above neutral
/// defer part of the base load, tiers below neutral pull load forward.
/// Deferred amounts wait in `shifted_loads` (keyed by the hour they were
/// created) until a per-hour random draw recalls them.
#[derive(Debug, Clone)]
pub struct DemandResponseLoad {
    params: DemandParams,
    base_load: Arc<[f64]>,
    dr_load: f64,
    shifted_loads: BTreeMap<usize, f64>,
}

impl DemandResponseLoad {
    /// Creates a load with no pending deferrals.
    ///
    /// Negative sensitivity is clamped to 0 and patience below 1 to 1.
    pub fn new(params: DemandParams, base_load: Arc<[f64]>) -> Self {
        Self {
            params: DemandParams {
                price_sens: params.price_sens.max(0.0),
                patience: params.patience.max(1),
                ..params
            },
            base_load,
            dr_load: 0.0,
            shifted_loads: BTreeMap::new(),
        }
    }

    /// Realizes this hour's demand under `price_tier`.
    ///
    /// One uniform draw is taken from `rng` for every pending deferral,
    /// in ascending key order. A deferral is recalled when the draw is at
    /// most its execution probability, which is deliberately left
    /// unclamped.
    pub fn react<R: Rng + ?Sized>(&mut self, price_tier: u8, hour_of_day: usize, rng: &mut R) {
        let base = self.base_load[hour_of_day % self.base_load.len()];
        let deviation = f64::from(price_tier) - f64::from(NEUTRAL_TIER);

        self.dr_load = base;
        let response = self.params.price_sens * deviation;
        if response != 0.0 {
            self.dr_load -= base * response;
            self.shifted_loads.insert(hour_of_day, base * response);
        }

        let patience = f64::from(self.params.patience);
        let pending: Vec<usize> = self.shifted_loads.keys().copied().collect();
        for k in pending {
            let amount = self.shifted_loads[&k];
            let elapsed = hour_of_day as f64 - k as f64;
            let probability = -amount * deviation + elapsed / patience;
            let draw: f64 = rng.random();
            if draw <= probability {
                trace!(hour = hour_of_day, from = k, amount, "deferred load recalled");
                self.dr_load += amount;
                self.shifted_loads.remove(&k);
            }
        }
    }

    /// Demand served this hour, never negative.
    pub fn load(&self) -> f64 {
        self.dr_load.max(0.0)
    }

    /// Raw realized demand before the non-negativity clamp.
    pub fn raw_load(&self) -> f64 {
        self.dr_load
    }

    /// Pending deferrals keyed by the hour they were created.
    pub fn shifted_loads(&self) -> &BTreeMap<usize, f64> {
        &self.shifted_loads
    }

    pub fn params(&self) -> &DemandParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn profile() -> Arc<[f64]> {
        Arc::from(vec![1.0; 24])
    }

    fn load(price_sens: f64, patience: u32) -> DemandResponseLoad {
        DemandResponseLoad::new(
            DemandParams {
                price_sens,
                max_v_load: 0.4,
                patience,
            },
            profile(),
        )
    }

    #[test]
    fn constructor_clamps_parameters() {
        let l = load(-0.5, 0);
        assert_eq!(l.params().price_sens, 0.0);
        assert_eq!(l.params().patience, 1);
    }

    #[test]
    fn neutral_tier_serves_base_load() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut l = load(0.4, 10);
        l.react(NEUTRAL_TIER, 3, &mut rng);
        assert_eq!(l.load(), 1.0);
        assert!(l.shifted_loads().is_empty());
    }

    #[test]
    fn price_hike_defers_load() {
        // Tier 4 with sensitivity 0.25: response 0.5, half the load deferred.
        // Recall probability at the same hour: -0.5 * 2 + 0 = -1, never recalled.
        let mut rng = StdRng::seed_from_u64(7);
        let mut l = load(0.25, 10);
        l.react(4, 5, &mut rng);
        assert!((l.load() - 0.5).abs() < 1e-12);
        assert_eq!(l.shifted_loads().get(&5), Some(&0.5));
    }

    #[test]
    fn price_cut_pulls_load_forward() {
        // Tier 0: response -0.5, demand rises to 1.5 and a negative entry is kept.
        // Recall probability: -(-0.5) * (-2) + 0 = -1, never recalled.
        let mut rng = StdRng::seed_from_u64(7);
        let mut l = load(0.25, 10);
        l.react(0, 5, &mut rng);
        assert!((l.load() - 1.5).abs() < 1e-12);
        assert_eq!(l.shifted_loads().get(&5), Some(&-0.5));
    }

    #[test]
    fn deferral_recalled_after_patience_elapses() {
        // Probability at neutral tier is elapsed / patience, certain at 1.
        let mut rng = StdRng::seed_from_u64(11);
        let mut l = load(0.25, 2);
        l.react(4, 0, &mut rng);
        assert_eq!(l.shifted_loads().len(), 1);
        l.react(NEUTRAL_TIER, 2, &mut rng);
        assert!(l.shifted_loads().is_empty());
        assert!((l.load() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn repeated_hour_overwrites_entry() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut l = load(0.25, 10);
        l.react(4, 5, &mut rng);
        l.react(3, 5, &mut rng);
        assert_eq!(l.shifted_loads().len(), 1);
        assert_eq!(l.shifted_loads().get(&5), Some(&0.25));
    }

    #[test]
    fn load_is_clamped_but_raw_is_not() {
        // Sensitivity 1 at tier 4 subtracts twice the base load.
        let mut rng = StdRng::seed_from_u64(3);
        let mut l = load(1.0, 10);
        l.react(4, 0, &mut rng);
        assert!(l.raw_load() < 0.0);
        assert_eq!(l.load(), 0.0);
    }

    proptest! {
        #[test]
        fn load_never_negative(
            sens in 0.0f64..3.0,
            patience in 1u32..20,
            seed: u64,
            tiers in prop::collection::vec(0u8..5, 1..24),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut l = load(sens, patience);
            for (hour, tier) in tiers.into_iter().enumerate() {
                l.react(tier, hour, &mut rng);
                prop_assert!(l.load() >= 0.0);
                prop_assert!(l.shifted_loads().keys().all(|&k| k <= hour));
            }
        }

        #[test]
        fn inelastic_load_never_defers(
            seed: u64,
            tiers in prop::collection::vec(0u8..5, 1..24),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut l = load(0.0, 10);
            for (hour, tier) in tiers.into_iter().enumerate() {
                l.react(tier, hour, &mut rng);
                prop_assert!(l.shifted_loads().is_empty());
            }
        }
    }
}
