//! Action sources that drive an episode.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::action::{ACTION_COUNT, Action};

/// Decision-maker that maps an observation to the next action.
pub trait Policy {
    fn act(&mut self, observation: &[f64]) -> Action;
}

/// Repeats the same action every hour.
#[derive(Debug, Clone, Copy)]
pub struct ConstantPolicy(pub Action);

impl Policy for ConstantPolicy {
    fn act(&mut self, _observation: &[f64]) -> Action {
        self.0
    }
}

/// Picks uniformly among all actions from its own seeded generator.
#[derive(Debug, Clone)]
pub struct RandomPolicy {
    actions: Vec<Action>,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            actions: Action::all().collect(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, _observation: &[f64]) -> Action {
        self.actions[self.rng.random_range(0..ACTION_COUNT)]
    }
}

impl<F> Policy for F
where
    F: FnMut(&[f64]) -> Action,
{
    fn act(&mut self, observation: &[f64]) -> Action {
        self(observation)
    }
}
