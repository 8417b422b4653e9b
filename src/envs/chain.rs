//! Deterministic chain environment
use super::{EnvStructure, Environment, Successor};
use crate::Prng;
use serde::{Deserialize, Serialize};

/// Deterministic Chain Environment
///
/// Consists of 2 states in a line with 2 actions.
/// * Action 0 moves to (or stays in) the first state.
/// * Action 1 moves to (or stays in) the second state.
///
/// Every step yields a reward of `step_reward` except the last step of the episode, which yields
/// `final_reward`. Episodes always last exactly `episode_len` steps, regardless of the actions.
///
/// The observation is a one-hot encoding of the current state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeterministicChain {
    pub episode_len: u64,
    pub step_reward: f64,
    pub final_reward: f64,
    pub discount_factor: f64,
}

impl DeterministicChain {
    pub const fn new(episode_len: u64, step_reward: f64, final_reward: f64) -> Self {
        Self {
            episode_len,
            step_reward,
            final_reward,
            discount_factor: 0.99,
        }
    }
}

impl Default for DeterministicChain {
    fn default() -> Self {
        Self::new(5, 1.0, 10.0)
    }
}

impl EnvStructure for DeterministicChain {
    fn observation_size(&self) -> usize {
        2
    }

    fn num_actions(&self) -> usize {
        2
    }

    fn reward_range(&self) -> (f64, f64) {
        (
            self.step_reward.min(self.final_reward),
            self.step_reward.max(self.final_reward),
        )
    }

    fn discount_factor(&self) -> f64 {
        self.discount_factor
    }
}

impl Environment for DeterministicChain {
    /// `(position, steps_taken)`
    type State = (usize, u64);

    fn initial_state(&self, _: &mut Prng) -> Self::State {
        (0, 0)
    }

    fn observe(&self, state: &Self::State) -> Vec<f32> {
        let mut features = vec![0.0; 2];
        features[state.0] = 1.0;
        features
    }

    fn step(&self, state: Self::State, action: usize, _: &mut Prng) -> (Successor<Self::State>, f64) {
        assert!(action < 2, "invalid chain action index {}", action);
        let steps_taken = state.1 + 1;
        if steps_taken >= self.episode_len {
            (Successor::Terminate, self.final_reward)
        } else {
            (Successor::Continue((action, steps_taken)), self.step_reward)
        }
    }
}
