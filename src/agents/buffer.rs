//! Episode trajectory buffer
use tch::Tensor;

/// Observations, one-hot actions, and rewards of a single episode, in step order.
///
/// All three sequences always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    observation_size: usize,
    num_actions: usize,
    /// Flattened `[len, observation_size]` observations.
    observations: Vec<f32>,
    /// Flattened `[len, num_actions]` one-hot action encodings.
    actions: Vec<f32>,
    rewards: Vec<f64>,
}

impl Trajectory {
    pub const fn new(observation_size: usize, num_actions: usize) -> Self {
        Self {
            observation_size,
            num_actions,
            observations: Vec::new(),
            actions: Vec::new(),
            rewards: Vec::new(),
        }
    }

    /// Append one step.
    ///
    /// # Panics
    /// If the observation has the wrong size or the action is out of range.
    pub fn push(&mut self, observation: &[f32], action: usize, reward: f64) {
        assert_eq!(
            observation.len(),
            self.observation_size,
            "observation size mismatch"
        );
        assert!(action < self.num_actions, "action {} out of range", action);
        self.observations.extend_from_slice(observation);
        let offset = self.actions.len();
        self.actions.resize(offset + self.num_actions, 0.0);
        self.actions[offset + action] = 1.0;
        self.rewards.push(reward);
    }

    /// Discard all steps.
    pub fn clear(&mut self) {
        self.observations.clear();
        self.actions.clear();
        self.rewards.clear();
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// Observation at step `i`.
    pub fn observation(&self, i: usize) -> &[f32] {
        &self.observations[i * self.observation_size..(i + 1) * self.observation_size]
    }

    /// Action index taken at step `i`.
    pub fn action(&self, i: usize) -> usize {
        self.actions[i * self.num_actions..(i + 1) * self.num_actions]
            .iter()
            .position(|&x| x == 1.0)
            .unwrap_or_default()
    }

    /// Observations as a `[len, observation_size]` tensor.
    pub fn observations_tensor(&self) -> Tensor {
        Tensor::of_slice(&self.observations).reshape(&[
            self.len() as i64,
            self.observation_size as i64,
        ])
    }

    /// One-hot actions as a `[len, num_actions]` tensor.
    pub fn actions_tensor(&self) -> Tensor {
        Tensor::of_slice(&self.actions).reshape(&[self.len() as i64, self.num_actions as i64])
    }
}

/// Per-step values as a `[len]` float tensor.
pub fn values_tensor(values: &[f64]) -> Tensor {
    let values: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    Tensor::of_slice(&values)
}
