//! Mountain car environment
use super::{EnvStructure, Environment, Successor};
use crate::Prng;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// Configuration for the [`MountainCar`] environment.
///
/// Defaults are from the OpenAI Gym MountainCar-v0 environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MountainCarConfig {
    /// Velocity change per step from a full throttle.
    pub force: f64,
    /// Strength of the slope-induced acceleration.
    pub gravity: f64,
    /// Maximum absolute velocity.
    pub max_speed: f64,
    /// Left edge of the track. The car stops dead when it hits this wall.
    pub min_position: f64,
    /// Right edge of the track.
    pub max_position: f64,
    /// Position at or beyond which the episode ends successfully.
    pub goal_position: f64,
    /// Initial positions are sampled uniformly from `[low, high]`.
    pub initial_position: (f64, f64),
    /// Discount factor
    pub discount_factor: f64,
}

impl Default for MountainCarConfig {
    fn default() -> Self {
        Self {
            force: 0.001,
            gravity: 0.0025,
            max_speed: 0.07,
            min_position: -1.2,
            max_position: 0.6,
            goal_position: 0.5,
            initial_position: (-0.6, -0.4),
            discount_factor: 0.99,
        }
    }
}

/// Mountain Car environment
///
/// An under-powered car must drive up a steep hill on the right of a valley.
/// The car has to build momentum by rocking back and forth.
/// Every step costs a reward of -1 until the car reaches the goal at the top of the hill.
///
/// Based on [Moore (1990)][moore1990] with the dynamics of the OpenAI Gym
/// [MountainCar-v0][gym_mountaincar] environment.
///
/// [moore1990]: https://www.cl.cam.ac.uk/techreports/UCAM-CL-TR-209.pdf
/// [gym_mountaincar]: https://github.com/openai/gym/blob/master/gym/envs/classic_control/mountain_car.py
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountainCar {
    pub config: MountainCarConfig,
}

impl MountainCar {
    pub const fn new(config: MountainCarConfig) -> Self {
        Self { config }
    }
}

/// Throttle applied to the car.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Throttle {
    Reverse,
    Coast,
    Forward,
}

impl Throttle {
    /// Action for an action index.
    ///
    /// # Panics
    /// If `index` is not in `0..3`.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Reverse,
            1 => Self::Coast,
            2 => Self::Forward,
            _ => panic!("invalid mountain car action index {}", index),
        }
    }

    /// Signed throttle direction.
    pub const fn direction(self) -> f64 {
        match self {
            Self::Reverse => -1.0,
            Self::Coast => 0.0,
            Self::Forward => 1.0,
        }
    }
}

/// State of the [`MountainCar`] environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct MountainCarState {
    /// Horizontal position.
    pub position: f64,
    /// Horizontal velocity.
    pub velocity: f64,
}

impl EnvStructure for MountainCar {
    fn observation_size(&self) -> usize {
        2
    }

    fn num_actions(&self) -> usize {
        3
    }

    fn reward_range(&self) -> (f64, f64) {
        (-1.0, -1.0)
    }

    fn discount_factor(&self) -> f64 {
        self.config.discount_factor
    }
}

impl Environment for MountainCar {
    type State = MountainCarState;

    fn initial_state(&self, rng: &mut Prng) -> Self::State {
        let (low, high) = self.config.initial_position;
        MountainCarState {
            position: Uniform::new_inclusive(low, high).sample(rng),
            velocity: 0.0,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn observe(&self, state: &Self::State) -> Vec<f32> {
        vec![state.position as f32, state.velocity as f32]
    }

    fn step(&self, state: Self::State, action: usize, _: &mut Prng) -> (Successor<Self::State>, f64) {
        let c = &self.config;
        let throttle = Throttle::from_index(action);

        let velocity = (state.velocity + throttle.direction() * c.force
            - (3.0 * state.position).cos() * c.gravity)
            .clamp(-c.max_speed, c.max_speed);
        let position = (state.position + velocity).clamp(c.min_position, c.max_position);
        let velocity = if position <= c.min_position && velocity < 0.0 {
            0.0
        } else {
            velocity
        };

        let next_state = MountainCarState { position, velocity };
        let successor = if position >= c.goal_position {
            Successor::Terminate
        } else {
            Successor::Continue(next_state)
        };
        (successor, -1.0)
    }
}
