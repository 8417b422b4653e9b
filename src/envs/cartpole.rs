//! Cart-pole environment
use super::{EnvStructure, Environment, Successor};
use crate::Prng;
use rand::distributions::{Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// Cart-Pole environment
///
/// Consists of a simulated cart on a track with a vertical pole attached by a hinge on the top.
/// The goal is to keep the pole upright by applying left and right forces to the cart.
///
/// Uses the frictionless dynamics and explicit Euler integration of the
/// [OpenAI Gym][gym_cartpole] [CartPole-v1 environment][cartpole_source],
/// which are based on [Barto et al. (1983)][barto1983].
///
/// [barto1983]: https://ieeexplore.ieee.org/document/6313077
/// [gym_cartpole]: https://gym.openai.com/envs/CartPole-v1/
/// [cartpole_source]: https://github.com/openai/gym/blob/master/gym/envs/classic_control/cartpole.py
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPole {
    phys: InternalPhysicalConstants,
    env: EnvironmentParams,
}

impl CartPole {
    pub fn new(phys: PhysicalConstants, env: EnvironmentParams) -> Self {
        Self {
            phys: phys.into(),
            env,
        }
    }
}

/// Horizontal push applied to the cart.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Push {
    Left,
    Right,
}

impl Push {
    /// Action for an action index.
    ///
    /// # Panics
    /// If `index` is not 0 or 1.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Left,
            1 => Self::Right,
            _ => panic!("invalid cart-pole action index {}", index),
        }
    }
}

impl EnvStructure for CartPole {
    fn observation_size(&self) -> usize {
        4
    }

    fn num_actions(&self) -> usize {
        2
    }

    fn reward_range(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn discount_factor(&self) -> f64 {
        self.env.discount_factor
    }
}

impl Environment for CartPole {
    type State = CartPolePhysicalState;

    fn initial_state(&self, rng: &mut Prng) -> Self::State {
        // All parameters are sampled from the same range of values
        let dist = Uniform::new_inclusive(-0.05, 0.05);
        CartPolePhysicalState {
            cart_position: dist.sample(rng),
            cart_velocity: dist.sample(rng),
            pole_angle: dist.sample(rng),
            pole_angular_velocity: dist.sample(rng),
        }
    }

    fn observe(&self, state: &Self::State) -> Vec<f32> {
        debug_assert!(
            !self.env.out_of_bounds(state),
            "out-of-bounds state should not have been produced"
        );
        state.features()
    }

    fn step(&self, state: Self::State, action: usize, _: &mut Prng) -> (Successor<Self::State>, f64) {
        let applied_force = match Push::from_index(action) {
            Push::Left => -self.env.action_force,
            Push::Right => self.env.action_force,
        };
        let next_state = self.phys.next_state(&state, applied_force);
        // The step that knocks the pole over is still rewarded.
        let reward = 1.0;
        let successor = if self.env.out_of_bounds(&next_state) {
            Successor::Terminate
        } else {
            Successor::Continue(next_state)
        };
        (successor, reward)
    }
}

/// Physical constants for the [`CartPole`] environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    /// Downward force of gravity (m/s^2)
    pub gravity: f64,
    /// Mass of the cart (kg)
    pub mass_cart: f64,
    /// Mass of the pole (kg)
    pub mass_pole: f64,
    /// Half the length of the pole (m)
    pub length_half_pole: f64,
    /// Simulation time step (s)
    pub time_step: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        // Defaults from the OpenAI CartPole-v1 environment
        Self {
            gravity: 9.8,
            mass_cart: 1.0,
            mass_pole: 0.1,
            length_half_pole: 0.5,
            time_step: 0.02,
        }
    }
}

/// Parameters for [`CartPole`] as a reinforcement learning environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentParams {
    /// Magnitude of the force (N) applied by actions.
    pub action_force: f64,
    /// Maximum absolute position (meters) before the episode is ended.
    pub max_pos: f64,
    /// Maximum absolute pole angle from vertical (radians) before the episode is ended.
    pub max_angle: f64,
    /// Discount factor
    pub discount_factor: f64,
}

impl Default for EnvironmentParams {
    fn default() -> Self {
        // Defaults (except discount factor) from the OpenAI CartPole-v1 environment
        Self {
            action_force: 10.0,
            max_pos: 2.4,
            max_angle: 12.0f64.to_radians(), // 12 degrees
            discount_factor: 0.99,
        }
    }
}

impl EnvironmentParams {
    fn out_of_bounds(&self, state: &CartPolePhysicalState) -> bool {
        state.cart_position.abs() > self.max_pos || state.pole_angle.abs() > self.max_angle
    }
}

/// Internal cart-pole constants with pre-computed common values.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
struct InternalPhysicalConstants {
    /// Fundamental constants
    c: PhysicalConstants,
    /// `mass_cart + mass_pole`
    total_mass: f64,
    /// `mass_pole * length_half_pole`
    mass_length_pole: f64,
}

impl Default for InternalPhysicalConstants {
    fn default() -> Self {
        PhysicalConstants::default().into()
    }
}

impl From<PhysicalConstants> for InternalPhysicalConstants {
    fn from(c: PhysicalConstants) -> Self {
        Self {
            c,
            total_mass: c.mass_cart + c.mass_pole,
            mass_length_pole: c.mass_pole * c.length_half_pole,
        }
    }
}

/// Physical state of the [`CartPole`] environment.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPolePhysicalState {
    /// Cart position from the track midpoint (m).
    pub cart_position: f64,
    /// Cart velocity (m/s).
    pub cart_velocity: f64,
    /// Angle of the pole from vertical (radians).
    pub pole_angle: f64,
    /// Pole angular velocity about the hinge (radians / s).
    pub pole_angular_velocity: f64,
}

impl CartPolePhysicalState {
    /// State as an observation feature vector.
    #[allow(clippy::cast_possible_truncation)]
    pub fn features(&self) -> Vec<f32> {
        vec![
            self.cart_position as f32,
            self.cart_velocity as f32,
            self.pole_angle as f32,
            self.pole_angular_velocity as f32,
        ]
    }
}

impl InternalPhysicalConstants {
    /// Simulate the state for one time step with an applied force on the cart (in N).
    pub fn next_state(
        &self,
        state: &CartPolePhysicalState,
        applied_force: f64,
    ) -> CartPolePhysicalState {
        let (sin_angle, cos_angle) = state.pole_angle.sin_cos();
        let angular_velocity_squared = state.pole_angular_velocity * state.pole_angular_velocity;

        let temp = (applied_force + self.mass_length_pole * angular_velocity_squared * sin_angle)
            / self.total_mass;
        let angular_acceleration = (self.c.gravity * sin_angle - cos_angle * temp)
            / (self.c.length_half_pole
                * (4.0 / 3.0 - self.c.mass_pole * cos_angle * cos_angle / self.total_mass));
        let cart_acceleration =
            temp - self.mass_length_pole * angular_acceleration * cos_angle / self.total_mass;

        // Explicit euler integration
        let tau = self.c.time_step;
        CartPolePhysicalState {
            cart_position: state.cart_position + tau * state.cart_velocity,
            cart_velocity: state.cart_velocity + tau * cart_acceleration,
            pole_angle: state.pole_angle + tau * state.pole_angular_velocity,
            pole_angular_velocity: state.pole_angular_velocity + tau * angular_acceleration,
        }
    }
}
