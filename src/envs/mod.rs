//! Reinforcement learning environments
mod builder;
mod cartpole;
mod chain;
mod mountain_car;
mod stateful;
mod step_limit;

pub use builder::{BuildEnvError, EnvConfig};
pub use cartpole::{CartPole, CartPolePhysicalState, EnvironmentParams, PhysicalConstants, Push};
pub use chain::DeterministicChain;
pub use mountain_car::{MountainCar, MountainCarConfig, MountainCarState, Throttle};
pub use stateful::EnvWithState;
pub use step_limit::StepLimit;

use crate::Prng;

/// The external structure of a reinforcement learning environment.
pub trait EnvStructure {
    /// Number of features in each observation vector.
    fn observation_size(&self) -> usize;

    /// Number of discrete actions. Valid actions are `0 .. num_actions()`.
    fn num_actions(&self) -> usize;

    /// A lower and upper bound on possible reward values.
    ///
    /// These bounds are not required to be tight but ideally will be as tight as possible.
    fn reward_range(&self) -> (f64, f64);

    /// A discount factor applied to future rewards.
    ///
    /// A value between `0` and `1`, inclusive.
    fn discount_factor(&self) -> f64;
}

impl<E: EnvStructure + ?Sized> EnvStructure for Box<E> {
    fn observation_size(&self) -> usize {
        E::observation_size(self)
    }
    fn num_actions(&self) -> usize {
        E::num_actions(self)
    }
    fn reward_range(&self) -> (f64, f64) {
        E::reward_range(self)
    }
    fn discount_factor(&self) -> f64 {
        E::discount_factor(self)
    }
}

/// The successor state or outcome of an episode step.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Successor<S> {
    /// The episode continues with the given state.
    Continue(S),
    /// The episode ends by entering a terminal state.
    ///
    /// A terminal state is one from which all possible trajectories would have 0 reward.
    Terminate,
    /// The episode ends despite entering the given non-terminal state.
    ///
    /// This happens when an episode is cut off by a step limit.
    Interrupt(S),
}

impl<S> Successor<S> {
    /// Whether this successor ends the episode.
    #[inline]
    pub const fn episode_done(&self) -> bool {
        !matches!(self, Self::Continue(_))
    }

    /// Get the inner state of `Continue` and `Interrupt` variants.
    #[inline]
    #[allow(clippy::missing_const_for_fn)] // not allowed to be const at time of writing
    pub fn into_state(self) -> Option<S> {
        match self {
            Self::Continue(s) | Self::Interrupt(s) => Some(s),
            Self::Terminate => None,
        }
    }

    /// Apply a function to the inner state.
    #[inline]
    pub fn map<F, T>(self, f: F) -> Successor<T>
    where
        F: FnOnce(S) -> T,
    {
        match self {
            Self::Continue(s) => Successor::Continue(f(s)),
            Self::Terminate => Successor::Terminate,
            Self::Interrupt(s) => Successor::Interrupt(f(s)),
        }
    }
}

/// A reinforcement learning environment.
///
/// This defines the environment dynamics and structure.
/// It does not internally manage state.
pub trait Environment: EnvStructure {
    /// Environment state type. Not necessarily observed by the agent.
    type State;

    /// Sample a new initial state.
    fn initial_state(&self, rng: &mut Prng) -> Self::State;

    /// Feature vector observed by the agent in the given state.
    fn observe(&self, state: &Self::State) -> Vec<f32>;

    /// Perform a state transition in reponse to an action.
    ///
    /// # Args
    /// * `state`  - The initial state.
    /// * `action` - Action index in `0 .. num_actions()`.
    /// * `rng`    - Random number generator for any stochasticity in the transition.
    ///
    /// # Returns
    /// * `successor` - The resulting state or episode outcome.
    /// * `reward`    - The reward value for this transition.
    fn step(&self, state: Self::State, action: usize, rng: &mut Prng)
        -> (Successor<Self::State>, f64);
}

/// Result of a step in a [`StatefulEnvironment`].
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Observation of the resulting state. `None` if the state is terminal.
    pub observation: Option<Vec<f32>>,
    /// Reward for the transition.
    pub reward: f64,
    /// Whether this step ends the episode (terminal state or step limit).
    pub episode_done: bool,
}

/// A reinforcement learning environment with internal state.
///
/// Prefer implementing [`Environment`] since [`EnvWithState`] can be used
/// to create a `StatefulEnvironment` out of an `Environment`.
pub trait StatefulEnvironment: EnvStructure {
    /// Reset the environment to a new initial state.
    ///
    /// Must be called before each new episode.
    fn reset(&mut self) -> Vec<f32>;

    /// Take a step in the environment.
    ///
    /// # Panics
    /// If there is no active episode: `reset()` was not called after construction or after a
    /// step with `episode_done = true`.
    fn step(&mut self, action: usize) -> Step;
}

impl<E: StatefulEnvironment + ?Sized> StatefulEnvironment for Box<E> {
    fn reset(&mut self) -> Vec<f32> {
        E::reset(self)
    }
    fn step(&mut self, action: usize) -> Step {
        E::step(self, action)
    }
}

/// Boxed stateful environment that can be moved into a worker thread.
pub type DynEnv = Box<dyn StatefulEnvironment + Send>;
