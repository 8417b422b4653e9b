//! Converting an `Environment` into a `StatefulEnvironment`
use super::{EnvStructure, Environment, StatefulEnvironment, Step, Successor};
use crate::Prng;
use rand::SeedableRng;

/// Wraps an [`Environment`] as a [`StatefulEnvironment`].
#[derive(Debug, Clone)]
pub struct EnvWithState<E: Environment> {
    pub env: E,
    state: Option<E::State>,
    rng: Prng,
}

impl<E: Environment> EnvWithState<E> {
    pub fn new(env: E, seed: u64) -> Self {
        Self {
            env,
            state: None,
            rng: Prng::seed_from_u64(seed),
        }
    }
}

impl<E: Environment> EnvStructure for EnvWithState<E> {
    fn observation_size(&self) -> usize {
        self.env.observation_size()
    }

    fn num_actions(&self) -> usize {
        self.env.num_actions()
    }

    fn reward_range(&self) -> (f64, f64) {
        self.env.reward_range()
    }

    fn discount_factor(&self) -> f64 {
        self.env.discount_factor()
    }
}

impl<E: Environment> StatefulEnvironment for EnvWithState<E> {
    fn reset(&mut self) -> Vec<f32> {
        let state = self.env.initial_state(&mut self.rng);
        let observation = self.env.observe(&state);
        self.state = Some(state);
        observation
    }

    fn step(&mut self, action: usize) -> Step {
        let state = self
            .state
            .take()
            .expect("Must call reset() before the start of each episode");
        let (successor, reward) = self.env.step(state, action, &mut self.rng);
        let episode_done = successor.episode_done();
        let observation = match successor {
            Successor::Continue(s) => {
                let observation = self.env.observe(&s);
                self.state = Some(s);
                Some(observation)
            }
            Successor::Interrupt(s) => Some(self.env.observe(&s)),
            Successor::Terminate => None,
        };
        Step {
            observation,
            reward,
            episode_done,
        }
    }
}
