use super::{EnvStructure, Environment, Successor};
use crate::Prng;

/// Environment wrapper that cuts off episodes after a set number of steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepLimit<E> {
    pub inner: E,
    /// Maximum number of steps per episode
    pub max_steps_per_episode: u64,
}

impl<E> StepLimit<E> {
    pub const fn new(inner: E, max_steps_per_episode: u64) -> Self {
        Self {
            inner,
            max_steps_per_episode,
        }
    }
}

impl<E: EnvStructure> EnvStructure for StepLimit<E> {
    fn observation_size(&self) -> usize {
        self.inner.observation_size()
    }
    fn num_actions(&self) -> usize {
        self.inner.num_actions()
    }
    fn reward_range(&self) -> (f64, f64) {
        self.inner.reward_range()
    }
    fn discount_factor(&self) -> f64 {
        self.inner.discount_factor()
    }
}

impl<E: Environment> Environment for StepLimit<E> {
    /// `(inner_state, current_steps)`
    type State = (E::State, u64);

    fn initial_state(&self, rng: &mut Prng) -> Self::State {
        (self.inner.initial_state(rng), 0)
    }

    fn observe(&self, state: &Self::State) -> Vec<f32> {
        self.inner.observe(&state.0)
    }

    fn step(&self, state: Self::State, action: usize, rng: &mut Prng) -> (Successor<Self::State>, f64) {
        let (inner_state, mut current_steps) = state;
        let (inner_successor, reward) = self.inner.step(inner_state, action, rng);
        current_steps += 1;

        // Attach the new current step count to the state
        let mut successor = inner_successor.map(|s| (s, current_steps));

        // Cut off the episode without marking the state as terminal.
        if current_steps >= self.max_steps_per_episode {
            if let Successor::Continue(s) = successor {
                successor = Successor::Interrupt(s);
            }
        }
        (successor, reward)
    }
}

#[cfg(test)]
mod tests {
    use super::super::DeterministicChain;
    use super::*;
    use rand::SeedableRng;
    use rstest::rstest;

    fn episode_len<E: Environment>(env: &E) -> (u64, bool) {
        let mut rng = Prng::seed_from_u64(0);
        let mut state = env.initial_state(&mut rng);
        let mut steps = 0;
        loop {
            steps += 1;
            match env.step(state, 0, &mut rng).0 {
                Successor::Continue(s) => state = s,
                Successor::Terminate => return (steps, true),
                Successor::Interrupt(_) => return (steps, false),
            }
        }
    }

    #[rstest]
    #[case(3, 3, false)]
    #[case(5, 5, true)]
    #[case(8, 5, true)]
    fn cuts_off_episode(#[case] limit: u64, #[case] expected_len: u64, #[case] terminal: bool) {
        let env = StepLimit::new(DeterministicChain::default(), limit);
        assert_eq!(episode_len(&env), (expected_len, terminal));
    }
}
