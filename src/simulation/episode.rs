//! Single-episode rollout
use crate::agents::{Actor, SampleError, Trajectory};
use crate::envs::StatefulEnvironment;
use crate::Prng;

/// Basic summary of a completed episode.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct EpisodeOutcome {
    /// Number of steps taken.
    pub steps: u64,
    /// Undiscounted sum of rewards.
    pub total_reward: f64,
}

/// Run one episode from reset until the environment ends it.
///
/// The trajectory is cleared and then filled with the episode steps.
pub fn run_episode<E, A>(
    env: &mut E,
    actor: &A,
    rng: &mut Prng,
    trajectory: &mut Trajectory,
) -> Result<EpisodeOutcome, SampleError>
where
    E: StatefulEnvironment + ?Sized,
    A: Actor + ?Sized,
{
    trajectory.clear();
    let mut outcome = EpisodeOutcome::default();
    let mut observation = env.reset();
    loop {
        let action = actor.act(&observation, rng)?;
        let step = env.step(action);
        trajectory.push(&observation, action, step.reward);
        outcome.steps += 1;
        outcome.total_reward += step.reward;

        match (step.episode_done, step.observation) {
            (false, Some(next)) => observation = next,
            _ => return Ok(outcome),
        }
    }
}
