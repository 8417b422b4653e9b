//! Training loops
use super::{run_episode, EpisodeHistory, StopCondition, StopReason};
use crate::agents::{Agent, AgentError, BuildAgentError, SampleError, Trajectory};
use crate::checkpoint::Counters;
use crate::envs::{BuildEnvError, StatefulEnvironment};
use crate::logging::{EpisodeProgress, StatsLogger};
use crate::torch::optimizers::OptimizerStepError;
use crate::torch::SnapshotError;
use crate::utils::stats::RollingMean;
use crate::Prng;
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Training loop configuration.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Episodes are cut off after this many steps.
    pub max_steps_per_episode: u64,
    pub stop: StopCondition,
    /// Seed for the environments and action sampling.
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            max_steps_per_episode: 500,
            stop: StopCondition::default(),
            seed: 0,
        }
    }
}

/// Result of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainSummary {
    /// Global counters at the end of training.
    pub counters: Counters,
    /// Scores of the episodes run by this process.
    pub history: EpisodeHistory,
    /// Wall-clock training time.
    pub elapsed: Duration,
    pub stop_reason: StopReason,
}

/// Tracks global counters and recent scores, and reports episode progress.
#[derive(Debug, Clone)]
pub(crate) struct ProgressTracker {
    pub counters: Counters,
    pub history: EpisodeHistory,
    pub recent: RollingMean,
    window: usize,
}

impl ProgressTracker {
    pub fn new(counters: Counters, window: usize) -> Self {
        Self {
            counters,
            history: EpisodeHistory::default(),
            recent: RollingMean::new(window),
            window,
        }
    }

    /// Record a completed episode with the given number of steps.
    ///
    /// The score of an episode is its length.
    pub fn record(&mut self, steps: u64) -> EpisodeProgress {
        self.counters.episode += 1;
        self.counters.step += steps;
        let score = steps as f64;
        self.history.push(self.counters.episode, score);
        self.recent.push(score);
        EpisodeProgress {
            episode: self.counters.episode,
            episode_steps: steps,
            total_steps: self.counters.step,
            window: self.window,
            average_score: self.recent.mean().unwrap_or(score),
        }
    }
}

/// Train an agent on a single thread, one update per episode.
///
/// # Args
/// * `agent` - The agent to train.
/// * `env` - The environment to train in.
/// * `stop` - When to stop training.
/// * `counters` - Initial global counters, for resuming from a checkpoint.
/// * `rng` - Random number generator for action sampling.
/// * `logger` - Receives per-episode statistics and progress lines.
pub fn train_serial(
    agent: &mut dyn Agent,
    env: &mut dyn StatefulEnvironment,
    stop: &StopCondition,
    counters: Counters,
    rng: &mut Prng,
    logger: &mut dyn StatsLogger,
) -> Result<TrainSummary, TrainError> {
    let start = Instant::now();
    let mut tracker = ProgressTracker::new(counters, stop.window);
    let mut trajectory = Trajectory::new(env.observation_size(), env.num_actions());
    let mut episodes = 0;

    let stop_reason = loop {
        if let Some(reason) = stop.check(start.elapsed(), episodes, &tracker.recent) {
            break reason;
        }
        let outcome = run_episode(env, &*agent, rng, &mut trajectory)?;
        episodes += 1;

        update_or_skip(agent.update(&trajectory, logger))?;
        logger.log_scalar("episode_reward", outcome.total_reward);
        logger.log_progress(&tracker.record(outcome.steps));
        logger.group_end();
    };
    logger.flush();

    Ok(TrainSummary {
        counters: tracker.counters,
        history: tracker.history,
        elapsed: start.elapsed(),
        stop_reason,
    })
}

/// Skip updates with a non-finite loss; other update errors are fatal.
pub(crate) fn update_or_skip(result: Result<f64, AgentError>) -> Result<(), AgentError> {
    match result {
        Ok(_) => Ok(()),
        Err(AgentError::Optimizer(OptimizerStepError::NaNLoss)) => {
            warn!("skipping update with non-finite loss");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

/// Error running a training loop.
#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    BuildEnv(#[from] BuildEnvError),
    #[error(transparent)]
    BuildAgent(#[from] BuildAgentError),
    #[error("action sampling failed: {0}")]
    Sample(#[from] SampleError),
    #[error("agent update failed: {0}")]
    Update(#[from] AgentError),
    #[error("incompatible model parameters: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("worker {0} panicked")]
    WorkerPanic(usize),
    #[error("the master store stopped unexpectedly")]
    MasterDisconnected,
}
