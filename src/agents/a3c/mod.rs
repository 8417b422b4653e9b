//! Asynchronous advantage actor-critic (Mnih et al., 2016)
//!
//! Workers run episodes on their own threads with local copies of the model and exchange
//! gradients and parameters with a [`MasterStore`] thread over channels.
mod master;
mod worker;

pub use master::{
    EpisodeReport, LossReport, MasterHandle, MasterSnapshot, MasterState, MasterStore,
    MasterThread,
};
pub use worker::{Worker, WorkerSummary};

use super::{AgentConfig, BuildAgentError};
use crate::checkpoint::Counters;
use crate::envs::EnvConfig;
use crate::logging::StatsLogger;
use crate::simulation::{StopReason, TrainConfig, TrainError, TrainSummary};
use crate::torch::PolicyValueModel;
use crate::Prng;
use log::info;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Configuration of asynchronous training.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct A3cConfig {
    /// Number of worker threads. `0` uses one worker per CPU.
    pub num_workers: usize,
}

impl Default for A3cConfig {
    fn default() -> Self {
        Self { num_workers: 6 }
    }
}

impl A3cConfig {
    /// Number of worker threads to run.
    pub fn worker_count(&self) -> usize {
        if self.num_workers == 0 {
            num_cpus::get()
        } else {
            self.num_workers
        }
    }
}

/// Result of asynchronous training.
pub struct AsyncSummary {
    pub summary: TrainSummary,
    /// The trained master model.
    pub model: PolicyValueModel,
    pub workers: Vec<WorkerSummary>,
    /// Number of gradient updates applied to the master model.
    pub updates: u64,
}

/// Train a master model with asynchronous actor-critic workers.
///
/// # Args
/// * `agent_config` - Model, optimizer, and loss configuration.
/// * `env_config` - Environment built once per worker.
/// * `train_config` - Step limit, seed, and per-worker stop condition.
/// * `a3c_config` - Number of workers.
/// * `master_model` - Initial master model, fresh or restored from a checkpoint.
/// * `counters` - Initial global counters.
/// * `logger` - Receives progress of all workers from the master store thread.
pub fn train_async(
    agent_config: &AgentConfig,
    env_config: &EnvConfig,
    train_config: &TrainConfig,
    a3c_config: &A3cConfig,
    master_model: PolicyValueModel,
    counters: Counters,
    logger: &mut (dyn StatsLogger + Send),
) -> Result<AsyncSummary, TrainError> {
    if !master_model.has_critic() {
        return Err(BuildAgentError::MissingCritic.into());
    }
    let num_workers = a3c_config.worker_count();
    let mut seed_rng = Prng::seed_from_u64(train_config.seed);
    let workers = (0..num_workers)
        .map(|id| -> Result<_, TrainError> {
            let env = env_config.build_env(train_config.max_steps_per_episode, seed_rng.gen())?;
            let model = agent_config.build_model(
                master_model.observation_size(),
                master_model.num_actions(),
            );
            Ok(Worker::new(
                id,
                env,
                model,
                agent_config.returns,
                agent_config.loss,
                Prng::seed_from_u64(seed_rng.gen()),
            ))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let store = MasterStore::new(
        master_model,
        &agent_config.optimizer,
        counters,
        train_config.stop.window,
    )?;
    let stop = &train_config.stop;
    info!("starting {} workers", num_workers);
    let start = Instant::now();

    let (state, worker_results) = crossbeam::scope(|scope| {
        let master = store.spawn(scope, logger);
        let threads: Vec<_> = workers
            .into_iter()
            .map(|mut worker| {
                let handle = master.handle();
                scope.spawn(move |_| worker.run(&handle, stop))
            })
            .collect();

        let results: Vec<_> = threads
            .into_iter()
            .enumerate()
            .map(|(id, thread)| {
                thread
                    .join()
                    .map_err(|_| TrainError::WorkerPanic(id))
                    .and_then(|result| result)
            })
            .collect();
        (master.finish(), results)
    })
    .map_err(|_| TrainError::MasterDisconnected)?;

    let state = state?;
    let workers = worker_results
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
    let stop_reason = if workers
        .iter()
        .any(|w| w.stop_reason == StopReason::GoalReached)
    {
        StopReason::GoalReached
    } else {
        workers
            .first()
            .map_or(StopReason::EpisodeLimit, |w| w.stop_reason)
    };

    Ok(AsyncSummary {
        summary: TrainSummary {
            counters: state.counters,
            history: state.history,
            elapsed: start.elapsed(),
            stop_reason,
        },
        model: state.model,
        workers,
        updates: state.version,
    })
}
