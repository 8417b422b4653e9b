//! Asynchronous actor-critic worker
use super::master::{EpisodeReport, LossReport, MasterHandle, MasterSnapshot};
use crate::agents::actor_critic::episode_loss;
use crate::agents::{ActionSampler, Actor, LossConfig, ReturnsConfig, SampleError, Trajectory};
use crate::envs::StatefulEnvironment;
use crate::simulation::{run_episode, StopCondition, StopReason, TrainError};
use crate::torch::utils::{detached_grad, zero_grad};
use crate::torch::{ParameterSnapshot, PolicyValueModel};
use crate::utils::stats::RollingMean;
use crate::Prng;
use log::{debug, warn};
use std::time::Instant;

/// Local policy of a worker.
struct LocalPolicy {
    model: PolicyValueModel,
    sampler: ActionSampler,
}

impl Actor for LocalPolicy {
    fn act(&self, observation: &[f32], rng: &mut Prng) -> Result<usize, SampleError> {
        self.sampler
            .sample(&self.model.action_probabilities(observation), rng)
    }
}

/// Summary of a finished worker.
#[derive(Debug)]
pub struct WorkerSummary {
    pub id: usize,
    /// Number of episodes run by this worker.
    pub episodes: u64,
    pub stop_reason: StopReason,
    /// Local parameters when the worker stopped; the last master state it pulled.
    pub parameters: ParameterSnapshot,
    /// Master parameter version of `parameters`.
    pub parameters_version: u64,
}

/// A worker with its own environment and local copy of the model.
///
/// Each episode the worker computes the actor-critic loss gradient of its local model,
/// pushes it to the master store, and replaces its local parameters with the reply.
pub struct Worker<E> {
    id: usize,
    env: E,
    policy: LocalPolicy,
    returns: ReturnsConfig,
    loss: LossConfig,
    rng: Prng,
}

impl<E: StatefulEnvironment> Worker<E> {
    /// Create a worker.
    ///
    /// `model` must have the same structure as the master model.
    pub fn new(
        id: usize,
        env: E,
        model: PolicyValueModel,
        returns: ReturnsConfig,
        loss: LossConfig,
        rng: Prng,
    ) -> Self {
        Self {
            id,
            env,
            policy: LocalPolicy {
                model,
                sampler: ActionSampler::new(loss.log_prob_floor),
            },
            returns,
            loss,
            rng,
        }
    }

    /// Run episodes until the stop condition is met for this worker's own scores.
    pub fn run(
        &mut self,
        master: &MasterHandle,
        stop: &StopCondition,
    ) -> Result<WorkerSummary, TrainError> {
        debug!("worker {} starting", self.id);
        let mut parameters_version = self.sync(&master.pull()?)?;

        let start = Instant::now();
        let mut recent = RollingMean::new(stop.window);
        let mut trajectory = Trajectory::new(self.env.observation_size(), self.env.num_actions());
        let mut episodes = 0;
        let stop_reason = loop {
            if let Some(reason) = stop.check(start.elapsed(), episodes, &recent) {
                break reason;
            }
            let outcome =
                run_episode(&mut self.env, &self.policy, &mut self.rng, &mut trajectory)?;
            episodes += 1;
            recent.push(outcome.steps as f64);

            let (gradients, loss) = self.gradients(&trajectory)?;
            let report = EpisodeReport {
                worker: self.id,
                steps: outcome.steps,
                total_reward: outcome.total_reward,
                loss,
            };
            parameters_version = self.sync(&master.push_pull(gradients, report)?)?;
        };
        debug!("worker {} stopped: {}", self.id, stop_reason);

        Ok(WorkerSummary {
            id: self.id,
            episodes,
            stop_reason,
            parameters: self.policy.model.snapshot(),
            parameters_version,
        })
    }

    /// Gradients of the local actor-critic loss, in model variable order.
    ///
    /// Returns no gradients if the loss is not finite.
    fn gradients(
        &self,
        trajectory: &Trajectory,
    ) -> Result<(Option<Vec<tch::Tensor>>, Option<LossReport>), TrainError> {
        let model = &self.policy.model;
        let loss = episode_loss(model, trajectory, &self.returns, &self.loss)?;
        let total = loss.total.double_value(&[]);
        if !total.is_finite() {
            warn!("worker {}: skipping update with non-finite loss", self.id);
            return Ok((None, None));
        }

        let variables = model.trainable_variables();
        for var in &variables {
            zero_grad(var);
        }
        loss.total.backward();
        let gradients = variables.iter().map(detached_grad).collect();
        let report = LossReport {
            total,
            actor: loss.actor,
            critic: loss.critic,
            entropy: loss.entropy,
        };
        Ok((Some(gradients), Some(report)))
    }

    /// Overwrite the local parameters with master parameters; returns their version.
    fn sync(&mut self, snapshot: &MasterSnapshot) -> Result<u64, TrainError> {
        self.policy.model.load_snapshot(&snapshot.parameters)?;
        Ok(snapshot.version)
    }
}
