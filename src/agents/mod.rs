//! Reinforcement learning agents
pub mod a3c;
mod actor_critic;
mod buffer;
mod losses;
mod reinforce;
mod returns;
mod sampler;

pub use actor_critic::ActorCriticAgent;
pub use buffer::Trajectory;
pub use losses::{actor_critic_loss, reinforce_loss, ActorCriticLoss, LossConfig};
pub use reinforce::ReinforceAgent;
pub use returns::{discounted_returns, normalize_returns, Normalization, ReturnsConfig};
pub use sampler::{ActionSampler, SampleError};

use crate::logging::StatsLogger;
use crate::torch::optimizers::{AdamConfig, OptimizerStepError};
use crate::torch::{MlpConfig, PolicyValueModel};
use crate::Prng;
use clap::ArgEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use tch::TchError;
use thiserror::Error;

/// Learning algorithm.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ArgEnum, Serialize, Deserialize)]
pub enum Algorithm {
    /// Monte-Carlo policy gradient without a baseline.
    Reinforce,
    /// Synchronous advantage actor-critic.
    A2c,
    /// Asynchronous advantage actor-critic with a shared master model.
    A3c,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::A2c
    }
}

impl Algorithm {
    /// Whether this algorithm trains a value network.
    pub const fn uses_critic(self) -> bool {
        !matches!(self, Self::Reinforce)
    }

    /// Short name used in run names.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reinforce => "reinforce",
            Self::A2c => "a2c",
            Self::A3c => "a3c",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selects actions from observations.
pub trait Actor {
    /// Sample an action for the given observation.
    fn act(&self, observation: &[f32], rng: &mut Prng) -> Result<usize, SampleError>;
}

/// A learning agent that updates once per complete episode.
pub trait Agent: Actor {
    /// Update the agent from a complete episode.
    ///
    /// # Returns
    /// The scalar training loss.
    fn update(
        &mut self,
        trajectory: &Trajectory,
        logger: &mut dyn StatsLogger,
    ) -> Result<f64, AgentError>;

    /// The function approximator.
    fn model(&self) -> &PolicyValueModel;

    /// Mutable access to the function approximator, for restoring checkpoints.
    fn model_mut(&mut self) -> &mut PolicyValueModel;
}

/// Agent configuration shared by all algorithms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub algorithm: Algorithm,
    /// Structure of the actor and critic networks.
    pub model: MlpConfig,
    pub optimizer: AdamConfig,
    pub returns: ReturnsConfig,
    pub loss: LossConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            model: MlpConfig::default(),
            optimizer: AdamConfig::default(),
            returns: ReturnsConfig::default(),
            loss: LossConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Build a model with freshly initialized parameters for this configuration.
    pub fn build_model(&self, observation_size: usize, num_actions: usize) -> PolicyValueModel {
        PolicyValueModel::new(
            &self.model,
            observation_size,
            num_actions,
            self.algorithm.uses_critic(),
        )
    }

    /// Build a single-threaded agent.
    ///
    /// Fails for [`Algorithm::A3c`], which is trained with [`a3c::train_async`].
    pub fn build_agent(
        &self,
        observation_size: usize,
        num_actions: usize,
    ) -> Result<Box<dyn Agent + Send>, BuildAgentError> {
        if num_actions == 0 {
            return Err(BuildAgentError::NoActions);
        }
        let model = self.build_model(observation_size, num_actions);
        let sampler = ActionSampler::new(self.loss.log_prob_floor);
        match self.algorithm {
            Algorithm::Reinforce => Ok(Box::new(ReinforceAgent::new(
                model,
                self.optimizer,
                self.returns,
                self.loss,
                sampler,
            )?)),
            Algorithm::A2c => Ok(Box::new(ActorCriticAgent::new(
                model,
                self.optimizer,
                self.returns,
                self.loss,
                sampler,
            )?)),
            Algorithm::A3c => Err(BuildAgentError::NotSerial(self.algorithm)),
        }
    }
}

/// Error building an agent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildAgentError {
    #[error("{0} is trained asynchronously and has no single-threaded agent")]
    NotSerial(Algorithm),
    #[error("the environment has no actions")]
    NoActions,
    #[error("actor-critic agents require a model with a critic")]
    MissingCritic,
    #[error("failed to build the optimizer: {0}")]
    Optimizer(String),
}

impl From<TchError> for BuildAgentError {
    fn from(err: TchError) -> Self {
        Self::Optimizer(err.to_string())
    }
}

/// Error updating an agent.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AgentError {
    #[error("cannot update from an empty trajectory")]
    EmptyTrajectory,
    #[error("the model has no critic")]
    MissingCritic,
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error("optimizer step failed: {0}")]
    Optimizer(#[from] OptimizerStepError),
}
