//! Advantage actor-critic agent
use super::buffer::values_tensor;
use super::{
    actor_critic_loss, ActionSampler, Actor, ActorCriticLoss, Agent, AgentError,
    BuildAgentError, LossConfig, ReturnsConfig, SampleError, Trajectory,
};
use crate::logging::StatsLogger;
use crate::torch::optimizers::{Adam, AdamConfig, BuildOptimizer, OnceOptimizer};
use crate::torch::PolicyValueModel;
use crate::Prng;

/// Synchronous advantage actor-critic agent.
///
/// The actor and critic are updated together once per episode with a single Adam step on
/// the combined loss. The critic regresses onto the normalized Monte-Carlo returns.
pub struct ActorCriticAgent {
    model: PolicyValueModel,
    optimizer: Adam,
    returns: ReturnsConfig,
    loss: LossConfig,
    sampler: ActionSampler,
}

impl ActorCriticAgent {
    pub fn new(
        model: PolicyValueModel,
        optimizer_config: AdamConfig,
        returns: ReturnsConfig,
        loss: LossConfig,
        sampler: ActionSampler,
    ) -> Result<Self, BuildAgentError> {
        if !model.has_critic() {
            return Err(BuildAgentError::MissingCritic);
        }
        let optimizer = optimizer_config.build_optimizer(model.trainable_variables())?;
        Ok(Self {
            model,
            optimizer,
            returns,
            loss,
            sampler,
        })
    }
}

/// Actor-critic loss of a model on a complete episode.
pub fn episode_loss(
    model: &PolicyValueModel,
    trajectory: &Trajectory,
    returns: &ReturnsConfig,
    loss: &LossConfig,
) -> Result<ActorCriticLoss, AgentError> {
    if trajectory.is_empty() {
        return Err(AgentError::EmptyTrajectory);
    }
    let states = trajectory.observations_tensor();
    let values = model.value(&states).ok_or(AgentError::MissingCritic)?;
    let targets = values_tensor(&returns.compute(trajectory.rewards()));
    Ok(actor_critic_loss(
        &model.policy(&states),
        &values,
        &trajectory.actions_tensor(),
        &targets,
        loss,
    ))
}

/// Log the components of an actor-critic loss.
pub fn log_loss(loss: &ActorCriticLoss, loss_value: f64, logger: &mut dyn StatsLogger) {
    logger.log_scalar("loss", loss_value);
    logger.log_scalar("actor_loss", loss.actor);
    logger.log_scalar("critic_loss", loss.critic);
    logger.log_scalar("entropy", loss.entropy);
}

impl Actor for ActorCriticAgent {
    fn act(&self, observation: &[f32], rng: &mut Prng) -> Result<usize, SampleError> {
        self.sampler
            .sample(&self.model.action_probabilities(observation), rng)
    }
}

impl Agent for ActorCriticAgent {
    fn update(
        &mut self,
        trajectory: &Trajectory,
        logger: &mut dyn StatsLogger,
    ) -> Result<f64, AgentError> {
        let loss = episode_loss(&self.model, trajectory, &self.returns, &self.loss)?;
        let loss_value = self.optimizer.backward_step_once(&loss.total)?;
        log_loss(&loss, loss_value, logger);
        Ok(loss_value)
    }

    fn model(&self) -> &PolicyValueModel {
        &self.model
    }

    fn model_mut(&mut self) -> &mut PolicyValueModel {
        &mut self.model
    }
}
