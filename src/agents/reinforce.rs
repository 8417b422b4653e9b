//! REINFORCE agent
use super::buffer::values_tensor;
use super::{
    reinforce_loss, ActionSampler, Actor, Agent, AgentError, BuildAgentError, LossConfig, ReturnsConfig,
    SampleError, Trajectory,
};
use crate::logging::StatsLogger;
use crate::torch::optimizers::{Adam, AdamConfig, BuildOptimizer, OnceOptimizer};
use crate::torch::PolicyValueModel;
use crate::Prng;

/// Monte-Carlo policy gradient agent (Williams, 1992).
///
/// Updates the policy once per episode with the normalized discounted returns as weights.
/// Any critic in the model is ignored.
pub struct ReinforceAgent {
    model: PolicyValueModel,
    optimizer: Adam,
    returns: ReturnsConfig,
    loss: LossConfig,
    sampler: ActionSampler,
}

impl ReinforceAgent {
    pub fn new(
        model: PolicyValueModel,
        optimizer_config: AdamConfig,
        returns: ReturnsConfig,
        loss: LossConfig,
        sampler: ActionSampler,
    ) -> Result<Self, BuildAgentError> {
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

impl Actor for ReinforceAgent {
    fn act(&self, observation: &[f32], rng: &mut Prng) -> Result<usize, SampleError> {
        self.sampler
            .sample(&self.model.action_probabilities(observation), rng)
    }
}

impl Agent for ReinforceAgent {
    fn update(
        &mut self,
        trajectory: &Trajectory,
        logger: &mut dyn StatsLogger,
    ) -> Result<f64, AgentError> {
        if trajectory.is_empty() {
            return Err(AgentError::EmptyTrajectory);
        }
        let returns = values_tensor(&self.returns.compute(trajectory.rewards()));
        let policy = self.model.policy(&trajectory.observations_tensor());
        let loss = reinforce_loss(
            &policy,
            &trajectory.actions_tensor(),
            &returns,
            self.loss.log_prob_floor,
        );
        let loss_value = self.optimizer.backward_step_once(&loss)?;
        logger.log_scalar("loss", loss_value);
        Ok(loss_value)
    }

    fn model(&self) -> &PolicyValueModel {
        &self.model
    }

    fn model_mut(&mut self) -> &mut PolicyValueModel {
        &mut self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torch::MlpConfig;
    use rand::SeedableRng;

    fn agent(learning_rate: f64) -> ReinforceAgent {
        tch::manual_seed(0);
        let model = PolicyValueModel::new(&MlpConfig::default(), 2, 2, false);
        ReinforceAgent::new(
            model,
            AdamConfig {
                learning_rate,
                ..AdamConfig::default()
            },
            ReturnsConfig::default(),
            LossConfig::default(),
            ActionSampler::default(),
        )
        .unwrap()
    }

    #[test]
    fn update_increases_probability_of_rewarded_action() {
        let mut agent = agent(0.01);
        let observation = [1.0, 0.0];
        let before = agent.model().action_probabilities(&observation)[1];
        for _ in 0..20 {
            // Action 1 followed by high reward, action 0 followed by low reward
            let mut trajectory = Trajectory::new(2, 2);
            trajectory.push(&observation, 1, 10.0);
            trajectory.push(&observation, 0, 0.0);
            agent.update(&trajectory, &mut ()).unwrap();
        }
        let after = agent.model().action_probabilities(&observation)[1];
        assert!(after > before, "{} <= {}", after, before);
    }

    #[test]
    fn empty_trajectory_is_error() {
        let mut agent = agent(0.01);
        assert_eq!(
            agent.update(&Trajectory::new(2, 2), &mut ()),
            Err(AgentError::EmptyTrajectory)
        );
    }

    #[test]
    fn act_in_range() {
        let agent = agent(0.01);
        let mut rng = Prng::seed_from_u64(0);
        for _ in 0..10 {
            assert!(agent.act(&[0.5, -0.5], &mut rng).unwrap() < 2);
        }
    }
}
