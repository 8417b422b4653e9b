//! Policy gradient and actor-critic losses
use serde::{Deserialize, Serialize};
use tch::{Kind, Tensor};

/// Loss function configuration.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LossConfig {
    /// Weight of the policy entropy bonus in the actor-critic loss.
    pub entropy_coef: f64,
    /// Probabilities are clipped to at least this value before taking logarithms.
    ///
    /// Also used as the minimum sampling weight of each action.
    pub log_prob_floor: f64,
}

impl Default for LossConfig {
    fn default() -> Self {
        Self {
            entropy_coef: 0.01,
            log_prob_floor: 1e-10,
        }
    }
}

/// Log of probabilities clipped into `[floor, 1]`.
fn clipped_log(probabilities: &Tensor, floor: f64) -> Tensor {
    probabilities.clamp(floor, 1.0).log()
}

fn batch_size(actions: &Tensor) -> f64 {
    actions.size().first().copied().unwrap_or(0).max(1) as f64
}

/// REINFORCE loss: negative mean of `log π(a|s) * G` over the episode.
///
/// # Args
/// * `policy` - Action probabilities, shape `[N, A]`.
/// * `actions` - One-hot taken actions, shape `[N, A]`.
/// * `returns` - Learning targets, shape `[N]`.
/// * `log_prob_floor` - Probability clip floor.
pub fn reinforce_loss(
    policy: &Tensor,
    actions: &Tensor,
    returns: &Tensor,
    log_prob_floor: f64,
) -> Tensor {
    let n = batch_size(actions);
    let weighted = actions * clipped_log(policy, log_prob_floor) * returns.unsqueeze(-1);
    -weighted.sum(Kind::Float) / n
}

/// Actor-critic loss and its components.
#[derive(Debug)]
pub struct ActorCriticLoss {
    /// `actor + critic - entropy_coef * entropy`; the tensor to minimize.
    pub total: Tensor,
    pub actor: f64,
    pub critic: f64,
    /// Mean policy entropy.
    pub entropy: f64,
}

/// Advantage actor-critic loss.
///
/// The advantage `target - V(s)` is treated as a constant in the actor term
/// so that the policy gradient does not flow into the critic.
///
/// # Args
/// * `policy` - Action probabilities, shape `[N, A]`.
/// * `values` - State value estimates, shape `[N]`.
/// * `actions` - One-hot taken actions, shape `[N, A]`.
/// * `targets` - Value targets (normalized returns), shape `[N]`.
/// * `config` - Entropy weight and clip floor.
pub fn actor_critic_loss(
    policy: &Tensor,
    values: &Tensor,
    actions: &Tensor,
    targets: &Tensor,
    config: &LossConfig,
) -> ActorCriticLoss {
    let n = batch_size(actions);
    let log_policy = clipped_log(policy, config.log_prob_floor);

    let advantages = (targets - values).detach();
    let actor = -(actions * &log_policy * advantages.unsqueeze(-1)).sum(Kind::Float) / n;
    let critic = (values - targets).square().mean(Kind::Float);
    let entropy = -(policy * &log_policy).sum(Kind::Float) / n;
    let total = &actor + &critic - &entropy * config.entropy_coef;

    ActorCriticLoss {
        actor: actor.double_value(&[]),
        critic: critic.double_value(&[]),
        entropy: entropy.double_value(&[]),
        total,
    }
}
