//! Adam optimizer
use super::{BaseOptimizer, BuildOptimizer, GradientOptimizer, OnceOptimizer, OptimizerStepError};
use crate::torch::utils::zero_grad;
use serde::{Deserialize, Serialize};
use tch::{COptimizer, Kind, TchError, Tensor};

/// Configuration for the Adam optimizer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamConfig {
    /// Learning rate
    pub learning_rate: f64,
    /// Coefficient for the running average of the gradient
    pub beta1: f64,
    /// Coefficient for the running average of the square of the gradient
    pub beta2: f64,
    /// Weight decay (L2 penalty)
    pub weight_decay: f64,
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            weight_decay: 0.0,
        }
    }
}

impl TryFrom<&AdamConfig> for COptimizer {
    type Error = TchError;
    fn try_from(config: &AdamConfig) -> Result<Self, Self::Error> {
        COptimizer::adam(
            config.learning_rate,
            config.beta1,
            config.beta2,
            config.weight_decay,
        )
    }
}

impl BuildOptimizer for AdamConfig {
    type Optimizer = Adam;
    type Error = TchError;

    fn build_optimizer(&self, variables: Vec<Tensor>) -> Result<Adam, TchError> {
        let mut optimizer = COptimizer::try_from(self)?;
        for var in &variables {
            optimizer.add_parameters(var, 0)?;
        }
        Ok(Adam {
            optimizer,
            params: variables,
            step_count: 0,
        })
    }
}

/// Torch Adam optimizer over a fixed list of parameters.
///
/// Besides minimizing a loss, it can apply gradients computed elsewhere (for example by another
/// model with the same structure) with [`GradientOptimizer::apply_gradients`].
pub struct Adam {
    optimizer: COptimizer,
    params: Vec<Tensor>,
    step_count: u64,
}

impl Adam {
    /// Number of steps taken so far.
    pub const fn step_count(&self) -> u64 {
        self.step_count
    }
}

impl BaseOptimizer for Adam {
    fn zero_grad(&mut self) {
        for param in &self.params {
            zero_grad(param);
        }
    }
}

impl OnceOptimizer for Adam {
    fn step_once(&mut self) -> Result<(), OptimizerStepError> {
        self.optimizer
            .step()
            .map_err(|err| OptimizerStepError::Torch(err.to_string()))?;
        self.step_count += 1;
        Ok(())
    }
}

impl GradientOptimizer for Adam {
    fn apply_gradients(&mut self, gradients: &[Tensor]) -> Result<(), OptimizerStepError> {
        if gradients.len() != self.params.len() {
            return Err(OptimizerStepError::GradientCount {
                expected: self.params.len(),
                actual: gradients.len(),
            });
        }
        for (index, (param, grad)) in self.params.iter().zip(gradients).enumerate() {
            if param.size() != grad.size() {
                return Err(OptimizerStepError::GradientShape {
                    index,
                    expected: param.size(),
                    actual: grad.size(),
                });
            }
        }

        // d/dp sum(p * g) = g, so back-propagating this surrogate sets each parameter
        // gradient to the supplied one.
        let surrogate = self
            .params
            .iter()
            .zip(gradients)
            .map(|(param, grad)| (param * grad.detach()).sum(Kind::Float))
            .reduce(|total, term| total + term);
        if let Some(surrogate) = surrogate {
            self.zero_grad();
            surrogate.backward();
            self.step_once()?;
        }
        Ok(())
    }
}
