//! Optimizers
mod adam;

pub use adam::{Adam, AdamConfig};

use tch::Tensor;
use thiserror::Error;

/// Base optimizer interface
pub trait BaseOptimizer {
    /// Zero out the gradients of all optimized tensors
    fn zero_grad(&mut self);
}

/// Optimizer that minimizes a loss tensor using a single gradient evaluation per step.
///
/// Specifically, each step may use the gradient at the initial point of the step
/// and makes no further gradient evaluations.
pub trait OnceOptimizer: BaseOptimizer {
    /// Perform a loss minimization step (parameter update).
    ///
    /// Uses the existing gradients stored with the parameter tensors.
    fn step_once(&mut self) -> Result<(), OptimizerStepError>;

    /// Apply a backward step pass, update the gradients, and perform an optimization step.
    ///
    /// # Args
    /// * `loss` - Scalar loss tensor. Back-propagation is applied to this tensor to obtain a
    ///     gradient.
    ///
    /// # Returns
    /// The loss value on success.
    ///
    /// If the loss is not finite, no step is taken and the parameters are unchanged.
    fn backward_step_once(&mut self, loss: &Tensor) -> Result<f64, OptimizerStepError> {
        let loss_value = loss.double_value(&[]);
        if !loss_value.is_finite() {
            return Err(OptimizerStepError::NaNLoss);
        }
        self.zero_grad();
        loss.backward();
        self.step_once()?;
        Ok(loss_value)
    }
}

/// Optimizer that applies externally computed gradients.
pub trait GradientOptimizer {
    /// Update the parameters with one gradient per parameter, in parameter order.
    fn apply_gradients(&mut self, gradients: &[Tensor]) -> Result<(), OptimizerStepError>;
}

/// Error performing an optimization step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizerStepError {
    #[error("loss is NaN")]
    NaNLoss,
    #[error("torch optimizer step failed: {0}")]
    Torch(String),
    #[error("expected {expected} gradients, got {actual}")]
    GradientCount { expected: usize, actual: usize },
    #[error("gradient {index} has shape {actual:?}, expected {expected:?}")]
    GradientShape {
        index: usize,
        expected: Vec<i64>,
        actual: Vec<i64>,
    },
}

/// Build an optimizer
pub trait BuildOptimizer {
    type Optimizer;
    type Error;

    /// Build an optimizer for the given trainable variables.
    fn build_optimizer(&self, variables: Vec<Tensor>) -> Result<Self::Optimizer, Self::Error>;
}
