//! Activation functions
use clap::ArgEnum;
use serde::{Deserialize, Serialize};
use tch::Tensor;

/// Activation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ArgEnum, Serialize, Deserialize)]
pub enum Activation {
    /// No transformation
    Identity,
    /// Rectified linear
    Relu,
    /// Sigmoid function
    Sigmoid,
    /// Hyperbolic tangent
    Tanh,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Tanh
    }
}

impl Activation {
    /// Create a function pointer for this activation function.
    ///
    /// Returns `None` for the identity function.
    pub fn maybe_function(self) -> Option<fn(&Tensor) -> Tensor> {
        match self {
            Self::Identity => None,
            Self::Relu => Some(Tensor::relu),
            Self::Sigmoid => Some(Tensor::sigmoid),
            Self::Tanh => Some(Tensor::tanh),
        }
    }
}
