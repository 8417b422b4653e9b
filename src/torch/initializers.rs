//! Tensor initializers
#![allow(clippy::use_self)] // false positive with serde derives
use serde::{Deserialize, Serialize};
use tch::{
    nn::{Init, Path},
    Tensor,
};

/// Tensor initializers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    /// Initialize to all zeros
    Zeros,
    /// Initialize all elements to the given constant value.
    Constant(f64),
    /// Zero-mean normal distribution with the given standard deviation.
    Normal(f64),
}

impl Initializer {
    /// Equivalent [`tch::nn::Init`].
    pub fn init(self) -> Init {
        match self {
            Self::Zeros => Init::Const(0.0),
            Self::Constant(v) => Init::Const(v),
            Self::Normal(stdev) => Init::Randn { mean: 0.0, stdev },
        }
    }

    /// Add a new trainable variable initialized by this initializer to a variable store path.
    pub fn add_tensor(self, vs: &Path, name: &str, shape: &[usize]) -> Tensor {
        let dims: Vec<i64> = shape.iter().map(|&d| d as i64).collect();
        vs.var(name, &dims, self.init())
    }
}
