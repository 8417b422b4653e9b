//! Linear layer
use super::FeedForwardModule;
use crate::torch::initializers::Initializer;
use serde::{Deserialize, Serialize};
use tch::{nn::Path, Tensor};

/// Configuration for the [`Linear`] module.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    /// Initializer for the kernel (weight) matrix.
    pub kernel_init: Initializer,
    /// Initializer for the bias vector, if one exists.
    pub bias_init: Option<Initializer>,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            kernel_init: Initializer::Normal(0.3),
            bias_init: Some(Initializer::Constant(0.1)),
        }
    }
}

impl LinearConfig {
    pub fn build_module(&self, vs: &Path, in_dim: usize, out_dim: usize) -> Linear {
        Linear::new(vs, in_dim, out_dim, self)
    }
}

/// Linear fully-connected layer module.
#[derive(Debug, PartialEq)]
pub struct Linear {
    kernel: Tensor,
    bias: Option<Tensor>,
}

impl Linear {
    pub fn new(vs: &Path, in_dim: usize, out_dim: usize, config: &LinearConfig) -> Self {
        Self {
            kernel: config
                .kernel_init
                .add_tensor(vs, "kernel", &[out_dim, in_dim]),
            bias: config
                .bias_init
                .map(|init| init.add_tensor(vs, "bias", &[out_dim])),
        }
    }
}

impl FeedForwardModule for Linear {
    #[inline]
    fn forward(&self, input: &Tensor) -> Tensor {
        input.linear(&self.kernel, self.bias.as_ref())
    }

    fn trainable_variables(&self) -> Vec<&Tensor> {
        std::iter::once(&self.kernel).chain(self.bias.iter()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tch::{nn::VarStore, Device, Kind};

    #[fixture]
    fn default_module() -> (VarStore, Linear) {
        let vs = VarStore::new(Device::Cpu);
        let module = LinearConfig::default().build_module(&vs.root(), 3, 2);
        (vs, module)
    }

    #[rstest]
    fn forward_batch(default_module: (VarStore, Linear)) {
        let (_vs, module) = default_module;
        let input = Tensor::ones(&[4, 3], (Kind::Float, Device::Cpu));
        assert_eq!(module.forward(&input).size(), [4, 2]);
    }

    #[rstest]
    fn variables(default_module: (VarStore, Linear)) {
        let (vs, module) = default_module;
        let vars = module.trainable_variables();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0].size(), [2, 3]);
        assert_eq!(vars[1].size(), [2]);
        assert_eq!(vs.trainable_variables().len(), 2);
    }

    #[test]
    fn config_from_json() {
        let config: LinearConfig =
            serde_json::from_str(r#"{"kernel_init": "Zeros", "bias_init": {"Constant": 2.0}}"#)
                .unwrap();
        let vs = VarStore::new(Device::Cpu);
        let module = config.build_module(&vs.root(), 3, 2);
        let input = Tensor::ones(&[1, 3], (Kind::Float, Device::Cpu));
        assert_eq!(
            module.forward(&input),
            Tensor::full(&[1, 2], 2.0, (Kind::Float, Device::Cpu))
        );
    }

    #[test]
    fn no_bias() {
        let vs = VarStore::new(Device::Cpu);
        let config = LinearConfig {
            bias_init: None,
            ..LinearConfig::default()
        };
        let module = config.build_module(&vs.root(), 3, 2);
        assert_eq!(module.trainable_variables().len(), 1);
        let zeros = Tensor::zeros(&[1, 3], (Kind::Float, Device::Cpu));
        assert_eq!(
            module.forward(&zeros),
            Tensor::zeros(&[1, 2], (Kind::Float, Device::Cpu))
        );
    }
}
