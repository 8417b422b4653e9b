//! Multi-layer perceptron
use super::{Activation, FeedForwardModule, Linear, LinearConfig};
use serde::{Deserialize, Serialize};
use std::iter;
use tch::{nn::Path, Tensor};

/// Configuration for the [`Mlp`] module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlpConfig {
    /// Sizes of the hidden layers
    pub hidden_sizes: Vec<usize>,
    /// Activation function between hidden layers.
    pub activation: Activation,
    /// Activation function on the output.
    pub output_activation: Activation,
    /// Configuration for the linear layers
    pub linear_config: LinearConfig,
}

impl Default for MlpConfig {
    fn default() -> Self {
        Self {
            hidden_sizes: vec![64, 64],
            activation: Activation::Tanh,
            output_activation: Activation::Identity,
            linear_config: LinearConfig::default(),
        }
    }
}

impl MlpConfig {
    pub fn build_module(&self, vs: &Path, in_dim: usize, out_dim: usize) -> Mlp {
        Mlp::new(vs, in_dim, out_dim, self)
    }
}

/// Multi-layer perceptron
pub struct Mlp {
    layers: Vec<Linear>,
    activation: Option<fn(&Tensor) -> Tensor>,
    output_activation: Option<fn(&Tensor) -> Tensor>,
}

impl Mlp {
    pub fn new(vs: &Path, in_dim: usize, out_dim: usize, config: &MlpConfig) -> Self {
        let in_dims = iter::once(&in_dim).chain(&config.hidden_sizes);
        let out_dims = config.hidden_sizes.iter().chain(iter::once(&out_dim));

        let layers: Vec<_> = in_dims
            .zip(out_dims)
            .enumerate()
            .map(|(i, (in_, out_))| {
                config
                    .linear_config
                    .build_module(&(vs / format!("layer_{}", i)), *in_, *out_)
            })
            .collect();

        Self {
            layers,
            activation: config.activation.maybe_function(),
            output_activation: config.output_activation.maybe_function(),
        }
    }
}

impl FeedForwardModule for Mlp {
    fn forward(&self, input: &Tensor) -> Tensor {
        let mut iter_layers = self.layers.iter();
        let mut hidden = iter_layers
            .next()
            .expect("must have >= 1 layers by construction")
            .forward(input);
        for layer in iter_layers {
            if let Some(activation) = self.activation {
                hidden = activation(&hidden);
            }
            hidden = layer.forward(&hidden);
        }
        if let Some(output_activation) = self.output_activation {
            hidden = output_activation(&hidden);
        }
        hidden
    }

    fn trainable_variables(&self) -> Vec<&Tensor> {
        self.layers
            .iter()
            .flat_map(Linear::trainable_variables)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torch::utils::zero_grad;
    use rstest::{fixture, rstest};
    use tch::{nn::VarStore, Device, Kind};

    #[fixture]
    fn default_module() -> (VarStore, Mlp) {
        let vs = VarStore::new(Device::Cpu);
        let module = MlpConfig::default().build_module(&vs.root(), 3, 2);
        (vs, module)
    }

    #[rstest]
    fn forward_batch(default_module: (VarStore, Mlp)) {
        let (_vs, mlp) = default_module;
        let input = Tensor::ones(&[4, 3], (Kind::Float, Device::Cpu));
        assert_eq!(mlp.forward(&input).size(), [4, 2]);
    }

    #[rstest]
    fn layer_variables(default_module: (VarStore, Mlp)) {
        let (vs, mlp) = default_module;
        let shapes: Vec<_> = mlp.trainable_variables().iter().map(|t| t.size()).collect();
        assert_eq!(
            shapes,
            vec![
                vec![64, 3],
                vec![64],
                vec![64, 64],
                vec![64],
                vec![2, 64],
                vec![2]
            ]
        );
        assert_eq!(vs.trainable_variables().len(), 6);
    }

    #[test]
    fn no_hidden_layers_is_linear() {
        let vs = VarStore::new(Device::Cpu);
        let config = MlpConfig {
            hidden_sizes: vec![],
            ..MlpConfig::default()
        };
        let mlp = config.build_module(&vs.root(), 3, 2);
        assert_eq!(mlp.trainable_variables().len(), 2);
    }

    #[test]
    fn forward_gradient_descent() {
        let vs = VarStore::new(Device::Cpu);
        let mlp = MlpConfig::default().build_module(&vs.root(), 3, 1);
        let input = Tensor::of_slice(&[1.0_f32, -1.0, 0.5]).reshape(&[1, 3]);
        let target = Tensor::of_slice(&[2.0_f32]).reshape(&[1, 1]);
        let loss_fn = || (mlp.forward(&input) - &target).square().sum(Kind::Float);
        let initial = loss_fn().double_value(&[]);
        for _ in 0..20 {
            let loss = loss_fn();
            for var in mlp.trainable_variables() {
                zero_grad(var);
            }
            loss.backward();
            tch::no_grad(|| {
                for var in mlp.trainable_variables() {
                    let updated = var - var.grad() * 0.01;
                    var.shallow_clone().copy_(&updated);
                }
            });
        }
        assert!(loss_fn().double_value(&[]) < initial);
    }
}
