//! Neural network modules
mod activation;
mod linear;
mod mlp;

pub use activation::Activation;
pub use linear::{Linear, LinearConfig};
pub use mlp::{Mlp, MlpConfig};

use tch::Tensor;

/// A feed-forward module mapping a batch of input vectors to a batch of output vectors.
pub trait FeedForwardModule {
    /// Apply the module to a tensor of shape `[..., in_dim]`, producing `[..., out_dim]`.
    fn forward(&self, input: &Tensor) -> Tensor;

    /// Trainable variables of the module in a fixed, architecture-determined order.
    fn trainable_variables(&self) -> Vec<&Tensor>;
}
