//! Torch components
mod initializers;
mod model;
pub mod modules;
pub mod optimizers;
mod snapshot;
pub mod utils;

pub use initializers::Initializer;
pub use model::PolicyValueModel;
pub use modules::{Activation, MlpConfig};
pub use snapshot::{ParameterSnapshot, SnapshotError};
