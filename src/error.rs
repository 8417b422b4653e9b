//! Error type
use crate::agents::BuildAgentError;
use crate::checkpoint::CheckpointError;
use crate::config::ConfigError;
use crate::envs::BuildEnvError;
use crate::plot::PlotError;
use crate::simulation::TrainError;
use thiserror::Error;

/// Error from a training run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("error building environment: {0}")]
    BuildEnv(#[from] BuildEnvError),
    #[error("error building agent: {0}")]
    BuildAgent(#[from] BuildAgentError),
    #[error("training failed: {0}")]
    Train(#[from] TrainError),
    #[error("error saving checkpoint: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("error writing plot: {0}")]
    Plot(#[from] PlotError),
}
