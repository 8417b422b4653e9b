//! REINFORCE and actor-critic training for classic control environments.
#![warn(clippy::cast_lossless)]
#![warn(clippy::cast_possible_truncation)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::missing_const_for_fn)] // has some false positives
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::redundant_closure_for_method_calls)]
#![warn(clippy::use_self)] // also triggered by macro expansions
pub mod agents;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod envs;
mod error;
pub mod logging;
pub mod plot;
mod runner;
pub mod simulation;
pub mod torch;
pub mod utils;

pub use agents::{Agent, AgentConfig, Algorithm};
pub use checkpoint::{Checkpointer, Counters};
pub use config::RunConfig;
pub use envs::{EnvStructure, Environment, StatefulEnvironment};
pub use error::RunError;
pub use runner::run;
pub use simulation::{train_serial, ScoreGoal, StopCondition, TrainConfig, TrainSummary};

/// Pseudo-random number generator type used by agents and environments.
pub type Prng = rand_chacha::ChaCha8Rng;
