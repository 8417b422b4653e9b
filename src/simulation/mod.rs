//! Running agents in environments
mod episode;
mod history;
mod stop;
mod train;

pub use episode::{run_episode, EpisodeOutcome};
pub use history::EpisodeHistory;
pub use stop::{ScoreGoal, StopCondition, StopReason};
pub use train::{train_serial, TrainConfig, TrainError, TrainSummary};

pub(crate) use train::{update_or_skip, ProgressTracker};
