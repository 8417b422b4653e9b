//! Run configuration
use crate::agents::a3c::A3cConfig;
use crate::agents::{AgentConfig, Algorithm};
use crate::envs::{EnvConfig, EnvironmentParams, MountainCarConfig, PhysicalConstants};
use crate::simulation::{ScoreGoal, StopCondition, TrainConfig};
use clap::ArgEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Complete configuration of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub env: EnvConfig,
    pub agent: AgentConfig,
    pub train: TrainConfig,
    pub a3c: A3cConfig,
    /// Checkpoints are stored in `<save_dir>/<run_name>/`.
    pub save_dir: PathBuf,
    /// Score plots are written to `<graph_dir>/<run_name>.svg`.
    pub graph_dir: PathBuf,
    /// Name of the run. Defaults to `<env>-<algorithm>`.
    pub run_name: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Preset::default().config()
    }
}

impl RunConfig {
    /// Name of the run, used for checkpoint and plot locations.
    pub fn run_name(&self) -> String {
        self.run_name
            .clone()
            .unwrap_or_else(|| format!("{}-{}", self.env.name(), self.agent.algorithm))
    }

    /// Load a configuration from a JSON file.
    ///
    /// Fields missing from the file take their default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration describes a runnable training run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let agent = &self.agent;
        if !(agent.optimizer.learning_rate > 0.0) {
            return Err(ConfigError::LearningRate(agent.optimizer.learning_rate));
        }
        if !(0.0..=1.0).contains(&agent.returns.discount_factor) {
            return Err(ConfigError::DiscountFactor(agent.returns.discount_factor));
        }
        if agent.model.hidden_sizes.contains(&0) {
            return Err(ConfigError::EmptyLayer);
        }
        if self.train.max_steps_per_episode == 0 {
            return Err(ConfigError::ZeroStepLimit);
        }
        if self.train.stop.window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if let Some(name) = &self.run_name {
            if name.is_empty() || name.contains(|c: char| c == '/' || c == '\\') {
                return Err(ConfigError::RunName(name.clone()));
            }
        }
        Ok(())
    }
}

/// Configurations reproducing the original training scripts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, ArgEnum)]
pub enum Preset {
    CartpoleReinforce,
    CartpoleA2c,
    MountaincarReinforce,
    MountaincarA2c,
    MountaincarA3c,
}

impl Default for Preset {
    fn default() -> Self {
        Self::CartpoleA2c
    }
}

impl Preset {
    pub fn config(self) -> RunConfig {
        let (env, train) = match self {
            Self::CartpoleReinforce | Self::CartpoleA2c => (
                EnvConfig::CartPole {
                    physics: PhysicalConstants::default(),
                    params: EnvironmentParams::default(),
                },
                train_config(500, 5 * 60, ScoreGoal::AtLeast(490.0)),
            ),
            Self::MountaincarReinforce | Self::MountaincarA2c => (
                EnvConfig::mountain_car(),
                train_config(10_000, 40 * 60, ScoreGoal::AtMost(200.0)),
            ),
            Self::MountaincarA3c => (
                EnvConfig::MountainCar(MountainCarConfig {
                    discount_factor: 0.9,
                    ..MountainCarConfig::default()
                }),
                train_config(15_000, 20 * 60, ScoreGoal::AtMost(200.0)),
            ),
        };

        let mut agent = AgentConfig {
            algorithm: self.algorithm(),
            ..AgentConfig::default()
        };
        if self == Self::MountaincarA3c {
            agent.model.hidden_sizes = vec![128, 128];
            agent.optimizer.learning_rate = 0.005;
            agent.returns.discount_factor = 0.9;
        }

        RunConfig {
            env,
            agent,
            train,
            a3c: A3cConfig::default(),
            save_dir: PathBuf::from("checkpoints"),
            graph_dir: PathBuf::from("graphs"),
            run_name: None,
        }
    }

    pub const fn algorithm(self) -> Algorithm {
        match self {
            Self::CartpoleReinforce | Self::MountaincarReinforce => Algorithm::Reinforce,
            Self::CartpoleA2c | Self::MountaincarA2c => Algorithm::A2c,
            Self::MountaincarA3c => Algorithm::A3c,
        }
    }
}

fn train_config(max_steps_per_episode: u64, time_limit_secs: u64, goal: ScoreGoal) -> TrainConfig {
    TrainConfig {
        max_steps_per_episode,
        stop: StopCondition {
            time_limit_secs,
            goal: Some(goal),
            window: 30,
            max_episodes: None,
        },
        seed: 0,
    }
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("learning rate must be positive, got {0}")]
    LearningRate(f64),
    #[error("discount factor {0} is not in [0, 1]")]
    DiscountFactor(f64),
    #[error("hidden layers must have at least one unit")]
    EmptyLayer,
    #[error("the episode step limit must be positive")]
    ZeroStepLimit,
    #[error("the score window must be positive")]
    ZeroWindow,
    #[error("invalid run name {0:?}")]
    RunName(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    #[case(Preset::CartpoleReinforce, "cartpole-reinforce")]
    #[case(Preset::CartpoleA2c, "cartpole-a2c")]
    #[case(Preset::MountaincarReinforce, "mountaincar-reinforce")]
    #[case(Preset::MountaincarA2c, "mountaincar-a2c")]
    #[case(Preset::MountaincarA3c, "mountaincar-a3c")]
    fn preset_run_names(#[case] preset: Preset, #[case] name: &str) {
        let config = preset.config();
        assert_eq!(config.run_name(), name);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn mountaincar_a3c_preset() {
        let config = Preset::MountaincarA3c.config();
        assert_eq!(config.a3c.num_workers, 6);
        assert_eq!(config.agent.model.hidden_sizes, vec![128, 128]);
        assert_eq!(config.agent.optimizer.learning_rate, 0.005);
        assert_eq!(config.agent.returns.discount_factor, 0.9);
        assert_eq!(config.train.max_steps_per_episode, 15_000);
        assert_eq!(config.train.stop.goal, Some(ScoreGoal::AtMost(200.0)));
    }

    #[test]
    fn cartpole_default() {
        let config = RunConfig::default();
        assert_eq!(config.agent.algorithm, Algorithm::A2c);
        assert_eq!(config.train.max_steps_per_episode, 500);
        assert_eq!(config.train.stop.time_limit_secs, 300);
        assert_eq!(config.train.stop.goal, Some(ScoreGoal::AtLeast(490.0)));
    }

    #[test]
    fn explicit_run_name() {
        let config = RunConfig {
            run_name: Some("trial-3".into()),
            ..RunConfig::default()
        };
        assert_eq!(config.run_name(), "trial-3");
    }

    #[test]
    fn json_round_trip() {
        let config = Preset::MountaincarA2c.config();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&config).unwrap().as_bytes())
            .unwrap();
        assert_eq!(RunConfig::from_json_file(file.path()).unwrap(), config);
    }

    #[test]
    fn partial_json_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"train": {{"seed": 7}}, "run_name": "seeded"}}"#).unwrap();
        let config = RunConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.train.seed, 7);
        assert_eq!(config.train.max_steps_per_episode, 500);
        assert_eq!(config.agent, AgentConfig::default());
        assert_eq!(config.run_name(), "seeded");
    }

    #[test]
    fn missing_file_is_error() {
        assert!(matches!(
            RunConfig::from_json_file("/nonexistent/config.json"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn malformed_json_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            RunConfig::from_json_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[rstest]
    #[case::learning_rate(|c: &mut RunConfig| c.agent.optimizer.learning_rate = 0.0)]
    #[case::discount(|c: &mut RunConfig| c.agent.returns.discount_factor = 1.5)]
    #[case::hidden(|c: &mut RunConfig| c.agent.model.hidden_sizes = vec![64, 0])]
    #[case::step_limit(|c: &mut RunConfig| c.train.max_steps_per_episode = 0)]
    #[case::window(|c: &mut RunConfig| c.train.stop.window = 0)]
    #[case::run_name(|c: &mut RunConfig| c.run_name = Some("a/b".into()))]
    fn invalid_config(#[case] modify: fn(&mut RunConfig)) {
        let mut config = RunConfig::default();
        modify(&mut config);
        assert!(config.validate().is_err());
    }
}
