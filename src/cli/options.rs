//! Command-line options
use super::{Update, WithUpdate};
use crate::agents::{AgentConfig, Algorithm};
use crate::config::{ConfigError, Preset, RunConfig};
use crate::simulation::TrainConfig;
use crate::torch::Activation;
use clap::{ArgEnum, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, PartialEq)]
#[clap(
    name = "rlcontrol",
    version,
    author,
    about = "Policy gradient training on classic control environments",
    after_help = "Settings are taken from the preset (or --env and --algorithm) or from --config, \
                  then overridden by any other options."
)]
pub struct Options {
    /// Training script configuration to start from
    #[clap(short, long, arg_enum, conflicts_with_all = &["env", "config"])]
    pub preset: Option<Preset>,

    /// JSON run configuration to start from
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Environment; uses that environment's training settings
    #[clap(short, long, arg_enum)]
    pub env: Option<EnvName>,

    /// Learning algorithm
    #[clap(short, long, arg_enum)]
    pub algorithm: Option<Algorithm>,

    // Agent options
    /// Adam learning rate
    #[clap(long, help_heading = "AGENT OPTIONS")]
    pub learning_rate: Option<f64>,

    /// Discount factor of the returns
    #[clap(long, help_heading = "AGENT OPTIONS")]
    pub discount_factor: Option<f64>,

    /// Hidden layer sizes of the actor and critic networks
    #[clap(long, use_value_delimiter = true, help_heading = "AGENT OPTIONS")]
    pub hidden_sizes: Option<Vec<usize>>,

    /// Activation function between hidden layers
    #[clap(long, arg_enum, help_heading = "AGENT OPTIONS")]
    pub activation: Option<Activation>,

    /// Weight of the entropy bonus in the actor-critic loss
    #[clap(long, help_heading = "AGENT OPTIONS")]
    pub entropy_coef: Option<f64>,

    /// Number of asynchronous workers; 0 uses one per CPU
    #[clap(long, help_heading = "AGENT OPTIONS")]
    pub workers: Option<usize>,

    // Training options
    /// Wall-clock training budget in seconds
    #[clap(long, help_heading = "TRAINING OPTIONS")]
    pub time_limit: Option<u64>,

    /// Episodes are cut off after this many steps
    #[clap(long, help_heading = "TRAINING OPTIONS")]
    pub max_steps_per_episode: Option<u64>,

    /// Stop after this many episodes (per worker for A3C)
    #[clap(long, help_heading = "TRAINING OPTIONS")]
    pub max_episodes: Option<u64>,

    /// Random seed for the environments and action sampling
    #[clap(long, help_heading = "TRAINING OPTIONS")]
    pub seed: Option<u64>,

    /// Ignore any saved checkpoint and start from fresh parameters
    #[clap(long, help_heading = "TRAINING OPTIONS")]
    pub fresh: bool,

    // Output options
    /// Checkpoint directory
    #[clap(long, help_heading = "OUTPUT OPTIONS")]
    pub save_dir: Option<PathBuf>,

    /// Plot directory
    #[clap(long, help_heading = "OUTPUT OPTIONS")]
    pub graph_dir: Option<PathBuf>,

    /// Run name used for checkpoint and plot file names
    #[clap(long, help_heading = "OUTPUT OPTIONS")]
    pub run_name: Option<String>,
}

/// Environment name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ArgEnum)]
pub enum EnvName {
    Cartpole,
    Mountaincar,
}

impl EnvName {
    /// The preset for training `algorithm` on this environment.
    pub const fn preset(self, algorithm: Algorithm) -> Preset {
        match (self, algorithm) {
            (Self::Cartpole, Algorithm::Reinforce) => Preset::CartpoleReinforce,
            (Self::Cartpole, _) => Preset::CartpoleA2c,
            (Self::Mountaincar, Algorithm::Reinforce) => Preset::MountaincarReinforce,
            (Self::Mountaincar, Algorithm::A2c) => Preset::MountaincarA2c,
            (Self::Mountaincar, Algorithm::A3c) => Preset::MountaincarA3c,
        }
    }
}

impl Options {
    /// Build the run configuration described by these options.
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let base = if let Some(path) = &self.config {
            RunConfig::from_json_file(path)?
        } else if let Some(env) = self.env {
            env.preset(self.algorithm.unwrap_or_default()).config()
        } else {
            self.preset.unwrap_or_default().config()
        };
        let config = base.with_update(self);
        config.validate()?;
        Ok(config)
    }
}

impl Update<&Options> for RunConfig {
    fn update(&mut self, opts: &Options) {
        self.agent.update(opts);
        self.train.update(opts);
        if let Some(workers) = opts.workers {
            self.a3c.num_workers = workers;
        }
        if let Some(save_dir) = &opts.save_dir {
            self.save_dir = save_dir.clone();
        }
        if let Some(graph_dir) = &opts.graph_dir {
            self.graph_dir = graph_dir.clone();
        }
        if let Some(run_name) = &opts.run_name {
            self.run_name = Some(run_name.clone());
        }
    }
}

impl Update<&Options> for AgentConfig {
    fn update(&mut self, opts: &Options) {
        if let Some(algorithm) = opts.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(learning_rate) = opts.learning_rate {
            self.optimizer.learning_rate = learning_rate;
        }
        if let Some(discount_factor) = opts.discount_factor {
            self.returns.discount_factor = discount_factor;
        }
        if let Some(hidden_sizes) = &opts.hidden_sizes {
            self.model.hidden_sizes = hidden_sizes.clone();
        }
        if let Some(activation) = opts.activation {
            self.model.activation = activation;
        }
        if let Some(entropy_coef) = opts.entropy_coef {
            self.loss.entropy_coef = entropy_coef;
        }
    }
}

impl Update<&Options> for TrainConfig {
    fn update(&mut self, opts: &Options) {
        if let Some(time_limit) = opts.time_limit {
            self.stop.time_limit_secs = time_limit;
        }
        if let Some(max_steps) = opts.max_steps_per_episode {
            self.max_steps_per_episode = max_steps;
        }
        if let Some(max_episodes) = opts.max_episodes {
            self.stop.max_episodes = Some(max_episodes);
        }
        if let Some(seed) = opts.seed {
            self.seed = seed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::ScoreGoal;
    use clap::IntoApp;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> Options {
        Options::try_parse_from(std::iter::once("rlcontrol").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn verify_app() {
        Options::command().debug_assert();
    }

    #[test]
    fn default_is_cartpole_a2c() {
        let config = parse(&[]).run_config().unwrap();
        assert_eq!(config, Preset::CartpoleA2c.config());
        assert_eq!(config.run_name(), "cartpole-a2c");
    }

    #[test]
    fn preset_mountaincar_a3c() {
        let config = parse(&["--preset", "mountaincar-a3c"]).run_config().unwrap();
        assert_eq!(config, Preset::MountaincarA3c.config());
    }

    #[rstest]
    #[case("cartpole", "reinforce", Preset::CartpoleReinforce)]
    #[case("mountaincar", "a2c", Preset::MountaincarA2c)]
    #[case("mountaincar", "a3c", Preset::MountaincarA3c)]
    fn env_and_algorithm(#[case] env: &str, #[case] algorithm: &str, #[case] preset: Preset) {
        let config = parse(&["--env", env, "--algorithm", algorithm])
            .run_config()
            .unwrap();
        assert_eq!(config, preset.config());
    }

    #[test]
    fn cartpole_a3c_uses_cartpole_settings() {
        let config = parse(&["--env", "cartpole", "--algorithm", "a3c"])
            .run_config()
            .unwrap();
        assert_eq!(config.agent.algorithm, Algorithm::A3c);
        assert_eq!(config.train.stop.goal, Some(ScoreGoal::AtLeast(490.0)));
        assert_eq!(config.run_name(), "cartpole-a3c");
    }

    #[test]
    fn overrides() {
        let config = parse(&[
            "--preset",
            "mountaincar-a2c",
            "--learning-rate",
            "0.01",
            "--hidden-sizes",
            "32,16",
            "--workers",
            "2",
            "--time-limit",
            "60",
            "--max-episodes",
            "10",
            "--seed",
            "4",
            "--save-dir",
            "/tmp/ckpt",
            "--run-name",
            "short",
        ])
        .run_config()
        .unwrap();
        assert_eq!(config.agent.optimizer.learning_rate, 0.01);
        assert_eq!(config.agent.model.hidden_sizes, vec![32, 16]);
        assert_eq!(config.a3c.num_workers, 2);
        assert_eq!(config.train.stop.time_limit_secs, 60);
        assert_eq!(config.train.stop.max_episodes, Some(10));
        assert_eq!(config.train.seed, 4);
        assert_eq!(config.save_dir, PathBuf::from("/tmp/ckpt"));
        assert_eq!(config.run_name(), "short");
        // Unchanged settings come from the preset
        assert_eq!(config.train.max_steps_per_episode, 10_000);
    }

    #[test]
    fn config_file_with_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"agent": {{"algorithm": "Reinforce"}}}}"#).unwrap();
        let path = file.path().to_str().unwrap();
        let config = parse(&["--config", path, "--seed", "9"]).run_config().unwrap();
        assert_eq!(config.agent.algorithm, Algorithm::Reinforce);
        assert_eq!(config.train.seed, 9);
    }

    #[test]
    fn invalid_override_is_error() {
        let result = parse(&["--learning-rate=-1"]).run_config();
        assert!(matches!(result, Err(ConfigError::LearningRate(_))));
    }

    #[test]
    fn preset_conflicts_with_env() {
        let result = Options::try_parse_from([
            "rlcontrol",
            "--preset",
            "cartpole-a2c",
            "--env",
            "mountaincar",
        ]);
        assert!(result.is_err());
    }
}
