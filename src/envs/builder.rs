use super::{
    CartPole, DeterministicChain, DynEnv, EnvWithState, EnvironmentParams, MountainCar,
    MountainCarConfig, PhysicalConstants, StepLimit,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment configuration.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnvConfig {
    CartPole {
        #[serde(default)]
        physics: PhysicalConstants,
        #[serde(default)]
        params: EnvironmentParams,
    },
    MountainCar(MountainCarConfig),
    Chain(DeterministicChain),
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::CartPole {
            physics: PhysicalConstants::default(),
            params: EnvironmentParams::default(),
        }
    }
}

impl EnvConfig {
    /// Default MountainCar configuration.
    pub fn mountain_car() -> Self {
        Self::MountainCar(MountainCarConfig::default())
    }

    /// Short environment name used in run names.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CartPole { .. } => "cartpole",
            Self::MountainCar(_) => "mountaincar",
            Self::Chain(_) => "chain",
        }
    }

    /// Build a stateful environment instance.
    ///
    /// # Args
    /// * `max_steps_per_episode` - Episodes are cut off after this many steps.
    /// * `seed` - Seed for the environment dynamics and initial states.
    pub fn build_env(&self, max_steps_per_episode: u64, seed: u64) -> Result<DynEnv, BuildEnvError> {
        if max_steps_per_episode == 0 {
            return Err(BuildEnvError::ZeroStepLimit);
        }
        let env: DynEnv = match *self {
            Self::CartPole { physics, params } => {
                check_discount(params.discount_factor)?;
                Box::new(EnvWithState::new(
                    StepLimit::new(CartPole::new(physics, params), max_steps_per_episode),
                    seed,
                ))
            }
            Self::MountainCar(config) => {
                check_discount(config.discount_factor)?;
                let (low, high) = config.initial_position;
                if !(low <= high) {
                    return Err(BuildEnvError::InvalidInitialRange(low, high));
                }
                Box::new(EnvWithState::new(
                    StepLimit::new(MountainCar::new(config), max_steps_per_episode),
                    seed,
                ))
            }
            Self::Chain(chain) => {
                check_discount(chain.discount_factor)?;
                Box::new(EnvWithState::new(
                    StepLimit::new(chain, max_steps_per_episode),
                    seed,
                ))
            }
        };
        Ok(env)
    }
}

fn check_discount(discount_factor: f64) -> Result<(), BuildEnvError> {
    if (0.0..=1.0).contains(&discount_factor) {
        Ok(())
    } else {
        Err(BuildEnvError::InvalidDiscountFactor(discount_factor))
    }
}

/// Error building an environment
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildEnvError {
    #[error("the episode step limit must be positive")]
    ZeroStepLimit,
    #[error("discount factor {0} is not in [0, 1]")]
    InvalidDiscountFactor(f64),
    #[error("initial position range [{0}, {1}] is empty")]
    InvalidInitialRange(f64, f64),
}
