//! Discounted return calculation
use crate::utils::stats::OnlineMeanVariance;
use serde::{Deserialize, Serialize};

/// Discounted reward-to-go for each step of an episode.
///
/// `G[t] = r[t] + discount_factor * G[t+1]` with `G[T] = 0`.
pub fn discounted_returns(rewards: &[f64], discount_factor: f64) -> Vec<f64> {
    let mut returns = vec![0.0; rewards.len()];
    let mut running = 0.0;
    for (ret, reward) in returns.iter_mut().zip(rewards).rev() {
        running = reward + discount_factor * running;
        *ret = running;
    }
    returns
}

/// How a sequence of returns was normalized.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Normalization {
    /// Shifted to zero mean and scaled to unit (population) standard deviation.
    Standardized,
    /// Only shifted to zero mean; the standard deviation was too small to divide by.
    Centered,
    /// There were no values.
    Empty,
}

/// Normalize values in place to zero mean and unit population standard deviation.
///
/// If the standard deviation is below `min_std` (or not finite) the values are only centered.
/// A single value therefore normalizes to `0`.
pub fn normalize_returns(values: &mut [f64], min_std: f64) -> Normalization {
    if values.is_empty() {
        return Normalization::Empty;
    }
    let stats: OnlineMeanVariance<f64> = values.iter().copied().collect();
    let mean = stats.mean();
    let std = stats.stddev();
    if std.is_finite() && std >= min_std {
        for v in values {
            *v = (*v - mean) / std;
        }
        Normalization::Standardized
    } else {
        for v in values {
            *v -= mean;
        }
        Normalization::Centered
    }
}

/// Return calculation configuration.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReturnsConfig {
    /// Reward discount factor in `[0, 1]`.
    pub discount_factor: f64,
    /// Whether to normalize the returns of each episode.
    pub normalize: bool,
    /// Smallest standard deviation that is divided by when normalizing.
    pub min_std: f64,
}

impl Default for ReturnsConfig {
    fn default() -> Self {
        Self {
            discount_factor: 0.99,
            normalize: true,
            min_std: 1e-8,
        }
    }
}

impl ReturnsConfig {
    /// Learning targets for each step of an episode with the given rewards.
    pub fn compute(&self, rewards: &[f64]) -> Vec<f64> {
        let mut returns = discounted_returns(rewards, self.discount_factor);
        if self.normalize {
            let normalization = normalize_returns(&mut returns, self.min_std);
            if normalization == Normalization::Centered && returns.len() > 1 {
                log::debug!("episode returns have ~zero variance; centering only");
            }
        }
        returns
    }
}
