//! Sampling actions from a categorical policy
use rand::distributions::{Distribution, WeightedError, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Samples an action index from a vector of action probabilities.
///
/// Probabilities are clipped into `[floor, 1]` before sampling so that a policy that has
/// collapsed onto one action still has a non-zero chance of exploring the others.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSampler {
    pub floor: f64,
}

impl Default for ActionSampler {
    fn default() -> Self {
        Self { floor: 1e-10 }
    }
}

impl ActionSampler {
    pub const fn new(floor: f64) -> Self {
        Self { floor }
    }

    /// Sample an index with probability proportional to the clipped probabilities.
    ///
    /// # Errors
    /// If `probabilities` is empty or contains `NaN`.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        probabilities: &[f64],
        rng: &mut R,
    ) -> Result<usize, SampleError> {
        if let Some(index) = probabilities.iter().position(|p| p.is_nan()) {
            return Err(SampleError::NaNProbability { index });
        }
        let weights = probabilities.iter().map(|p| p.clamp(self.floor, 1.0));
        let distribution = WeightedIndex::new(weights)?;
        Ok(distribution.sample(rng))
    }
}

/// Error sampling an action.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
pub enum SampleError {
    #[error("action probability {index} is NaN")]
    NaNProbability { index: usize },
    #[error("invalid action weights: {0}")]
    InvalidWeights(#[from] WeightedError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Prng;
    use rand::SeedableRng;
    use rstest::rstest;

    #[rstest]
    #[case(&[0.9, 0.1])]
    #[case(&[0.1, 0.6, 0.3])]
    #[case(&[0.5, 0.5])]
    #[case(&[0.25, 0.25, 0.25, 0.25])]
    fn empirical_frequencies(#[case] probabilities: &[f64]) {
        let sampler = ActionSampler::default();
        let mut rng = Prng::seed_from_u64(1);
        let mut counts = vec![0_usize; probabilities.len()];
        let num_samples = 10_000;
        for _ in 0..num_samples {
            counts[sampler.sample(probabilities, &mut rng).unwrap()] += 1;
        }
        for (count, p) in counts.into_iter().zip(probabilities) {
            let freq = count as f64 / num_samples as f64;
            assert!((freq - p).abs() < 0.015, "freq {} vs p {}", freq, p);
        }
    }

    #[test]
    fn degenerate_policy_still_valid() {
        let sampler = ActionSampler::default();
        let mut rng = Prng::seed_from_u64(2);
        for _ in 0..100 {
            assert_eq!(sampler.sample(&[1.0, 0.0], &mut rng).unwrap(), 0);
        }
    }

    #[test]
    fn floor_allows_exploration() {
        let sampler = ActionSampler::new(0.5);
        let mut rng = Prng::seed_from_u64(3);
        let ones = (0..1000)
            .filter(|_| sampler.sample(&[1.0, 0.0], &mut rng).unwrap() == 1)
            .count();
        assert!(ones > 250 && ones < 420, "{}", ones);
    }

    #[test]
    fn nan_is_error() {
        let mut rng = Prng::seed_from_u64(4);
        assert_eq!(
            ActionSampler::default().sample(&[0.5, f64::NAN], &mut rng),
            Err(SampleError::NaNProbability { index: 1 })
        );
    }

    #[test]
    fn empty_is_error() {
        let mut rng = Prng::seed_from_u64(5);
        assert_eq!(
            ActionSampler::default().sample(&[], &mut rng),
            Err(SampleError::InvalidWeights(WeightedError::NoItem))
        );
    }
}
