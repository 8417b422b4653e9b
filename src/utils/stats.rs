//! Running statistics
use num_traits::{Float, Zero};
use std::collections::VecDeque;
use std::iter::{Extend, FromIterator};

/// Online mean and variance calculation using Welford's Algorithm
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct OnlineMeanVariance<T> {
    mean: T,
    squared_residual_sum: T,
    count: u64,
}

impl<T: Zero> Default for OnlineMeanVariance<T> {
    fn default() -> Self {
        Self {
            mean: T::zero(),
            squared_residual_sum: T::zero(),
            count: 0,
        }
    }
}

impl<T: Copy> OnlineMeanVariance<T> {
    /// The mean of all accumulated values.
    pub fn mean(&self) -> T {
        self.mean
    }

    /// The number of accumulated values.
    pub const fn count(&self) -> u64 {
        self.count
    }
}

impl<T: Float> OnlineMeanVariance<T> {
    /// The (population) variance of all accumulated values.
    ///
    /// `NaN` if no values have been accumulated.
    pub fn variance(&self) -> T {
        self.squared_residual_sum / self.count_as()
    }

    /// The (population) standard deviation of all accumulated values.
    pub fn stddev(&self) -> T {
        self.variance().sqrt()
    }

    fn count_as(&self) -> T {
        T::from(self.count).unwrap_or_else(T::nan)
    }

    /// Add a new value to the calculation.
    pub fn push(&mut self, value: T) {
        let residual_pre = value - self.mean;
        self.count += 1;
        self.mean = self.mean + residual_pre / self.count_as();
        let residual_post = value - self.mean;
        self.squared_residual_sum = self.squared_residual_sum + residual_pre * residual_post;
    }
}

impl<T: Float> Extend<T> for OnlineMeanVariance<T> {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        for value in iter {
            self.push(value)
        }
    }
}

impl<T: Float> FromIterator<T> for OnlineMeanVariance<T> {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let mut s = Self::default();
        s.extend(iter);
        s
    }
}

/// Mean of the most recent `window` values.
#[derive(Debug, Clone, PartialEq)]
pub struct RollingMean {
    values: VecDeque<f64>,
    window: usize,
}

impl RollingMean {
    /// Create a rolling mean over at most `window` values.
    ///
    /// # Panics
    /// If `window` is zero.
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "rolling window must be non-empty");
        Self {
            values: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Add a value, evicting the oldest one if the window is full.
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.window {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    /// Mean of the values in the window. `None` if no values have been pushed.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
        }
    }

    /// Number of values currently in the window.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_f64() {
        let stats: OnlineMeanVariance<f64> = [1.0, 2.0, 3.0, 4.0].into_iter().collect();
        assert!((stats.mean() - 2.5).abs() < 1e-8);
        assert!((stats.variance() - 1.25).abs() < 1e-8);
        assert_eq!(stats.count(), 4);
    }

    #[test]
    fn rolling_mean_window() {
        let mut rolling = RollingMean::new(3);
        assert_eq!(rolling.mean(), None);
        rolling.push(1.0);
        assert_eq!(rolling.mean(), Some(1.0));
        for value in [2.0, 3.0, 10.0] {
            rolling.push(value);
        }
        // Window holds [2, 3, 10]
        assert_eq!(rolling.len(), 3);
        assert_eq!(rolling.mean(), Some(5.0));
    }
}
