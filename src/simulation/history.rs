//! Episode score history
use serde::{Deserialize, Serialize};

/// Score of every episode in a run, indexed by global episode number.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeHistory {
    episodes: Vec<u64>,
    scores: Vec<f64>,
}

impl EpisodeHistory {
    pub fn push(&mut self, episode: u64, score: f64) {
        self.episodes.push(episode);
        self.scores.push(score);
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Iterate over `(episode, score)` pairs in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.episodes.iter().copied().zip(self.scores.iter().copied())
    }

    /// Mean score of the last `window` episodes, if any.
    pub fn recent_mean(&self, window: usize) -> Option<f64> {
        let recent = &self.scores[self.scores.len().saturating_sub(window)..];
        if recent.is_empty() {
            None
        } else {
            Some(recent.iter().sum::<f64>() / recent.len() as f64)
        }
    }
}
