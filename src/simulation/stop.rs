//! Training stop conditions
use crate::utils::stats::RollingMean;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Target for the rolling average episode score.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScoreGoal {
    /// Met once the average is at least this value.
    AtLeast(f64),
    /// Met once the average is at most this value.
    AtMost(f64),
}

impl ScoreGoal {
    pub fn is_met(self, average: f64) -> bool {
        match self {
            Self::AtLeast(target) => average >= target,
            Self::AtMost(target) => average <= target,
        }
    }
}

/// Why a training run stopped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StopReason {
    TimeLimit,
    EpisodeLimit,
    GoalReached,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::TimeLimit => write!(f, "time limit reached"),
            Self::EpisodeLimit => write!(f, "episode limit reached"),
            Self::GoalReached => write!(f, "score goal reached"),
        }
    }
}

/// When to stop training.
///
/// Checked before each episode.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopCondition {
    /// Wall-clock budget in seconds.
    pub time_limit_secs: u64,
    /// Goal for the mean score of the last `window` episodes.
    pub goal: Option<ScoreGoal>,
    /// Number of recent episodes averaged for the goal.
    pub window: usize,
    /// Maximum number of episodes run by this process.
    pub max_episodes: Option<u64>,
}

impl Default for StopCondition {
    fn default() -> Self {
        Self {
            time_limit_secs: 5 * 60,
            goal: Some(ScoreGoal::AtLeast(490.0)),
            window: 30,
            max_episodes: None,
        }
    }
}

impl StopCondition {
    pub const fn time_limit(&self) -> Duration {
        Duration::from_secs(self.time_limit_secs)
    }

    /// Check whether to stop.
    ///
    /// # Args
    /// * `elapsed` - Time since training started.
    /// * `episodes` - Episodes completed since training started.
    /// * `recent` - Scores of the most recent episodes.
    pub fn check(&self, elapsed: Duration, episodes: u64, recent: &RollingMean) -> Option<StopReason> {
        if elapsed >= self.time_limit() {
            return Some(StopReason::TimeLimit);
        }
        if matches!(self.max_episodes, Some(max) if episodes >= max) {
            return Some(StopReason::EpisodeLimit);
        }
        match (self.goal, recent.mean()) {
            (Some(goal), Some(average)) if goal.is_met(average) => Some(StopReason::GoalReached),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn recent(scores: &[f64]) -> RollingMean {
        let mut recent = RollingMean::new(3);
        for &score in scores {
            recent.push(score);
        }
        recent
    }

    #[rstest]
    #[case(ScoreGoal::AtLeast(490.0), 490.0, true)]
    #[case(ScoreGoal::AtLeast(490.0), 489.9, false)]
    #[case(ScoreGoal::AtMost(200.0), 200.0, true)]
    #[case(ScoreGoal::AtMost(200.0), 250.0, false)]
    fn score_goal(#[case] goal: ScoreGoal, #[case] average: f64, #[case] met: bool) {
        assert_eq!(goal.is_met(average), met);
    }

    #[test]
    fn no_episodes_never_meets_goal() {
        let stop = StopCondition {
            goal: Some(ScoreGoal::AtMost(200.0)),
            ..StopCondition::default()
        };
        assert_eq!(stop.check(Duration::ZERO, 0, &recent(&[])), None);
    }

    #[test]
    fn goal_uses_rolling_window() {
        let stop = StopCondition {
            goal: Some(ScoreGoal::AtLeast(10.0)),
            ..StopCondition::default()
        };
        assert_eq!(stop.check(Duration::ZERO, 2, &recent(&[0.0, 20.0])), None);
        assert_eq!(
            stop.check(Duration::ZERO, 4, &recent(&[0.0, 20.0, 5.0, 10.0])),
            Some(StopReason::GoalReached)
        );
    }

    #[test]
    fn time_limit_first() {
        let stop = StopCondition::default();
        assert_eq!(
            stop.check(Duration::from_secs(301), 0, &recent(&[500.0])),
            Some(StopReason::TimeLimit)
        );
    }

    #[test]
    fn episode_limit() {
        let stop = StopCondition {
            goal: None,
            max_episodes: Some(2),
            ..StopCondition::default()
        };
        assert_eq!(stop.check(Duration::ZERO, 1, &recent(&[])), None);
        assert_eq!(
            stop.check(Duration::ZERO, 2, &recent(&[])),
            Some(StopReason::EpisodeLimit)
        );
    }
}
