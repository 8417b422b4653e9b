//! Logging statistics from training runs
mod display;

pub use display::DisplayLogger;

use std::fmt;

/// Progress of a training run after one episode.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EpisodeProgress {
    /// Global episode counter.
    pub episode: u64,
    /// Number of steps in the episode.
    pub episode_steps: u64,
    /// Global step counter.
    pub total_steps: u64,
    /// Number of recent episodes averaged by `average_score`.
    pub window: usize,
    /// Mean score of the last `window` episodes.
    pub average_score: f64,
}

impl fmt::Display for EpisodeProgress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "episode : {} / ep step : {} / time step : {} / last {} avg : {:.1}",
            self.episode, self.episode_steps, self.total_steps, self.window, self.average_score
        )
    }
}

/// Log statistics from a training run.
pub trait StatsLogger {
    /// Log a scalar value in the current group.
    fn log_scalar(&mut self, id: &'static str, value: f64);

    /// Log the progress line of a completed episode.
    fn log_progress(&mut self, progress: &EpisodeProgress);

    /// Mark the end of a group of values (one episode).
    fn group_end(&mut self) {}

    /// Write out any buffered summaries.
    fn flush(&mut self) {}
}

/// Logger that does nothing
impl StatsLogger for () {
    #[inline]
    fn log_scalar(&mut self, _: &'static str, _: f64) {}
    #[inline]
    fn log_progress(&mut self, _: &EpisodeProgress) {}
}

impl<L: StatsLogger + ?Sized> StatsLogger for &mut L {
    #[inline]
    fn log_scalar(&mut self, id: &'static str, value: f64) {
        L::log_scalar(self, id, value)
    }
    #[inline]
    fn log_progress(&mut self, progress: &EpisodeProgress) {
        L::log_progress(self, progress)
    }
    #[inline]
    fn group_end(&mut self) {
        L::group_end(self)
    }
    #[inline]
    fn flush(&mut self) {
        L::flush(self)
    }
}

impl<L: StatsLogger + ?Sized> StatsLogger for Box<L> {
    #[inline]
    fn log_scalar(&mut self, id: &'static str, value: f64) {
        L::log_scalar(self, id, value)
    }
    #[inline]
    fn log_progress(&mut self, progress: &EpisodeProgress) {
        L::log_progress(self, progress)
    }
    #[inline]
    fn group_end(&mut self) {
        L::group_end(self)
    }
    #[inline]
    fn flush(&mut self) {
        L::flush(self)
    }
}
