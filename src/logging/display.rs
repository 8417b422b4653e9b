//! Command-line logger
use super::{EpisodeProgress, StatsLogger};
use crate::utils::fmt::PrettyPrint;
use crate::utils::stats::OnlineMeanVariance;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use yansi::Paint;

/// Logger that displays episode progress and periodic scalar summaries to standard output.
///
/// Scalars are accumulated across groups and summarized (mean and standard deviation)
/// at the end of the first group after `summary_period` has elapsed.
#[derive(Debug, Clone)]
pub struct DisplayLogger {
    summary_period: Duration,
    last_summary: Instant,
    scalars: BTreeMap<&'static str, OnlineMeanVariance<f64>>,
}

impl Default for DisplayLogger {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl DisplayLogger {
    pub fn new(summary_period: Duration) -> Self {
        Self {
            summary_period,
            last_summary: Instant::now(),
            scalars: BTreeMap::new(),
        }
    }

    fn write_summaries(&mut self) {
        let elapsed = self.last_summary.elapsed();
        if !self.scalars.is_empty() {
            println!(
                "{}",
                Paint::fixed(8, format!("-- last {:.1}s --", elapsed.as_secs_f64()))
            );
        }
        for (id, stats) in &self.scalars {
            if stats.count() == 0 {
                continue;
            }
            print!("{:<16} {:.3}", Paint::fixed(35, id), PrettyPrint(stats.mean()));
            if stats.count() > 1 {
                print!(
                    " {}",
                    Paint::fixed(8, format!("(σ {:.3})", PrettyPrint(stats.stddev())))
                );
            }
            println!();
        }
        self.scalars.clear();
        self.last_summary = Instant::now();
    }
}

impl StatsLogger for DisplayLogger {
    fn log_scalar(&mut self, id: &'static str, value: f64) {
        self.scalars.entry(id).or_default().push(value);
    }

    fn log_progress(&mut self, progress: &EpisodeProgress) {
        println!("{}", Paint::fixed(111, progress));
    }

    fn group_end(&mut self) {
        if self.last_summary.elapsed() >= self.summary_period {
            self.write_summaries();
        }
    }

    fn flush(&mut self) {
        self.write_summaries();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_after_period() {
        let mut logger = DisplayLogger::new(Duration::from_secs(3600));
        logger.log_scalar("loss", 1.0);
        logger.log_scalar("loss", 3.0);
        logger.group_end();
        assert_eq!(logger.scalars["loss"].count(), 2);
        assert!((logger.scalars["loss"].mean() - 2.0).abs() < 1e-12);

        logger.flush();
        assert!(logger.scalars.is_empty());
    }

    #[test]
    fn zero_period_summarizes_every_group() {
        let mut logger = DisplayLogger::new(Duration::ZERO);
        logger.log_scalar("entropy", 0.5);
        logger.group_end();
        assert!(logger.scalars.is_empty());
    }
}
