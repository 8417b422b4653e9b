//! Score curve output
use crate::simulation::EpisodeHistory;
use plotters::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Plot dimensions in pixels.
const PLOT_SIZE: (u32, u32) = (800, 480);

/// Write the episode scores as an SVG line plot at `<graph_dir>/<run_name>.svg`.
///
/// The directory is created if missing. Returns the path of the written file.
pub fn plot_scores<P: AsRef<Path>>(
    history: &EpisodeHistory,
    graph_dir: P,
    run_name: &str,
) -> Result<PathBuf, PlotError> {
    let graph_dir = graph_dir.as_ref();
    fs::create_dir_all(graph_dir).map_err(|source| PlotError::Io {
        path: graph_dir.to_path_buf(),
        source,
    })?;
    let path = graph_dir.join(format!("{}.svg", run_name));

    let root = SVGBackend::new(&path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;
    draw_scores(&root, history, run_name)?;
    root.present().map_err(draw_error)?;
    drop(root);
    Ok(path)
}

fn draw_scores<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    history: &EpisodeHistory,
    run_name: &str,
) -> Result<(), PlotError>
where
    DB::ErrorType: 'static,
{
    let (episodes, scores) = axis_ranges(history);
    let mut chart = ChartBuilder::on(root)
        .caption(run_name, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(episodes, scores)
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .x_desc("episode")
        .y_desc("score")
        .draw()
        .map_err(draw_error)?;

    chart
        .draw_series(LineSeries::new(
            history.iter().map(|(episode, score)| (episode as f64, score)),
            BLUE.stroke_width(1),
        ))
        .map_err(draw_error)?;
    Ok(())
}

/// Episode and score axis ranges covering the history, never empty.
fn axis_ranges(history: &EpisodeHistory) -> (std::ops::Range<f64>, std::ops::Range<f64>) {
    let mut first_episode = f64::INFINITY;
    let mut last_episode = f64::NEG_INFINITY;
    let mut min_score = f64::INFINITY;
    let mut max_score = f64::NEG_INFINITY;
    for (episode, score) in history.iter() {
        first_episode = first_episode.min(episode as f64);
        last_episode = last_episode.max(episode as f64);
        min_score = min_score.min(score);
        max_score = max_score.max(score);
    }
    if history.is_empty() {
        return (0.0..1.0, 0.0..1.0);
    }
    (
        padded(first_episode, last_episode),
        padded(min_score.min(0.0), max_score),
    )
}

fn padded(low: f64, high: f64) -> std::ops::Range<f64> {
    if high > low {
        low..high
    } else {
        low - 1.0..high + 1.0
    }
}

fn draw_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> PlotError {
    PlotError::Draw(err.to_string())
}

/// Error writing a plot.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("cannot create plot directory {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("drawing failed: {0}")]
    Draw(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn history() -> EpisodeHistory {
        let mut history = EpisodeHistory::default();
        for (episode, score) in [(11, 20.0), (12, 35.0), (13, 18.0), (14, 60.0)] {
            history.push(episode, score);
        }
        history
    }

    #[rstest]
    fn writes_svg(history: EpisodeHistory) {
        let dir = TempDir::new().unwrap();
        let graph_dir = dir.path().join("graphs");
        let path = plot_scores(&history, &graph_dir, "cartpole-a2c").unwrap();
        assert_eq!(path, graph_dir.join("cartpole-a2c.svg"));
        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("<svg"));
        assert!(contents.contains("polyline") || contents.contains("path"));
    }

    #[test]
    fn empty_history() {
        let dir = TempDir::new().unwrap();
        let path = plot_scores(&EpisodeHistory::default(), dir.path(), "empty").unwrap();
        assert!(path.exists());
    }

    #[rstest]
    fn ranges_cover_scores(history: EpisodeHistory) {
        let (episodes, scores) = axis_ranges(&history);
        assert_eq!(episodes, 11.0..14.0);
        assert_eq!(scores, 0.0..60.0);
    }

    #[test]
    fn single_episode_range_is_padded() {
        let mut history = EpisodeHistory::default();
        history.push(1, 5.0);
        let (episodes, _) = axis_ranges(&history);
        assert_eq!(episodes, 0.0..2.0);
    }
}
