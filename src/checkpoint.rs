//! Saving and restoring training state
use crate::torch::{ParameterSnapshot, PolicyValueModel, SnapshotError};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tch::{TchError, Tensor};
use thiserror::Error;

const MODEL_FILE: &str = "model.ot";
const COUNTERS_FILE: &str = "counters.json";

/// Global training progress counters.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Counters {
    /// Number of completed episodes.
    pub episode: u64,
    /// Number of environment steps.
    pub step: u64,
}

/// Saves and restores model parameters and counters under `<save_dir>/<run_name>/`.
///
/// Parameters are stored as named tensors in `model.ot` and the counters as JSON in
/// `counters.json`. Each file is written to a temporary path and renamed into place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpointer {
    dir: PathBuf,
}

impl Checkpointer {
    pub fn new<P: AsRef<Path>>(save_dir: P, run_name: &str) -> Self {
        Self {
            dir: save_dir.as_ref().join(run_name),
        }
    }

    /// Checkpoint directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn counters_path(&self) -> PathBuf {
        self.dir.join(COUNTERS_FILE)
    }

    /// Save parameters and counters, overwriting any previous checkpoint.
    pub fn save(
        &self,
        snapshot: &ParameterSnapshot,
        counters: Counters,
    ) -> Result<(), CheckpointError> {
        fs::create_dir_all(&self.dir).map_err(|source| CheckpointError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let model_path = self.model_path();
        let model_tmp = tmp_path(&model_path);
        let named: Vec<(&str, &Tensor)> = snapshot.iter().collect();
        Tensor::save_multi(named.as_slice(), &model_tmp)?;
        rename(&model_tmp, &model_path)?;

        let counters_path = self.counters_path();
        let counters_tmp = tmp_path(&counters_path);
        write_json(&counters_tmp, &counters)?;
        rename(&counters_tmp, &counters_path)?;
        Ok(())
    }

    /// Load a saved checkpoint.
    ///
    /// Returns `Ok(None)` if there is no checkpoint.
    pub fn load(&self) -> Result<Option<(ParameterSnapshot, Counters)>, CheckpointError> {
        let model_path = self.model_path();
        let counters_path = self.counters_path();
        if !model_path.is_file() || !counters_path.is_file() {
            return Ok(None);
        }
        let tensors = Tensor::load_multi(&model_path)?;
        let file = File::open(&counters_path).map_err(|source| CheckpointError::Io {
            path: counters_path.clone(),
            source,
        })?;
        let counters = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some((ParameterSnapshot::from_named(tensors), counters)))
    }

    /// Load a saved checkpoint into a model.
    ///
    /// The model is only modified if the whole checkpoint was read and matches the model
    /// structure. Returns `Ok(None)` if there is no checkpoint.
    pub fn restore(&self, model: &mut PolicyValueModel) -> Result<Option<Counters>, CheckpointError> {
        match self.load()? {
            Some((snapshot, counters)) => {
                model.load_snapshot(&snapshot)?;
                Ok(Some(counters))
            }
            None => Ok(None),
        }
    }

    /// Restore a checkpoint if possible, otherwise keep the fresh model and start from zero.
    pub fn restore_or_default(&self, model: &mut PolicyValueModel) -> Counters {
        match self.restore(model) {
            Ok(Some(counters)) => {
                info!(
                    "restored checkpoint {} (episode {}, step {})",
                    self.dir.display(),
                    counters.episode,
                    counters.step
                );
                counters
            }
            Ok(None) => {
                info!("no checkpoint at {}; starting fresh", self.dir.display());
                Counters::default()
            }
            Err(err) => {
                warn!(
                    "failed to restore checkpoint {}: {}; starting fresh",
                    self.dir.display(),
                    err
                );
                Counters::default()
            }
        }
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn rename(from: &Path, to: &Path) -> Result<(), CheckpointError> {
    fs::rename(from, to).map_err(|source| CheckpointError::Io {
        path: to.to_path_buf(),
        source,
    })
}

fn write_json(path: &Path, counters: &Counters) -> Result<(), CheckpointError> {
    let io_error = |source| CheckpointError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    serde_json::to_writer_pretty(&mut writer, counters)?;
    writer.flush().map_err(io_error)
}

/// Error saving or loading a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("tensor file error: {0}")]
    Tensor(#[from] TchError),
    #[error("counters file error: {0}")]
    Counters(#[from] serde_json::Error),
    #[error("checkpoint does not match the model: {0}")]
    Incompatible(#[from] SnapshotError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torch::MlpConfig;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn save_dir() -> TempDir {
        tempfile::tempdir().unwrap()
    }

    fn model(seed: i64) -> PolicyValueModel {
        tch::manual_seed(seed);
        PolicyValueModel::new(&MlpConfig::default(), 4, 2, true)
    }

    #[rstest]
    fn round_trip_bit_identical(save_dir: TempDir) {
        let checkpointer = Checkpointer::new(save_dir.path(), "cartpole-a2c");
        let snapshot = model(1).snapshot();
        let counters = Counters {
            episode: 17,
            step: 4321,
        };
        checkpointer.save(&snapshot, counters).unwrap();
        assert!(checkpointer.model_path().is_file());

        let (loaded, loaded_counters) = checkpointer.load().unwrap().unwrap();
        assert!(loaded.bit_equal(&snapshot));
        assert_eq!(loaded_counters, counters);
    }

    #[rstest]
    fn missing_is_none(save_dir: TempDir) {
        let checkpointer = Checkpointer::new(save_dir.path(), "absent");
        assert!(checkpointer.load().unwrap().is_none());
        let mut model = model(2);
        assert_eq!(checkpointer.restore_or_default(&mut model), Counters::default());
    }

    #[rstest]
    fn restore_into_model(save_dir: TempDir) {
        let checkpointer = Checkpointer::new(save_dir.path(), "run");
        let source = model(3);
        let counters = Counters {
            episode: 2,
            step: 30,
        };
        checkpointer.save(&source.snapshot(), counters).unwrap();

        let mut target = model(4);
        assert_eq!(checkpointer.restore(&mut target).unwrap(), Some(counters));
        assert!(target.snapshot().bit_equal(&source.snapshot()));
    }

    #[rstest]
    fn later_save_overwrites(save_dir: TempDir) {
        let checkpointer = Checkpointer::new(save_dir.path(), "run");
        checkpointer
            .save(&model(5).snapshot(), Counters::default())
            .unwrap();
        let latest = model(6).snapshot();
        let counters = Counters {
            episode: 9,
            step: 99,
        };
        checkpointer.save(&latest, counters).unwrap();

        let (loaded, loaded_counters) = checkpointer.load().unwrap().unwrap();
        assert!(loaded.bit_equal(&latest));
        assert_eq!(loaded_counters, counters);
        assert!(!tmp_path(&checkpointer.model_path()).exists());
    }

    #[rstest]
    fn corrupt_model_falls_back(save_dir: TempDir) {
        let checkpointer = Checkpointer::new(save_dir.path(), "run");
        checkpointer
            .save(&model(7).snapshot(), Counters { episode: 1, step: 1 })
            .unwrap();
        fs::write(checkpointer.model_path(), b"not a tensor file").unwrap();

        let mut model = model(8);
        let before = model.snapshot();
        assert!(checkpointer.restore(&mut model).is_err());
        assert_eq!(checkpointer.restore_or_default(&mut model), Counters::default());
        assert!(model.snapshot().bit_equal(&before));
    }

    #[rstest]
    fn incompatible_model_unchanged(save_dir: TempDir) {
        let checkpointer = Checkpointer::new(save_dir.path(), "run");
        checkpointer
            .save(&model(9).snapshot(), Counters::default())
            .unwrap();

        let mut other = PolicyValueModel::new(&MlpConfig::default(), 2, 3, true);
        let before = other.snapshot();
        assert!(matches!(
            checkpointer.restore(&mut other),
            Err(CheckpointError::Incompatible(_))
        ));
        assert!(other.snapshot().bit_equal(&before));
    }
}
