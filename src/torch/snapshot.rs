//! Parameter snapshots
use std::fmt;
use tch::Tensor;
use thiserror::Error;

/// Detached deep copies of named parameter tensors, sorted by name.
///
/// Snapshots do not share storage with the parameters they were taken from
/// so they can be sent to other threads.
pub struct ParameterSnapshot {
    tensors: Vec<(String, Tensor)>,
}

impl ParameterSnapshot {
    /// Create a snapshot by copying named tensors.
    pub fn from_named<I>(named: I) -> Self
    where
        I: IntoIterator<Item = (String, Tensor)>,
    {
        let mut tensors: Vec<_> = tch::no_grad(|| {
            named
                .into_iter()
                .map(|(name, tensor)| (name, tensor.detach().copy()))
                .collect()
        });
        tensors.sort_by(|a, b| a.0.cmp(&b.0));
        Self { tensors }
    }

    /// Iterate over `(name, tensor)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.tensors.iter().map(|(name, t)| (name.as_str(), t))
    }

    /// Get a tensor by name.
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
            .ok()
            .map(|i| &self.tensors[i].1)
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    /// Deep copy of this snapshot.
    #[cfg(test)]
    pub fn duplicate(&self) -> Self {
        Self::from_named(
            self.tensors
                .iter()
                .map(|(name, t)| (name.clone(), t.shallow_clone())),
        )
    }

    /// Whether both snapshots have the same names, shapes and bit-identical values.
    pub fn bit_equal(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .zip(other.iter())
                .all(|((n1, t1), (n2, t2))| n1 == n2 && t1.size() == t2.size() && t1.equal(t2))
    }

    /// Check that this snapshot has exactly the given names and shapes.
    pub fn check_compatible<'a, I>(&self, expected: I) -> Result<(), SnapshotError>
    where
        I: IntoIterator<Item = (&'a str, Vec<i64>)>,
    {
        let mut count = 0;
        for (name, shape) in expected {
            count += 1;
            let tensor = self
                .get(name)
                .ok_or_else(|| SnapshotError::Missing(name.to_string()))?;
            if tensor.size() != shape {
                return Err(SnapshotError::Shape {
                    name: name.to_string(),
                    expected: shape,
                    actual: tensor.size(),
                });
            }
        }
        if count != self.len() {
            return Err(SnapshotError::Count {
                expected: count,
                actual: self.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for ParameterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_map()
            .entries(self.tensors.iter().map(|(name, t)| (name, t.size())))
            .finish()
    }
}

/// Error matching a snapshot against a parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("missing parameter {0:?}")]
    Missing(String),
    #[error("parameter {name:?} has shape {actual:?}, expected {expected:?}")]
    Shape {
        name: String,
        expected: Vec<i64>,
        actual: Vec<i64>,
    },
    #[error("snapshot has {actual} parameters, expected {expected}")]
    Count { expected: usize, actual: usize },
}
