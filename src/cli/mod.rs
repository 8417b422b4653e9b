//! Command-line interface
mod options;

pub use options::{EnvName, Options};

/// Update a configuration in place from another source of settings.
pub trait Update<T> {
    fn update(&mut self, source: T);
}

/// Consuming version of [`Update`].
pub trait WithUpdate<T>: Update<T> + Sized {
    #[must_use]
    fn with_update(mut self, source: T) -> Self {
        self.update(source);
        self
    }
}

impl<T, U: Update<T>> WithUpdate<T> for U {}
