//! Static linguistic dataset: morae, curriculum lines, vocabulary and the
//! visual-similarity table.
//!
//! The built-in tables live under `data/` and are embedded into the binary.
//! A directory holding the same four files can replace them at runtime
//! (see [`crate::config::DrillSettings::dataset_dir`]).

pub mod dataset;

pub use dataset::{Dataset, DatasetError};

/// Extension trait for logging recoverable loader errors and continuing.
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}
