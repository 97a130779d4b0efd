//! Error conversion helpers for data-source loading
//!
//! Attach the source path to I/O and parse failures so the user sees which
//! file could not be turned into a forest.

use std::fmt::Display;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting fallible loads into `ApplicationError::Source`.
pub trait SourceResultExt<T> {
    /// Add path and action context to an error.
    ///
    /// # Example
    /// ```ignore
    /// let text = fs.read_to_string(&path).with_source_context("read", &path)?;
    /// ```
    fn with_source_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T, E: Display> SourceResultExt<T> for Result<T, E> {
    fn with_source_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Source {
            path: path.to_path_buf(),
            message: format!("{action}: {e}"),
        })
    }
}
