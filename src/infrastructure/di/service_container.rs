//! Service container for dependency injection
//!
//! Wires settings and the filesystem boundary into forest sources and stores.

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::application::{load_forest, ApplicationError, FileSource, SelectionStore};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraResult;

/// Container holding settings and I/O boundaries.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
        }
    }

    /// Resolve the forest file: explicit argument first, then `settings.source`.
    pub fn resolve_source(&self, explicit: Option<&Path>) -> InfraResult<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| self.settings.source.clone())
            .ok_or_else(|| {
                ApplicationError::Config {
                    message: "no forest file given and no `source` configured".into(),
                }
                .into()
            })
    }

    pub fn source_for(&self, path: &Path) -> FileSource {
        FileSource::new(path, self.fs.clone())
    }

    /// Load the forest behind `explicit` (or the configured source) into a fresh store.
    pub fn open_store(&self, explicit: Option<&Path>) -> InfraResult<Rc<SelectionStore>> {
        let path = self.resolve_source(explicit)?;
        debug!(path = %path.display(), "opening selection store");
        let forest = load_forest(&self.source_for(&path), &self.settings.eligibility.to_labels())?;
        Ok(SelectionStore::new(forest))
    }
}
