//! Forest data sources.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::error_ext::SourceResultExt;
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{EligibilityLabels, Forest, ForestBuilder, ForestDocument, FundRecord};
use crate::infrastructure::traits::FileSystem;

/// Anything that can produce fund records.
pub trait ForestSource {
    fn load(&self) -> ApplicationResult<Vec<FundRecord>>;

    /// Human readable origin, used in logs and errors.
    fn describe(&self) -> String;
}

/// In-memory records.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    funds: Vec<FundRecord>,
}

impl StaticSource {
    pub fn new(funds: Vec<FundRecord>) -> Self {
        Self { funds }
    }
}

impl ForestSource for StaticSource {
    fn load(&self) -> ApplicationResult<Vec<FundRecord>> {
        Ok(self.funds.clone())
    }

    fn describe(&self) -> String {
        format!("<static: {} funds>", self.funds.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Toml,
}

impl SourceFormat {
    /// `.toml` is TOML; everything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => SourceFormat::Toml,
            _ => SourceFormat::Json,
        }
    }
}

/// Records stored in a JSON or TOML file.
pub struct FileSource {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> SourceFormat {
        SourceFormat::from_path(&self.path)
    }
}

impl ForestSource for FileSource {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> ApplicationResult<Vec<FundRecord>> {
        if !self.fs.exists(&self.path) {
            return Err(ApplicationError::Source {
                path: self.path.clone(),
                message: "no such file".into(),
            });
        }
        if !self.fs.is_file(&self.path) {
            return Err(ApplicationError::Source {
                path: self.path.clone(),
                message: "not a file".into(),
            });
        }
        let text = self
            .fs
            .read_to_string(&self.path)
            .with_source_context("read", &self.path)?;

        let document: ForestDocument = match self.format() {
            SourceFormat::Json => serde_json::from_str::<ForestDocument>(&text)
                .with_source_context("parse json", &self.path)?,
            SourceFormat::Toml => toml::from_str::<ForestDocument>(&text)
                .with_source_context("parse toml", &self.path)?,
        };
        let funds = document.into_funds();
        debug!(funds = funds.len(), "records loaded");
        Ok(funds)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Load records from `source` and build a forest with `labels`.
pub fn load_forest(source: &dyn ForestSource, labels: &EligibilityLabels) -> ApplicationResult<Forest> {
    let funds = source.load()?;
    let mut builder = ForestBuilder::with_labels(labels.clone());
    let forest = builder.build(&funds)?;
    debug!(
        source = %source.describe(),
        nodes = forest.len(),
        unknown_statuses = builder.unknown_statuses(),
        "forest built"
    );
    Ok(forest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io;

    use crate::domain::{NodeId, SelectionStats};

    #[derive(Default)]
    struct MemoryFs {
        files: HashMap<PathBuf, String>,
    }

    impl FileSystem for MemoryFs {
        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.contains_key(path)
        }

        fn is_file(&self, path: &Path) -> bool {
            self.files.contains_key(path)
        }
    }

    fn memory_source(name: &str, content: &str) -> FileSource {
        let mut fs = MemoryFs::default();
        fs.files.insert(PathBuf::from(name), content.to_string());
        FileSource::new(name, Arc::new(fs))
    }

    #[test]
    fn given_json_file_when_loading_then_builds_forest() {
        let source = memory_source(
            "funds.json",
            r#"[{"id":"f1","fundName":"Alpha","children":[
                {"id":"c1","custodyInstitution":"Bank","children":[
                  {"id":"i1","transferInstructionNumber":"TI-1","children":[
                    {"id":"t1","tradeOrderNumber":"T-1","instructionStatus":"未生成"}]}]}]}]"#,
        );

        let forest = load_forest(&source, &EligibilityLabels::default()).expect("load");

        assert_eq!(forest.len(), 4);
        let stats = SelectionStats::of_forest(&forest);
        assert_eq!(stats.total, 1);
        assert_eq!(stats.actionable_total, 1);
        assert!(forest.lookup(&NodeId::from("t1")).is_some());
    }

    #[test]
    fn given_toml_file_when_loading_then_uses_toml_parser() {
        let source = memory_source(
            "funds.toml",
            r#"
            [[funds]]
            id = "f1"
            name = "Alpha"
            "#,
        );
        assert_eq!(source.format(), SourceFormat::Toml);

        let funds = source.load().expect("load");
        assert_eq!(funds.len(), 1);
    }

    #[test]
    fn given_missing_file_when_loading_then_source_error_names_path() {
        let source = FileSource::new("missing.json", Arc::new(MemoryFs::default()));

        let err = source.load().unwrap_err();

        assert!(matches!(err, ApplicationError::Source { ref path, .. } if path == Path::new("missing.json")));
    }

    #[test]
    fn given_malformed_json_when_loading_then_reports_parse_error() {
        let source = memory_source("funds.json", "{ not json");

        let err = source.load().unwrap_err();

        assert!(err.to_string().contains("parse json"));
    }
}
