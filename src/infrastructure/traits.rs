//! I/O boundary traits for testability
//!
//! Forest sources read through these traits so loading can be tested
//! without touching disk.

use std::io;
use std::path::Path;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;
}

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn given_written_file_when_reading_then_returns_content() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "[]").expect("write");

        let fs = RealFileSystem;
        assert!(fs.exists(file.path()));
        assert!(fs.is_file(file.path()));
        assert_eq!(fs.read_to_string(file.path()).expect("read"), "[]");
    }

    #[test]
    fn given_directory_when_checking_then_is_not_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let fs = RealFileSystem;
        assert!(fs.exists(dir.path()));
        assert!(!fs.is_file(dir.path()));
    }
}
