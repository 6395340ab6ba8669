//! Filesystem probe used to locate installer artifacts.

use std::path::Path;

use crate::error::FsError;

/// Minimal filesystem access.
pub trait FileSystem: Send + Sync {
    /// Whether `path` exists. Never fails: errors are reported as `false`.
    fn exists(&self, path: &Path) -> bool;

    /// Complete content of the file at `path`.
    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError>;
}

/// `FileSystem` backed by the local disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.try_exists().unwrap_or(false)
    }

    fn read_file(&self, path: &Path) -> Result<Vec<u8>, FsError> {
        std::fs::read(path).map_err(|e| FsError::from_io(path, e))
    }
}
