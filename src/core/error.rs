//! Defines the custom error type for the `core` module.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// Scan failures are reported per root inside a `ScanEvent::Failed`; cache
/// failures come back from `FolderCache::flush` and `FolderCache::load`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The root (or an entry below it) does not exist, or vanished mid-walk.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The OS refused to list or stat the path.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Represents a path that was expected to be a directory but was not.
    #[error("Path is not a valid directory: {0}")]
    NotADirectory(PathBuf),

    /// Reading or writing the cache snapshot failed.
    #[error("Cache I/O error for {path}: {source}")]
    CacheIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The cache snapshot could not be encoded or decoded.
    #[error("Cache format error: {0}")]
    CacheFormat(#[from] serde_json::Error),

    /// Any other I/O error during a walk.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] io::Error, PathBuf),

    /// Represents an error that occurred when a Tokio task was joined.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Represents an error during the parsing or building of a glob pattern.
    #[error("Invalid glob pattern: {0}")]
    GlobPattern(#[from] globset::Error),

    /// Represents a user-initiated cancellation of an operation.
    #[error("Operation was cancelled by the user")]
    Cancelled,
}

impl CoreError {
    /// Maps an I/O error on `path` onto the scan taxonomy.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => CoreError::PathNotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            _ => CoreError::Io(err, path.to_path_buf()),
        }
    }

    /// Maps a `walkdir` error, which may carry no I/O error at all (symlink loops).
    pub fn from_walk(err: walkdir::Error, root: &Path) -> Self {
        let path = err
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| root.to_path_buf());
        match err.into_io_error() {
            Some(io_err) => CoreError::from_io(io_err, &path),
            None => CoreError::Io(
                io::Error::new(io::ErrorKind::Other, "filesystem loop detected"),
                path,
            ),
        }
    }

    /// Short title used for the user-facing error dialog.
    pub fn title(&self) -> &'static str {
        match self {
            CoreError::PathNotFound(_) => "Folder not found",
            CoreError::PermissionDenied(_) => "Access denied",
            CoreError::NotADirectory(_) => "Not a folder",
            CoreError::Cancelled => "Scan cancelled",
            _ => "No anime found :c",
        }
    }
}
