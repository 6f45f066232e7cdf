//! Error types for filesystem explode and pack operations

use c4group_formats::GroupError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Storage error type
///
/// Filesystem failures are surfaced to the caller of explode/pack, never
/// swallowed; siblings already written before a failure stay on disk.
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Format error from the archive codec
    #[error("format error: {0}")]
    Format(#[from] GroupError),

    /// The backup name the archive would be renamed to is already taken
    #[error("backup file {} already exists", .0.display())]
    BackupExists(PathBuf),

    /// The archive could not be renamed to its backup name
    #[error("cannot back up archive {}: {source}", path.display())]
    BackupRename {
        /// Archive that could not be renamed
        path: PathBuf,
        /// Underlying filesystem error
        source: io::Error,
    },

    /// A directory could not be created while exploding
    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying filesystem error
        source: io::Error,
    },

    /// A directory could not be removed while packing
    #[error("cannot remove directory {}: {source}", path.display())]
    RemoveDir {
        /// Directory that could not be removed
        path: PathBuf,
        /// Underlying filesystem error
        source: io::Error,
    },

    /// The pack target is not a directory
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// The archive path has no usable file name
    #[error("archive path {} has no usable file name", .0.display())]
    InvalidArchivePath(PathBuf),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
