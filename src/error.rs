//! Error types for organizing a directory.
//!
//! [`RelocateError`] covers a single file or folder and never stops a run.
//! [`OrganizeError`] is fatal to the whole run.
use crate::config::ConfigError;
use std::path::PathBuf;

/// A per-file or per-folder failure. The run continues after any of these.
#[derive(Debug, thiserror::Error)]
pub enum RelocateError {
    /// The extension promised an archive but the content did not unpack.
    #[error("{} is not an archive: {reason}", .path.display())]
    NotAnArchive { path: PathBuf, reason: String },

    /// The file or folder disappeared before it could be handled.
    #[error("{} no longer exists", .path.display())]
    SourceVanished { path: PathBuf },

    /// Cleanup could not remove a folder.
    #[error("cannot remove directory {}: {reason}", .path.display())]
    DirectoryNotEmpty { path: PathBuf, reason: String },

    /// Failed to create a destination folder.
    #[error("failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to move a file to its destination.
    #[error("failed to move {} to {}: {source}", .from.display(), .to.display())]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// Failed to delete a file.
    #[error("failed to remove {}: {source}", .path.display())]
    RemoveFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to enumerate a folder.
    #[error("failed to list {}: {source}", .path.display())]
    ListFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl RelocateError {
    /// The path the error is about.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::NotAnArchive { path, .. }
            | Self::SourceVanished { path }
            | Self::DirectoryNotEmpty { path, .. }
            | Self::DirectoryCreationFailed { path, .. }
            | Self::RemoveFailed { path, .. }
            | Self::ListFailed { path, .. } => path,
            Self::MoveFailed { from, .. } => from,
        }
    }
}

/// Errors that stop a run before or while it starts.
#[derive(Debug, thiserror::Error)]
pub enum OrganizeError {
    /// No directory was given on the command line.
    #[error("no directory to organize was given")]
    MissingArgument,

    /// The root path does not exist or is not a directory.
    #[error("invalid root {}: {reason}", .path.display())]
    InvalidRoot { path: PathBuf, reason: String },

    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}

impl OrganizeError {
    /// True for errors answered with the usage text and a clean exit.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::MissingArgument)
    }
}

/// Result type for whole-run operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;
