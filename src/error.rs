//! Error types shared by every stage of a cleanup run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can stop a cleanup run.
///
/// Usage and path errors are raised before the tree is touched. `Io` and
/// `Walk` errors raised mid-run abort it where it stands.
#[derive(Error, Debug)]
pub enum CleanupError {
    #[error(
        "Incorrect usage: for {flag}, please provide comma separated strings without spaces (got '{value}')"
    )]
    InvalidListValue { flag: String, value: String },

    #[error("Incorrect usage: {flag} contains an empty string, which would match every file")]
    EmptyListEntry { flag: String },

    #[error(
        "Output paths are not valid in DELETION mode, given that no files are linked or copied"
    )]
    OutPathInDeleteMode,

    #[error(
        "Simulation folder {} would overlap the fMRIPrep directory {}",
        .sim_root.display(),
        .root.display()
    )]
    SimulationOverlapsRoot { sim_root: PathBuf, root: PathBuf },

    #[error("The specified fMRIPrep directory ({}) cannot be found or does not exist", .0.display())]
    RootNotFound(PathBuf),

    #[error("The specified fMRIPrep directory ({}) is not a directory", .0.display())]
    RootNotADirectory(PathBuf),

    #[error("The specified output directory ({}) cannot be found or does not exist", .0.display())]
    OutputDirNotFound(PathBuf),

    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Failed to write manifest: {0}")]
    Manifest(String),

    #[error("IO error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

impl CleanupError {
    /// Wraps an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors detected before any filesystem action.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::InvalidListValue { .. }
                | Self::EmptyListEntry { .. }
                | Self::OutPathInDeleteMode
                | Self::SimulationOverlapsRoot { .. }
        )
    }
}

/// Result type for cleanup operations.
pub type CleanupResult<T> = Result<T, CleanupError>;
