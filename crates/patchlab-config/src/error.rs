//! Error types for preset operations.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// File system operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOp {
    /// Reading a preset file
    Read,
    /// Writing a preset file
    Write,
    /// Creating a preset directory
    CreateDir,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileOp::Read => "read file",
            FileOp::Write => "write file",
            FileOp::CreateDir => "create directory",
        })
    }
}

/// Errors that can occur while reading, writing or validating presets.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system operation on `path` failed
    #[error("failed to {op} '{path}': {source}")]
    Io {
        /// What was being attempted.
        op: FileOp,
        /// Path the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Malformed TOML preset
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Preset could not be written as TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Malformed JSON preset, or a JSON serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension is neither `.toml` nor `.json`
    #[error("unsupported preset format: '{0}'")]
    UnsupportedFormat(PathBuf),

    /// No preset with this name in the directory
    #[error("preset not found: {0}")]
    PresetNotFound(String),

    /// Strict validation failed
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),
}

impl ConfigError {
    fn io(op: FileOp, path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConfigError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Reading `path` failed.
    pub fn read_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::io(FileOp::Read, path, source)
    }

    /// Writing `path` failed.
    pub fn write_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::io(FileOp::Write, path, source)
    }

    /// Creating the directory `path` failed.
    pub fn create_dir(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::io(FileOp::CreateDir, path, source)
    }

    /// The failed file operation, if this is an I/O error.
    pub fn file_op(&self) -> Option<FileOp> {
        match self {
            ConfigError::Io { op, .. } => Some(*op),
            _ => None,
        }
    }
}
