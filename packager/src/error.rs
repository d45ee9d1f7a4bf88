//! Error types for the release packager.
//!
//! Missing or special include entries are soft failures and never surface
//! here; the stager reports them as warnings. Everything in this module
//! aborts the run.

use camino::Utf8PathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving inputs or building the archive.
#[derive(Debug, Error)]
pub enum PackagerError {
    /// The base directory holding the release sources does not exist.
    #[error("base directory {path} not found: {source}")]
    BaseDirNotFound {
        /// Directory that was requested.
        path: Utf8PathBuf,
        /// Underlying canonicalisation failure.
        #[source]
        source: std::io::Error,
    },

    /// The requested output directory does not exist.
    #[error("output directory {path} not found: {source}")]
    OutputDirNotFound {
        /// Directory that was requested.
        path: Utf8PathBuf,
        /// Underlying canonicalisation failure.
        #[source]
        source: std::io::Error,
    },

    /// The base directory has no parent to write the archive into.
    #[error("base directory {path} has no parent; pass --output-dir explicitly")]
    NoParentDirectory {
        /// The base directory in question.
        path: Utf8PathBuf,
    },

    /// A version string cannot be used to name the archive.
    #[error("invalid release version {value:?}: {reason}")]
    InvalidVersion {
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The metadata file could not be read.
    #[error("failed to read metadata file {path}: {source}")]
    MetadataRead {
        /// Path to the metadata file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The metadata file is not valid JSON.
    #[error("failed to parse metadata file {path}: {source}")]
    MetadataParse {
        /// Path to the metadata file.
        path: Utf8PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The metadata file parsed, but its `version` field is unusable.
    #[error("metadata file {path} has an invalid version field: {reason}")]
    InvalidMetadataVersion {
        /// Path to the metadata file.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The packaging configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        /// Path to the config file.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The packaging configuration file is not valid TOML for this tool.
    #[error("invalid config file {path}: {source}")]
    ConfigParse {
        /// Path to the config file.
        path: Utf8PathBuf,
        /// Underlying TOML error.
        #[source]
        source: Box<toml::de::Error>,
    },

    /// The packaging configuration file parsed but holds an unusable value.
    #[error("invalid config file {path}: {reason}")]
    ConfigInvalid {
        /// Path to the config file.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// An include entry escapes the base directory or is otherwise unusable.
    #[error("invalid include path {path:?}: {reason}")]
    InvalidIncludePath {
        /// The rejected path as written.
        path: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Copying a file into the staging directory failed.
    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    CopyFailed {
        /// Source path.
        from: PathBuf,
        /// Destination path.
        to: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A path met while walking the staging tree is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// Writing the zip archive failed.
    #[error("failed to write archive {path}: {source}")]
    Archive {
        /// Destination archive path.
        path: Utf8PathBuf,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using [`PackagerError`].
pub type Result<T> = std::result::Result<T, PackagerError>;
