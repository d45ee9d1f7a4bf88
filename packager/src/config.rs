//! Packaging configuration.
//!
//! [`ReleaseConfig`] carries every path and list the packaging routine needs,
//! so nothing depends on the process working directory once it is built.
//! [`ConfigFile`] is an optional TOML overlay for the archive prefix, the
//! metadata file name and the include list.

use crate::error::{PackagerError, Result};
use crate::include::{IncludeEntry, default_include_list, validate_include_list};
use crate::naming::{ArchiveName, DEFAULT_ARCHIVE_PREFIX};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;
use std::fs;

/// Metadata file consulted when no version is given.
pub const DEFAULT_METADATA_FILE: &str = "package.json";

/// Resolved configuration for one packaging run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseConfig {
    /// Absolute directory holding the release sources.
    pub base_dir: Utf8PathBuf,
    /// Directory the archive is written into.
    pub output_dir: Utf8PathBuf,
    /// Archive name prefix, before `-v<version>`.
    pub archive_prefix: String,
    /// Metadata file, relative to `base_dir`.
    pub metadata_file: Utf8PathBuf,
    /// Ordered allow-list of release entries.
    pub include: Vec<IncludeEntry>,
    /// Where staging directories are created; the system temporary
    /// directory when `None`.
    pub staging_parent: Option<Utf8PathBuf>,
}

impl ReleaseConfig {
    /// Create a configuration with the default prefix, metadata file and
    /// include list. Paths are used as given.
    #[must_use]
    pub fn new(base_dir: impl Into<Utf8PathBuf>, output_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            output_dir: output_dir.into(),
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_owned(),
            metadata_file: Utf8PathBuf::from(DEFAULT_METADATA_FILE),
            include: default_include_list(),
            staging_parent: None,
        }
    }

    /// Resolve directories from command-line input.
    ///
    /// The base directory is canonicalised. The output directory defaults to
    /// the parent of the canonical base directory.
    ///
    /// # Errors
    ///
    /// - [`PackagerError::BaseDirNotFound`] if `base_dir` cannot be
    ///   canonicalised.
    /// - [`PackagerError::OutputDirNotFound`] if an explicit `output_dir`
    ///   cannot be canonicalised.
    /// - [`PackagerError::NoParentDirectory`] if no output directory is given
    ///   and the base directory is a filesystem root.
    pub fn resolve(base_dir: &Utf8Path, output_dir: Option<&Utf8Path>) -> Result<Self> {
        let base = base_dir
            .canonicalize_utf8()
            .map_err(|source| PackagerError::BaseDirNotFound {
                path: base_dir.to_owned(),
                source,
            })?;

        let output = match output_dir {
            Some(dir) => {
                dir.canonicalize_utf8()
                    .map_err(|source| PackagerError::OutputDirNotFound {
                        path: dir.to_owned(),
                        source,
                    })?
            }
            None => base
                .parent()
                .map(Utf8Path::to_path_buf)
                .ok_or_else(|| PackagerError::NoParentDirectory { path: base.clone() })?,
        };

        debug!("base directory {base}, output directory {output}");
        Ok(Self::new(base, output))
    }

    /// Overlay values from a configuration file.
    ///
    /// Fields absent from the file keep their current values; an `include`
    /// list replaces the current list wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ConfigInvalid`] for an unusable prefix or
    /// metadata path and [`PackagerError::InvalidIncludePath`] for an include
    /// entry outside the base directory.
    pub fn apply(&mut self, file: ConfigFile, origin: &Utf8Path) -> Result<()> {
        let invalid = |reason: String| PackagerError::ConfigInvalid {
            path: origin.to_owned(),
            reason,
        };

        if let Some(prefix) = file.archive_prefix {
            if prefix.is_empty() || prefix.contains(['/', '\\']) {
                return Err(invalid(format!(
                    "archive_prefix {prefix:?} must be a non-empty file name"
                )));
            }
            self.archive_prefix = prefix;
        }

        if let Some(metadata_file) = file.metadata_file {
            IncludeEntry::file(metadata_file.clone())
                .validate()
                .map_err(|err| invalid(format!("metadata_file: {err}")))?;
            self.metadata_file = metadata_file;
        }

        if let Some(include) = file.include {
            validate_include_list(&include)?;
            self.include = include;
        }

        Ok(())
    }

    /// Return the absolute path of the metadata file.
    #[must_use]
    pub fn metadata_path(&self) -> Utf8PathBuf {
        self.base_dir.join(&self.metadata_file)
    }

    /// Return the on-disk source of an include entry.
    #[must_use]
    pub fn source_path(&self, entry: &IncludeEntry) -> Utf8PathBuf {
        self.base_dir.join(&entry.path)
    }

    /// Return where the archive for `name` will be written.
    #[must_use]
    pub fn archive_path(&self, name: &ArchiveName) -> Utf8PathBuf {
        self.output_dir.join(name.filename())
    }
}

/// Optional TOML overlay for [`ReleaseConfig`].
///
/// ```toml
/// archive_prefix = "PulsoidWidget-to-OSC"
/// metadata_file = "package.json"
///
/// [[include]]
/// path = "code"
/// kind = "directory"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Replacement archive prefix.
    pub archive_prefix: Option<String>,
    /// Replacement metadata file, relative to the base directory.
    pub metadata_file: Option<Utf8PathBuf>,
    /// Replacement include list.
    pub include: Option<Vec<IncludeEntry>>,
}

impl ConfigFile {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::ConfigRead`] if the file cannot be read and
    /// [`PackagerError::ConfigParse`] if it is not valid for this tool.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| PackagerError::ConfigRead {
            path: path.to_owned(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| PackagerError::ConfigParse {
            path: path.to_owned(),
            source: Box::new(source),
        })
    }
}
