//! The release allow-list.
//!
//! An [`IncludeEntry`] names a path relative to the base directory and the
//! kind of filesystem object expected there. The default list mirrors what
//! ships in a PulsoidWidget to OSC release.

use crate::error::{PackagerError, Result};
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::fmt;

/// Directories copied recursively into every release.
const DEFAULT_DIRECTORIES: &[&str] = &["code"];

/// Files copied into every release, in report order.
const DEFAULT_FILES: &[&str] = &[
    "LICENSE",
    "README.md",
    "OSC_CONFIG_README.md",
    "osc_parameters.json",
    "package.json",
    "package-lock.json",
    "pulsoid_widget_osc.vrmanifest",
    "run.bat",
    "widget_id.txt.template",
];

/// Kind of filesystem object an include entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncludeKind {
    /// A single regular file.
    File,
    /// A directory, copied with all of its contents.
    Directory,
}

impl fmt::Display for IncludeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Directory => f.write_str("directory"),
        }
    }
}

/// What an include path refers to on disk, following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Nothing exists at the path.
    Missing,
    /// A regular file or a directory.
    Found(IncludeKind),
    /// Something else, such as a FIFO or a socket. Never opened.
    Special,
}

impl Presence {
    /// Inspect `path`.
    ///
    /// Paths whose metadata cannot be read count as missing.
    #[must_use]
    pub fn of(path: &Utf8Path) -> Self {
        match path.metadata() {
            Err(_) => Self::Missing,
            Ok(metadata) if metadata.is_dir() => Self::Found(IncludeKind::Directory),
            Ok(metadata) if metadata.is_file() => Self::Found(IncludeKind::File),
            Ok(_) => Self::Special,
        }
    }
}

/// One entry of the release allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IncludeEntry {
    /// Path relative to the base directory. Also the path inside the archive.
    pub path: Utf8PathBuf,
    /// Declared kind of the entry. What is on disk decides how it is
    /// copied; a different kind is reported with a warning.
    pub kind: IncludeKind,
}

impl IncludeEntry {
    /// Create an entry for a single file.
    #[must_use]
    pub fn file(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: IncludeKind::File,
        }
    }

    /// Create an entry for a directory tree.
    #[must_use]
    pub fn directory(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: IncludeKind::Directory,
        }
    }

    /// Check that the entry stays inside the base directory.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::InvalidIncludePath`] for empty or absolute
    /// paths and for paths with `..` or root components.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| PackagerError::InvalidIncludePath {
            path: self.path.to_string(),
            reason: reason.to_owned(),
        };

        if self.path.as_str().is_empty() {
            return Err(invalid("path must not be empty"));
        }
        if self.path.is_absolute() || self.path.has_root() {
            return Err(invalid("path must be relative to the base directory"));
        }
        for component in self.path.components() {
            match component {
                Utf8Component::Normal(_) | Utf8Component::CurDir => {}
                Utf8Component::ParentDir => {
                    return Err(invalid("path must not contain '..'"));
                }
                Utf8Component::RootDir | Utf8Component::Prefix(_) => {
                    return Err(invalid("path must be relative to the base directory"));
                }
            }
        }
        if !self
            .path
            .components()
            .any(|c| matches!(c, Utf8Component::Normal(_)))
        {
            return Err(invalid("path must name a file or directory"));
        }
        Ok(())
    }
}

/// Return the allow-list for a PulsoidWidget to OSC release.
///
/// Directories come first, then files, matching the order of the release
/// notes.
#[must_use]
pub fn default_include_list() -> Vec<IncludeEntry> {
    DEFAULT_DIRECTORIES
        .iter()
        .map(|name| IncludeEntry::directory(*name))
        .chain(DEFAULT_FILES.iter().map(|name| IncludeEntry::file(*name)))
        .collect()
}

/// Validate every entry in `entries`.
///
/// # Errors
///
/// Returns the first [`PackagerError::InvalidIncludePath`] found.
pub fn validate_include_list(entries: &[IncludeEntry]) -> Result<()> {
    entries.iter().try_for_each(IncludeEntry::validate)
}
