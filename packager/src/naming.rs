//! Archive naming policy.
//!
//! Release archives are named `<prefix>-v<version>.zip`. The stem (without
//! the extension) is also the top-level folder inside the archive.

use crate::version::ReleaseVersion;
use std::fmt;

/// Prefix used for PulsoidWidget to OSC release archives.
pub const DEFAULT_ARCHIVE_PREFIX: &str = "PulsoidWidget-to-OSC";

/// File extension for release archives.
const ARCHIVE_EXTENSION: &str = ".zip";

/// A deterministic release archive name.
///
/// # Examples
///
/// ```
/// use release_packager::naming::{ArchiveName, DEFAULT_ARCHIVE_PREFIX};
/// use release_packager::version::ReleaseVersion;
///
/// let version = ReleaseVersion::try_from("1.1.1").expect("valid version");
/// let name = ArchiveName::new(DEFAULT_ARCHIVE_PREFIX, version);
/// assert_eq!(name.stem(), "PulsoidWidget-to-OSC-v1.1.1");
/// assert_eq!(name.filename(), "PulsoidWidget-to-OSC-v1.1.1.zip");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    prefix: String,
    version: ReleaseVersion,
}

impl ArchiveName {
    /// Create an archive name from a prefix and a validated version.
    #[must_use]
    pub fn new(prefix: impl Into<String>, version: ReleaseVersion) -> Self {
        Self {
            prefix: prefix.into(),
            version,
        }
    }

    /// Return the version component.
    #[must_use]
    pub fn version(&self) -> &ReleaseVersion {
        &self.version
    }

    /// Return the name without extension; used as the archive's root folder.
    #[must_use]
    pub fn stem(&self) -> String {
        format!("{}-v{}", self.prefix, self.version)
    }

    /// Return the archive filename.
    #[must_use]
    pub fn filename(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ArchiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{ARCHIVE_EXTENSION}", self.stem())
    }
}
