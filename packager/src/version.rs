//! Release version handling.
//!
//! The version is an opaque token that only names the output archive. It is
//! never parsed as a semantic version, but it must be usable inside a single
//! file name.

use crate::error::{PackagerError, Result};
use camino::Utf8Path;
use log::debug;
use serde_json::Value;
use std::fmt;
use std::fs;

/// Version used when the metadata file has no `version` field.
pub const DEFAULT_VERSION: &str = "0.0.0";

/// A release version that is safe to embed in an archive file name.
///
/// # Examples
///
/// ```
/// use release_packager::version::ReleaseVersion;
///
/// let version = ReleaseVersion::try_from("1.1.1").expect("valid version");
/// assert_eq!(version.as_str(), "1.1.1");
/// assert!(ReleaseVersion::try_from("../1.1.1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReleaseVersion(String);

impl ReleaseVersion {
    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<&str> for ReleaseVersion {
    type Error = PackagerError;

    fn try_from(value: &str) -> Result<Self> {
        validate_version(value)?;
        Ok(Self(value.to_owned()))
    }
}

impl TryFrom<String> for ReleaseVersion {
    type Error = PackagerError;

    fn try_from(value: String) -> Result<Self> {
        validate_version(&value)?;
        Ok(Self(value))
    }
}

impl AsRef<str> for ReleaseVersion {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReleaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a resolved version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    /// Supplied on the command line.
    Argument,
    /// Read from the metadata file's `version` field.
    Metadata,
    /// The metadata file had no `version` field.
    Default,
}

/// A version together with its origin, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVersion {
    /// The version to build.
    pub version: ReleaseVersion,
    /// Where it came from.
    pub source: VersionSource,
}

/// Resolve the release version.
///
/// A command-line value wins. Otherwise the `version` field of the JSON
/// metadata file is used, falling back to [`DEFAULT_VERSION`] when the field
/// is absent.
///
/// # Errors
///
/// Returns [`PackagerError::InvalidVersion`] if the chosen value cannot name
/// a file, or any error from [`read_metadata_version`] when the metadata file
/// is consulted.
pub fn resolve_version(argument: Option<&str>, metadata_path: &Utf8Path) -> Result<ResolvedVersion> {
    if let Some(value) = argument {
        return Ok(ResolvedVersion {
            version: ReleaseVersion::try_from(value)?,
            source: VersionSource::Argument,
        });
    }

    match read_metadata_version(metadata_path)? {
        Some(version) => Ok(ResolvedVersion {
            version,
            source: VersionSource::Metadata,
        }),
        None => Ok(ResolvedVersion {
            version: ReleaseVersion(DEFAULT_VERSION.to_owned()),
            source: VersionSource::Default,
        }),
    }
}

/// Read the `version` field from a `package.json`-style metadata file.
///
/// Returns `Ok(None)` when the file is a JSON object without a `version`
/// field.
///
/// # Errors
///
/// - [`PackagerError::MetadataRead`] if the file cannot be read.
/// - [`PackagerError::MetadataParse`] if it is not valid JSON.
/// - [`PackagerError::InvalidMetadataVersion`] if the top level is not an
///   object, the field is not a string, or the string is not a usable
///   version.
pub fn read_metadata_version(path: &Utf8Path) -> Result<Option<ReleaseVersion>> {
    let contents = fs::read_to_string(path).map_err(|source| PackagerError::MetadataRead {
        path: path.to_owned(),
        source,
    })?;
    let document: Value =
        serde_json::from_str(&contents).map_err(|source| PackagerError::MetadataParse {
            path: path.to_owned(),
            source,
        })?;

    let invalid = |reason: String| PackagerError::InvalidMetadataVersion {
        path: path.to_owned(),
        reason,
    };

    let Value::Object(fields) = document else {
        return Err(invalid("top-level value is not an object".to_owned()));
    };

    match fields.get("version") {
        None => {
            debug!("{path} has no version field");
            Ok(None)
        }
        Some(Value::String(value)) => ReleaseVersion::try_from(value.as_str())
            .map(Some)
            .map_err(|err| invalid(err.to_string())),
        Some(other) => Err(invalid(format!("expected a string, found {other}"))),
    }
}

fn validate_version(value: &str) -> Result<()> {
    let reject = |reason: &str| {
        Err(PackagerError::InvalidVersion {
            value: value.to_owned(),
            reason: reason.to_owned(),
        })
    };

    if value.contains(['/', '\\']) {
        return reject("version must not contain path separators");
    }
    if value.chars().any(char::is_control) {
        return reject("version must not contain control characters");
    }
    Ok(())
}
