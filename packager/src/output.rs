//! Progress and summary output for the packager CLI.
//!
//! Progress lines carry a bracketed tag (`[BUILD]`, `[OK]`, `[WARN]`,
//! `[INFO]`). They are written on a best-effort basis: a closed or failing
//! sink never aborts a build.

use crate::include::{IncludeEntry, IncludeKind};
use crate::version::{ReleaseVersion, ResolvedVersion, VersionSource};
use camino::Utf8Path;
use std::fmt::Write as _;
use std::io::Write;

/// Write one progress line, ignoring write failures.
pub fn write_progress(sink: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(sink, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}

/// First line of a build.
#[must_use]
pub fn build_started(version: &ReleaseVersion) -> String {
    format!("[BUILD] Creating release v{version}")
}

/// Announce where the archive will be written.
#[must_use]
pub fn build_destination(archive_path: &Utf8Path) -> String {
    format!("[BUILD] Output: {archive_path}")
}

/// Report a copied include entry, naming the kind that was copied.
#[must_use]
pub fn entry_copied(path: &Utf8Path, kind: IncludeKind) -> String {
    match kind {
        IncludeKind::Directory => format!("[OK] Copied directory: {path}"),
        IncludeKind::File => format!("[OK] Copied file: {path}"),
    }
}

/// Report a skipped include entry.
#[must_use]
pub fn entry_missing(entry: &IncludeEntry) -> String {
    format!("[WARN] Missing: {}", entry.path)
}

/// Report an include entry found with a different kind than declared.
#[must_use]
pub fn entry_kind_changed(entry: &IncludeEntry, found: IncludeKind) -> String {
    format!(
        "[WARN] Expected {} to be a {}, found a {found}",
        entry.path, entry.kind
    )
}

/// Report an include entry that is neither a file nor a directory.
#[must_use]
pub fn entry_special(entry: &IncludeEntry) -> String {
    format!("[WARN] Skipped, not a file or directory: {}", entry.path)
}

/// Report the finished archive.
#[must_use]
pub fn build_finished(archive_path: &Utf8Path) -> String {
    format!("[BUILD] Done! Created: {archive_path}")
}

/// Report the archive size.
#[must_use]
pub fn build_size(size_bytes: u64) -> String {
    format!("[BUILD] Size: {} KB", format_kilobytes(size_bytes))
}

/// Describe a version that did not come from the command line.
///
/// Returns `None` for versions supplied as an argument.
#[must_use]
pub fn version_notice(resolved: &ResolvedVersion, metadata_path: &Utf8Path) -> Option<String> {
    match resolved.source {
        VersionSource::Argument => None,
        VersionSource::Metadata => Some(format!(
            "[INFO] No version specified, using {metadata_path}: v{}",
            resolved.version
        )),
        VersionSource::Default => Some(format!(
            "[INFO] No version specified and {metadata_path} has none, using v{}",
            resolved.version
        )),
    }
}

/// Format a byte count as kibibytes with one decimal place, rounding half up.
///
/// # Examples
///
/// ```
/// use release_packager::output::format_kilobytes;
///
/// assert_eq!(format_kilobytes(1536), "1.5");
/// assert_eq!(format_kilobytes(0), "0.0");
/// ```
#[must_use]
pub fn format_kilobytes(size_bytes: u64) -> String {
    let tenths = (u128::from(size_bytes) * 20 + 1024) / 2048;
    format!("{}.{}", tenths / 10, tenths % 10)
}

/// On-disk status of an include entry, as shown by a dry run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Exists with the declared kind.
    Present,
    /// Does not exist; would be skipped with a warning.
    Missing,
    /// Exists with a different kind; copied as what it is.
    KindMismatch(IncludeKind),
    /// Neither a file nor a directory; would be skipped with a warning.
    Special,
}

/// Format the dry-run report.
#[must_use]
pub fn format_plan(
    version: &ReleaseVersion,
    archive_path: &Utf8Path,
    entries: &[(IncludeEntry, EntryStatus)],
) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Dry run - no files will be modified");
    let _ = writeln!(text);
    let _ = writeln!(text, "Version: {version}");
    let _ = writeln!(text, "Archive: {archive_path}");
    let _ = writeln!(text);
    let _ = writeln!(text, "Include list:");
    for (entry, status) in entries {
        let status = match status {
            EntryStatus::Present => "present".to_owned(),
            EntryStatus::Missing => "missing, will be skipped".to_owned(),
            EntryStatus::KindMismatch(found) => format!("is a {found}, will be copied as one"),
            EntryStatus::Special => "not a file or directory, will be skipped".to_owned(),
        };
        let _ = writeln!(text, "  - {} ({}): {status}", entry.path, entry.kind);
    }
    text.trim_end().to_owned()
}
