//! Release build orchestration.
//!
//! Stages the include list, replaces any previous archive with the same name
//! and writes the new one. The staging directory is released on every path
//! out of [`build_release_with`].

use crate::archive::{ArchiveWriter, ZipArchiveWriter};
use crate::config::ReleaseConfig;
use crate::error::Result;
use crate::include::{IncludeEntry, Presence};
use crate::naming::ArchiveName;
use crate::output::{
    EntryStatus, build_destination, build_finished, build_size, build_started, write_progress,
};
use crate::stager::StagingArea;
use crate::version::ReleaseVersion;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;
use std::io::{ErrorKind, Write};

/// Result of a successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    /// Absolute path of the written archive.
    pub archive_path: Utf8PathBuf,
    /// Size of the archive in bytes.
    pub size_bytes: u64,
    /// Entries copied into the archive, in include order.
    pub copied: Vec<IncludeEntry>,
    /// Entries skipped because they were missing.
    pub missing: Vec<IncludeEntry>,
    /// Entries skipped because they are neither files nor directories.
    pub skipped: Vec<IncludeEntry>,
}

/// What a build would do, without doing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    /// The archive name.
    pub archive_name: ArchiveName,
    /// Where the archive would be written.
    pub archive_path: Utf8PathBuf,
    /// Each include entry with its current on-disk status.
    pub entries: Vec<(IncludeEntry, EntryStatus)>,
}

/// Build the release archive with the default zip writer.
///
/// # Errors
///
/// See [`build_release_with`].
pub fn build_release(
    version: &ReleaseVersion,
    config: &ReleaseConfig,
    progress: &mut dyn Write,
) -> Result<BuildOutput> {
    build_release_with(version, config, &ZipArchiveWriter, progress)
}

/// Build the release archive using `writer`.
///
/// Missing and special include entries are reported and skipped. Any other
/// failure aborts the build; a partially written archive is left as it is.
///
/// # Errors
///
/// Propagates staging, archive and I/O errors.
pub fn build_release_with(
    version: &ReleaseVersion,
    config: &ReleaseConfig,
    writer: &dyn ArchiveWriter,
    progress: &mut dyn Write,
) -> Result<BuildOutput> {
    let name = ArchiveName::new(config.archive_prefix.clone(), version.clone());
    let stem = name.stem();
    let archive_path = config.archive_path(&name);

    write_progress(progress, build_started(version));
    write_progress(progress, build_destination(&archive_path));

    let staging = StagingArea::create(&stem, config.staging_parent.as_deref())?;
    let report = staging.stage_all(config, progress)?;

    remove_existing_archive(&archive_path)?;
    writer.write_archive(staging.parent(), &stem, &archive_path)?;
    staging.close()?;

    let size_bytes = fs::metadata(&archive_path)?.len();
    write_progress(progress, build_finished(&archive_path));
    write_progress(progress, build_size(size_bytes));

    Ok(BuildOutput {
        archive_path,
        size_bytes,
        copied: report.copied,
        missing: report.missing,
        skipped: report.skipped,
    })
}

/// Describe the build for `version` without touching the filesystem.
#[must_use]
pub fn plan_release(version: &ReleaseVersion, config: &ReleaseConfig) -> ReleasePlan {
    let archive_name = ArchiveName::new(config.archive_prefix.clone(), version.clone());
    let archive_path = config.archive_path(&archive_name);
    let entries = config
        .include
        .iter()
        .map(|entry| {
            let status = match Presence::of(&config.source_path(entry)) {
                Presence::Missing => EntryStatus::Missing,
                Presence::Special => EntryStatus::Special,
                Presence::Found(found) if found == entry.kind => EntryStatus::Present,
                Presence::Found(found) => EntryStatus::KindMismatch(found),
            };
            (entry.clone(), status)
        })
        .collect();

    ReleasePlan {
        archive_name,
        archive_path,
        entries,
    }
}

/// Delete a previous archive at `path`, if there is one.
fn remove_existing_archive(path: &Utf8Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("removed previous archive {path}");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
