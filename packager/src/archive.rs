//! Zip archive creation.
//!
//! The archive holds a single top-level folder (the staged release folder)
//! with directory entries, `/` separators, deflate compression and each
//! file's modification time and Unix permissions.

use crate::error::{PackagerError, Result};
use camino::Utf8Path;
use chrono::{Datelike, Local, Timelike};
use log::trace;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Writes a staged release folder into an archive, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArchiveWriter {
    /// Archive `root_dir/base_name` into `destination`.
    ///
    /// Entry names are relative to `root_dir`, so every entry starts with
    /// `base_name/`.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Archive`] or [`PackagerError::Io`] when the
    /// archive cannot be written.
    fn write_archive(&self, root_dir: &Utf8Path, base_name: &str, destination: &Utf8Path)
    -> Result<()>;
}

/// Default writer producing deflate-compressed zip files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveWriter;

impl ArchiveWriter for ZipArchiveWriter {
    fn write_archive(
        &self,
        root_dir: &Utf8Path,
        base_name: &str,
        destination: &Utf8Path,
    ) -> Result<()> {
        create_zip(root_dir, base_name, destination)
    }
}

/// Create a zip archive of `root_dir/base_name` at `destination`.
///
/// An existing file at `destination` is truncated. On failure the partially
/// written file is left in place.
///
/// # Errors
///
/// Returns [`PackagerError::Archive`] for zip encoding failures,
/// [`PackagerError::NonUtf8Path`] for entries that cannot be named in the
/// archive, and [`PackagerError::Io`] for read failures.
pub fn create_zip(root_dir: &Utf8Path, base_name: &str, destination: &Utf8Path) -> Result<()> {
    let archive_err = |source: zip::result::ZipError| PackagerError::Archive {
        path: destination.to_owned(),
        source,
    };

    let file = File::create(destination).map_err(|e| archive_err(e.into()))?;
    let mut writer = ZipWriter::new(file);
    let base_dir = root_dir.join(base_name);

    for entry in WalkDir::new(&base_dir).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let name = entry_name(root_dir.as_std_path(), entry.path())?;
        let metadata = entry.metadata().map_err(io::Error::from)?;
        let options = entry_options(&metadata);

        if metadata.is_dir() {
            trace!("adding directory {name}/");
            writer
                .add_directory(format!("{name}/"), options)
                .map_err(archive_err)?;
        } else if metadata.is_file() {
            trace!("adding file {name}");
            writer.start_file(name, options).map_err(archive_err)?;
            let mut reader = File::open(entry.path())?;
            io::copy(&mut reader, &mut writer).map_err(|e| archive_err(e.into()))?;
        }
    }

    writer.finish().map_err(archive_err)?;
    Ok(())
}

/// Build a `/`-separated archive name for `path` relative to `root`.
fn entry_name(root: &Path, path: &Path) -> Result<String> {
    let non_utf8 = || PackagerError::NonUtf8Path {
        path: path.to_path_buf(),
    };
    let relative = path.strip_prefix(root).map_err(|_| non_utf8())?;
    let parts = relative
        .components()
        .map(|component| component.as_os_str().to_str().ok_or_else(non_utf8))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("/"))
}

fn entry_options(metadata: &fs::Metadata) -> SimpleFileOptions {
    let mut options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    if let Some(timestamp) = metadata.modified().ok().and_then(zip_timestamp) {
        options = options.last_modified_time(timestamp);
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options = options.unix_permissions(metadata.permissions().mode() & 0o7777);
    }
    options
}

/// Convert a modification time to a zip timestamp in local time.
///
/// Returns `None` for times the zip format cannot represent (before 1980 or
/// after 2107).
fn zip_timestamp(time: SystemTime) -> Option<zip::DateTime> {
    let local = chrono::DateTime::<Local>::from(time);
    zip::DateTime::from_date_and_time(
        u16::try_from(local.year()).ok()?,
        u8::try_from(local.month()).ok()?,
        u8::try_from(local.day()).ok()?,
        u8::try_from(local.hour()).ok()?,
        u8::try_from(local.minute()).ok()?,
        u8::try_from(local.second()).ok()?,
    )
    .ok()
}
