//! Staging of release files.
//!
//! A [`StagingArea`] owns a fresh temporary directory containing a single
//! folder named after the archive stem. Include entries are copied into that
//! folder with their timestamps and permissions. The temporary directory is
//! removed when the area is dropped, whichever way the build ends.

use crate::config::ReleaseConfig;
use crate::error::{PackagerError, Result};
use crate::include::{IncludeEntry, IncludeKind, Presence};
use crate::output::{
    entry_copied, entry_kind_changed, entry_missing, entry_special, write_progress,
};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace, warn};
use std::fs::{self, File, FileTimes, Metadata};
use std::io::{self, Write};
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

/// Prefix for staging directories created under the temporary directory.
const STAGING_PREFIX: &str = "release-packager-";

/// What happened to one include entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// The entry was copied as what it is on disk.
    Copied {
        /// Kind found on disk, which may differ from the declared kind.
        kind: IncludeKind,
        /// Number of regular files copied.
        files: usize,
    },
    /// The entry does not exist in the base directory and was skipped.
    Missing,
    /// The entry is neither a file nor a directory and was skipped.
    Special,
}

/// Summary of a staging pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Entries copied into the staging folder, in include order.
    pub copied: Vec<IncludeEntry>,
    /// Entries skipped because they do not exist.
    pub missing: Vec<IncludeEntry>,
    /// Entries skipped because they are neither files nor directories.
    pub skipped: Vec<IncludeEntry>,
}

/// A temporary staging directory holding one release folder.
#[derive(Debug)]
pub struct StagingArea {
    temp_dir: TempDir,
    parent: Utf8PathBuf,
    root: Utf8PathBuf,
}

impl StagingArea {
    /// Create a staging area whose release folder is named `stem`.
    ///
    /// The temporary directory is created under `within` when given, and
    /// under the system temporary directory otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Io`] if the directories cannot be created and
    /// [`PackagerError::NonUtf8Path`] if the temporary path is not UTF-8.
    pub fn create(stem: &str, within: Option<&Utf8Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_PREFIX);
        let temp_dir = match within {
            Some(dir) => builder.tempdir_in(dir)?,
            None => builder.tempdir()?,
        };

        let parent = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).map_err(|err| {
            PackagerError::NonUtf8Path {
                path: err.into_path_buf(),
            }
        })?;
        let root = parent.join(stem);
        fs::create_dir(&root)?;
        debug!("staging release in {root}");

        Ok(Self {
            temp_dir,
            parent,
            root,
        })
    }

    /// Return the temporary directory holding the release folder.
    #[must_use]
    pub fn parent(&self) -> &Utf8Path {
        &self.parent
    }

    /// Return the release folder that include entries are copied into.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Copy one include entry from `source` into the release folder.
    ///
    /// The entry is copied according to what `source` is on disk, whatever
    /// kind it was declared with.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::CopyFailed`] or [`PackagerError::Io`] when
    /// copying fails.
    pub fn stage_entry(&self, source: &Utf8Path, entry: &IncludeEntry) -> Result<StageOutcome> {
        let found = match Presence::of(source) {
            Presence::Missing => return Ok(StageOutcome::Missing),
            Presence::Special => {
                warn!("skipping special file {source}");
                return Ok(StageOutcome::Special);
            }
            Presence::Found(kind) => kind,
        };

        let destination = self.root.join(&entry.path);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }

        let files = match found {
            IncludeKind::Directory => copy_tree(source.as_std_path(), destination.as_std_path())?,
            IncludeKind::File => {
                copy_file(source.as_std_path(), destination.as_std_path())?;
                1
            }
        };
        Ok(StageOutcome::Copied { kind: found, files })
    }

    /// Stage every include entry of `config`, reporting progress to `progress`.
    ///
    /// Missing and special entries are reported and skipped. An entry found
    /// with another kind than declared is reported and copied as found. Any
    /// other failure stops the pass.
    ///
    /// # Errors
    ///
    /// Propagates the first error from [`Self::stage_entry`].
    pub fn stage_all(&self, config: &ReleaseConfig, progress: &mut dyn Write) -> Result<StageReport> {
        let mut report = StageReport::default();
        for entry in &config.include {
            let source = config.source_path(entry);
            match self.stage_entry(&source, entry)? {
                StageOutcome::Copied { kind, files } => {
                    if kind != entry.kind {
                        write_progress(progress, entry_kind_changed(entry, kind));
                    }
                    debug!("staged {} ({files} file(s))", entry.path);
                    write_progress(progress, entry_copied(&entry.path, kind));
                    report.copied.push(entry.clone());
                }
                StageOutcome::Missing => {
                    write_progress(progress, entry_missing(entry));
                    report.missing.push(entry.clone());
                }
                StageOutcome::Special => {
                    write_progress(progress, entry_special(entry));
                    report.skipped.push(entry.clone());
                }
            }
        }
        Ok(report)
    }

    /// Remove the staging directory, surfacing any removal error.
    ///
    /// Dropping the area also removes it, silently.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Io`] if the directory cannot be removed.
    pub fn close(self) -> Result<()> {
        debug!("removing staging directory {}", self.parent);
        self.temp_dir.close()?;
        Ok(())
    }
}

/// Copy a regular file, then carry over its timestamps and permissions.
fn copy_file(from: &Path, to: &Path) -> Result<()> {
    let copy_failed = |source: io::Error| PackagerError::CopyFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    let mut reader = File::open(from).map_err(copy_failed)?;
    let metadata = reader.metadata().map_err(copy_failed)?;
    let mut writer = File::create(to).map_err(copy_failed)?;
    io::copy(&mut reader, &mut writer).map_err(copy_failed)?;
    writer
        .set_times(file_times(&metadata).map_err(copy_failed)?)
        .map_err(copy_failed)?;
    drop(writer);
    fs::set_permissions(to, metadata.permissions()).map_err(copy_failed)?;
    trace!("copied {} -> {}", from.display(), to.display());
    Ok(())
}

/// Copy a directory tree, following symlinks. Returns the number of files.
///
/// Directories are visited after their contents so their timestamps are set
/// once nothing else will be written into them.
fn copy_tree(from: &Path, to: &Path) -> Result<usize> {
    let mut files = 0;
    let walker = WalkDir::new(from)
        .follow_links(true)
        .sort_by_file_name()
        .contents_first(true);
    for entry in walker {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|err| io::Error::other(err.to_string()))?;
        let target = to.join(relative);
        let file_type = entry.file_type();
        let copy_failed = |source: io::Error| PackagerError::CopyFailed {
            from: entry.path().to_path_buf(),
            to: target.clone(),
            source,
        };

        if file_type.is_dir() {
            fs::create_dir_all(&target).map_err(copy_failed)?;
            let metadata = entry.metadata().map_err(io::Error::from)?;
            copy_dir_stat(&metadata, &target).map_err(copy_failed)?;
        } else if file_type.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(copy_failed)?;
            }
            copy_file(entry.path(), &target)?;
            files += 1;
        } else {
            warn!("skipping special file {}", entry.path().display());
        }
    }
    Ok(files)
}

/// Carry a directory's permissions and timestamps over to `to`.
#[cfg(unix)]
fn copy_dir_stat(metadata: &Metadata, to: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    // The owner keeps full access so the staging area stays removable.
    let mode = metadata.permissions().mode() | 0o700;
    fs::set_permissions(to, fs::Permissions::from_mode(mode))?;
    File::open(to)?.set_times(file_times(metadata)?)
}

#[cfg(not(unix))]
fn copy_dir_stat(_metadata: &Metadata, to: &Path) -> io::Result<()> {
    trace!("directory timestamps are not carried over for {}", to.display());
    Ok(())
}

fn file_times(metadata: &Metadata) -> io::Result<FileTimes> {
    let mut times = FileTimes::new().set_modified(metadata.modified()?);
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    Ok(times)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use std::time::{Duration, SystemTime};

    struct Sandbox {
        _temp: TempDir,
        base: Utf8PathBuf,
        scratch: Utf8PathBuf,
    }

    #[fixture]
    fn sandbox() -> Sandbox {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("utf-8 temp dir");
        let base = root.join("base");
        let scratch = root.join("scratch");
        fs::create_dir_all(&base).expect("create base");
        fs::create_dir_all(&scratch).expect("create scratch");
        Sandbox {
            _temp: temp,
            base,
            scratch,
        }
    }

    #[rstest]
    fn create_makes_named_release_folder(sandbox: Sandbox) {
        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        assert!(area.root().is_dir());
        assert_eq!(area.root().file_name(), Some("Widget-v1.0.0"));
        assert_eq!(area.root().parent(), Some(area.parent()));
        assert!(area.parent().starts_with(&sandbox.scratch));
    }

    #[rstest]
    fn drop_removes_staging_directory(sandbox: Sandbox) {
        let parent = {
            let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
            area.parent().to_owned()
        };
        assert!(!parent.exists());
    }

    #[rstest]
    fn close_removes_staging_directory(sandbox: Sandbox) {
        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        let parent = area.parent().to_owned();
        area.close().expect("close");
        assert!(!parent.exists());
    }

    #[rstest]
    fn file_copy_preserves_contents_and_mtime(sandbox: Sandbox) {
        let source = sandbox.base.join("README.md");
        fs::write(&source, "# Widget").expect("write source");
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        File::options()
            .write(true)
            .open(&source)
            .expect("open source")
            .set_modified(mtime)
            .expect("set mtime");

        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        let outcome = area
            .stage_entry(&source, &IncludeEntry::file("README.md"))
            .expect("stage");
        assert_eq!(
            outcome,
            StageOutcome::Copied {
                kind: IncludeKind::File,
                files: 1
            }
        );

        let staged = area.root().join("README.md");
        assert_eq!(fs::read_to_string(&staged).expect("read staged"), "# Widget");
        let staged_mtime = fs::metadata(&staged)
            .expect("staged metadata")
            .modified()
            .expect("staged mtime");
        assert_eq!(staged_mtime, mtime);
    }

    #[cfg(unix)]
    #[rstest]
    fn file_copy_preserves_permissions(sandbox: Sandbox) {
        use std::os::unix::fs::PermissionsExt;

        let source = sandbox.base.join("run.sh");
        fs::write(&source, "#!/bin/sh\n").expect("write source");
        fs::set_permissions(&source, fs::Permissions::from_mode(0o555)).expect("chmod");

        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        area.stage_entry(&source, &IncludeEntry::file("run.sh"))
            .expect("stage read-only file");

        let mode = fs::metadata(area.root().join("run.sh"))
            .expect("staged metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o555);
    }

    #[rstest]
    fn directory_copy_is_recursive(sandbox: Sandbox) {
        let code = sandbox.base.join("code");
        fs::create_dir_all(code.join("lib/nested")).expect("create tree");
        fs::create_dir_all(code.join("empty")).expect("create empty dir");
        fs::write(code.join("index.js"), "main").expect("write index");
        fs::write(code.join("lib/osc.js"), "osc").expect("write osc");
        fs::write(code.join("lib/nested/deep.js"), "deep").expect("write deep");

        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        let outcome = area
            .stage_entry(&code, &IncludeEntry::directory("code"))
            .expect("stage");
        assert_eq!(
            outcome,
            StageOutcome::Copied {
                kind: IncludeKind::Directory,
                files: 3
            }
        );

        let staged = area.root().join("code");
        assert_eq!(
            fs::read_to_string(staged.join("lib/nested/deep.js")).expect("read deep"),
            "deep"
        );
        assert!(staged.join("empty").is_dir());
    }

    #[rstest]
    fn missing_entry_is_skipped(sandbox: Sandbox) {
        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        let outcome = area
            .stage_entry(&sandbox.base.join("code"), &IncludeEntry::directory("code"))
            .expect("missing entries are not errors");
        assert_eq!(outcome, StageOutcome::Missing);
        assert!(!area.root().join("code").exists());
    }

    #[rstest]
    #[case::file_declared_as_directory(IncludeEntry::directory("LICENSE"), IncludeKind::File)]
    #[case::directory_declared_as_file(IncludeEntry::file("LICENSE"), IncludeKind::Directory)]
    fn entries_are_copied_as_found(
        sandbox: Sandbox,
        #[case] entry: IncludeEntry,
        #[case] on_disk: IncludeKind,
    ) {
        let source = sandbox.base.join("LICENSE");
        match on_disk {
            IncludeKind::Directory => {
                fs::create_dir(&source).expect("create dir");
                fs::write(source.join("MIT.txt"), "MIT").expect("write nested file");
            }
            IncludeKind::File => fs::write(&source, "MIT").expect("write file"),
        }

        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        let outcome = area.stage_entry(&source, &entry).expect("stage as found");

        assert_eq!(
            outcome,
            StageOutcome::Copied {
                kind: on_disk,
                files: 1
            }
        );
        assert_eq!(
            Presence::of(&area.root().join("LICENSE")),
            Presence::Found(on_disk)
        );
    }

    #[rstest]
    fn stage_all_warns_about_kind_changes(sandbox: Sandbox) {
        fs::write(sandbox.base.join("code"), "not a directory").expect("write code file");
        let mut config = ReleaseConfig::new(sandbox.base.clone(), sandbox.scratch.clone());
        config.include = vec![IncludeEntry::directory("code")];

        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        let mut progress = Vec::new();
        let report = area.stage_all(&config, &mut progress).expect("stage all");

        assert_eq!(report.copied, vec![IncludeEntry::directory("code")]);
        let text = String::from_utf8(progress).expect("utf-8 progress");
        assert_eq!(
            text,
            "[WARN] Expected code to be a directory, found a file\n[OK] Copied file: code\n"
        );
        assert!(area.root().join("code").is_file());
    }

    #[cfg(unix)]
    #[rstest]
    fn special_files_are_skipped_without_opening(sandbox: Sandbox) {
        let fifo = sandbox.base.join("run.bat");
        let c_path = std::ffi::CString::new(fifo.as_str()).expect("no interior nul");
        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o644) };
        assert_eq!(rc, 0, "mkfifo failed");
        let mut config = ReleaseConfig::new(sandbox.base.clone(), sandbox.scratch.clone());
        config.include = vec![IncludeEntry::file("run.bat")];

        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        let mut progress = Vec::new();
        let report = area.stage_all(&config, &mut progress).expect("stage all");

        assert_eq!(report.skipped, vec![IncludeEntry::file("run.bat")]);
        assert!(report.copied.is_empty());
        assert!(!area.root().join("run.bat").exists());
        let text = String::from_utf8(progress).expect("utf-8 progress");
        assert_eq!(text, "[WARN] Skipped, not a file or directory: run.bat\n");
    }

    #[cfg(unix)]
    #[rstest]
    fn directory_copy_preserves_directory_mtime_and_mode(sandbox: Sandbox) {
        use std::os::unix::fs::PermissionsExt;

        let code = sandbox.base.join("code");
        fs::create_dir_all(code.join("lib")).expect("create tree");
        fs::write(code.join("lib/osc.js"), "osc").expect("write osc");
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_500_000_000);
        for dir in [code.join("lib"), code.clone()] {
            File::open(&dir)
                .expect("open dir")
                .set_modified(mtime)
                .expect("set dir mtime");
        }
        fs::set_permissions(&code, fs::Permissions::from_mode(0o750)).expect("chmod");

        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        area.stage_entry(&code, &IncludeEntry::directory("code"))
            .expect("stage");

        for dir in ["code", "code/lib"] {
            let staged = fs::metadata(area.root().join(dir)).expect("staged metadata");
            assert_eq!(staged.modified().expect("staged mtime"), mtime, "{dir}");
        }
        let mode = fs::metadata(area.root().join("code"))
            .expect("staged metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[rstest]
    fn stage_all_reports_progress_in_order(sandbox: Sandbox) {
        fs::write(sandbox.base.join("README.md"), "readme").expect("write readme");
        let mut config = ReleaseConfig::new(sandbox.base.clone(), sandbox.scratch.clone());
        config.include = vec![IncludeEntry::directory("code"), IncludeEntry::file("README.md")];

        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        let mut progress = Vec::new();
        let report = area.stage_all(&config, &mut progress).expect("stage all");

        assert_eq!(report.copied, vec![IncludeEntry::file("README.md")]);
        assert_eq!(report.missing, vec![IncludeEntry::directory("code")]);
        let text = String::from_utf8(progress).expect("utf-8 progress");
        assert_eq!(text, "[WARN] Missing: code\n[OK] Copied file: README.md\n");
    }

    #[cfg(unix)]
    #[rstest]
    fn unreadable_file_is_a_copy_error(sandbox: Sandbox) {
        use std::os::unix::fs::PermissionsExt;

        // Root reads files regardless of mode.
        if unsafe { libc::geteuid() } == 0 {
            return;
        }

        let source = sandbox.base.join("widget_id.txt.template");
        fs::write(&source, "id").expect("write source");
        fs::set_permissions(&source, fs::Permissions::from_mode(0o000)).expect("chmod");

        let area = StagingArea::create("Widget-v1.0.0", Some(&sandbox.scratch)).expect("create");
        let err = area
            .stage_entry(&source, &IncludeEntry::file("widget_id.txt.template"))
            .expect_err("source is unreadable");
        assert!(matches!(err, PackagerError::CopyFailed { .. }));
    }
}
