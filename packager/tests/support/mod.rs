//! Test support utilities for release packager behavioural tests.
//!
//! Builds throwaway widget checkouts inside a temporary directory and reads
//! back the archives produced from them.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{self, File};
use tempfile::TempDir;

/// A widget source tree at `<root>/widget` inside a temporary directory.
///
/// Archives land in `root`, the parent of the base directory.
pub struct Checkout {
    _temp: TempDir,
    root: Utf8PathBuf,
}

impl Checkout {
    /// Create an empty checkout. `root` is canonical so it compares equal to
    /// paths reported by the packager.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf())
            .expect("utf-8 temp dir")
            .canonicalize_utf8()
            .expect("canonical temp dir");
        fs::create_dir_all(root.join("widget")).expect("create base dir");
        Self { _temp: temp, root }
    }

    /// Directory holding the archives.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// The widget source directory.
    pub fn base(&self) -> Utf8PathBuf {
        self.root.join("widget")
    }

    /// Write `contents` to `relative` under the base directory, creating
    /// parent directories.
    pub fn write_file(&self, relative: &str, contents: &str) {
        let path = self.base().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write checkout file");
    }

    /// Remove a file from the base directory.
    pub fn remove_file(&self, relative: &str) {
        fs::remove_file(self.base().join(relative)).expect("remove checkout file");
    }

    /// Where the default-named archive for `version` is written.
    pub fn archive_path(&self, version: &str) -> Utf8PathBuf {
        self.root
            .join(format!("PulsoidWidget-to-OSC-v{version}.zip"))
    }
}

/// List the file entries of an archive relative to its top-level folder,
/// sorted. Directory entries are left out.
pub fn archived_files(path: &Utf8Path) -> Vec<String> {
    let archive =
        zip::ZipArchive::new(File::open(path).expect("open archive")).expect("read archive");
    let mut files: Vec<String> = archive
        .file_names()
        .filter(|name| !name.ends_with('/'))
        .map(|name| {
            name.split_once('/')
                .map_or(name, |(_, rest)| rest)
                .to_owned()
        })
        .collect();
    files.sort();
    files
}
