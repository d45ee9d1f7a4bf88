//! CLI argument definitions for the release packager.
//!
//! Kept apart from the entrypoint so parsing can be tested without running a
//! build.

use camino::Utf8PathBuf;
use clap::Parser;

/// Build a release zip for PulsoidWidget to OSC.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "release-packager")]
#[command(version, about)]
#[command(long_about = concat!(
    "Build a release zip for PulsoidWidget to OSC.\n\n",
    "The listed release files are copied into a temporary folder named after ",
    "the release and zipped into PulsoidWidget-to-OSC-v<VERSION>.zip, written ",
    "next to the source directory. Listed files that do not exist are reported ",
    "and skipped.\n\n",
    "When VERSION is omitted it is read from the `version` field of ",
    "package.json, falling back to 0.0.0 when the field is absent.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Package the version recorded in package.json:\n",
    "    $ release-packager\n\n",
    "  Package an explicit version:\n",
    "    $ release-packager 1.2.0\n\n",
    "  Package another checkout into a dist folder:\n",
    "    $ release-packager --base-dir ../widget --output-dir ../dist\n\n",
    "  Preview the include list without writing anything:\n",
    "    $ release-packager --dry-run",
))]
pub struct Cli {
    /// Release version, used verbatim [default: from package.json].
    #[arg(id = "release_version", value_name = "VERSION")]
    pub version: Option<String>,

    /// Directory holding the release sources [default: current directory].
    #[arg(short, long, value_name = "DIR")]
    pub base_dir: Option<Utf8PathBuf>,

    /// Directory the archive is written to [default: parent of base dir].
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,

    /// TOML file overriding the archive prefix, metadata file or include list.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Show the resolved release and exit without building.
    #[arg(long)]
    pub dry_run: bool,

    /// Suppress progress output (errors and the archive path still shown).
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
