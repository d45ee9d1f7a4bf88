//! Release packager CLI entrypoint.
//!
//! Progress goes to stderr. On success the absolute archive path is the only
//! line written to stdout, so scripts can capture it.

use camino::Utf8PathBuf;
use clap::Parser;
use release_packager::cli::Cli;
use release_packager::config::{ConfigFile, ReleaseConfig};
use release_packager::error::{PackagerError, Result};
use release_packager::output::{format_plan, version_notice};
use release_packager::pipeline::{build_release, plan_release};
use release_packager::version::resolve_version;
use std::io::{self, Write};

fn main() {
    let cli = Cli::parse();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();
    let run_result = run(&cli, &mut stdout, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stdout: &mut dyn Write, stderr: &mut dyn Write) -> Result<()> {
    let config = load_config(cli)?;
    let resolved = resolve_version(cli.version.as_deref(), &config.metadata_path())?;

    let notice = version_notice(&resolved, &config.metadata_path()).filter(|_| !cli.quiet);
    if let Some(notice) = notice {
        write_stderr_line(stderr, notice);
    }

    if cli.dry_run {
        let plan = plan_release(&resolved.version, &config);
        write_stderr_line(
            stderr,
            format_plan(&resolved.version, &plan.archive_path, &plan.entries),
        );
        return Ok(());
    }

    let mut sink = io::sink();
    let progress: &mut dyn Write = if cli.quiet { &mut sink } else { stderr };
    let output = build_release(&resolved.version, &config, progress)?;
    writeln!(stdout, "{}", output.archive_path)?;
    Ok(())
}

/// Resolves directories and applies the optional configuration file.
fn load_config(cli: &Cli) -> Result<ReleaseConfig> {
    let base_dir = match &cli.base_dir {
        Some(dir) => dir.clone(),
        None => current_dir()?,
    };
    let mut config = ReleaseConfig::resolve(&base_dir, cli.output_dir.as_deref())?;

    if let Some(path) = &cli.config {
        let file = ConfigFile::load(path)?;
        config.apply(file, path)?;
    }

    Ok(config)
}

fn current_dir() -> Result<Utf8PathBuf> {
    let cwd = std::env::current_dir()?;
    Utf8PathBuf::try_from(cwd).map_err(|err| PackagerError::NonUtf8Path {
        path: err.into_path_buf(),
    })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("[ERROR] {err}"));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort; ignore write failures.
    }
}
