//! Release packager for PulsoidWidget to OSC.
//!
//! Resolves a release version, copies the release files into a temporary
//! staging folder and zips them into `PulsoidWidget-to-OSC-v<version>.zip`.
//! The `release-packager` binary is a thin wrapper over this library.
//!
//! # Modules
//!
//! - [`archive`] - Zip creation behind a mockable writer trait
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Release configuration and the TOML overlay file
//! - [`error`] - Error type and crate-wide result alias
//! - [`include`] - Include list entries and validation
//! - [`naming`] - Archive file naming
//! - [`output`] - Progress messages and dry-run formatting
//! - [`pipeline`] - Build orchestration and dry-run planning
//! - [`stager`] - Temporary staging folder and file copying
//! - [`version`] - Version validation and resolution

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod include;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod stager;
pub mod version;
