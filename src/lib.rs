// src/lib.rs

//! gpm: source-build package manager
//!
//! Reads a YAML manifest of upstream source repositories and, per package,
//! clones or updates the checkout, pins a version, configures, builds and
//! installs it, optionally producing an RPM from a staged install.
//!
//! # Architecture
//!
//! - Manifest: global settings plus one spec per package, resolved into
//!   tagged variants at load time
//! - Descriptor: pure derivations over a spec (commands, flags, paths)
//! - Executor: a dry-run printer or a shell runner, chosen once and injected
//! - Lifecycle: sync, checkout, build, package, deploy, one package at a time
//! - No persisted state: what is on disk is probed afresh on every run

mod error;
pub mod executor;
pub mod filesystem;
pub mod lifecycle;
pub mod manifest;
pub mod package;
pub mod packaging;
pub mod releases;

pub use error::{Error, Result};
pub use executor::{CommandError, DryRun, Executor, Shell, ShellCommand};
pub use lifecycle::{Engine, InstallOptions, RunReport, State};
pub use manifest::{GlobalConfig, Manifest};
pub use package::{Package, PackageSpec};
