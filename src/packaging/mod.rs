// src/packaging/mod.rs

//! Packaging support for gpm
//!
//! A build is installed into a staging directory, whose top-level entries are
//! handed to an external packaging tool. Each tool implements the
//! [`Packager`] trait; [`fpm::Fpm`] produces RPMs. Produced RPMs can be read
//! back with [`rpm::inspect`].

pub mod fpm;
pub mod rpm;

use crate::executor::{CommandError, Executor, ShellCommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub use fpm::Fpm;

/// Everything a packaging tool needs to produce one package
#[derive(Debug, Clone, Copy)]
pub struct PackageRequest<'a> {
    pub name: &'a str,
    pub version: &'a str,
    /// Staged install tree
    pub source_dir: &'a Path,
    /// Package file to write
    pub output: &'a Path,
    /// Top-level entries of `source_dir` to include
    pub entries: &'a [String],
}

/// Common interface for external packaging tools
pub trait Packager {
    /// The command line producing the package described by `request`
    fn command(&self, request: &PackageRequest<'_>) -> ShellCommand;

    /// Produce the package through `exec`
    fn package(
        &self,
        exec: &mut dyn Executor,
        request: &PackageRequest<'_>,
    ) -> Result<(), CommandError> {
        exec.execute(&self.command(request))
    }
}

/// Sorted top-level entries of a staged directory
///
/// A missing or unreadable directory yields no entries; packaging an empty
/// tree is allowed.
pub fn staged_entries(dir: &Path) -> Vec<String> {
    let Ok(read_dir) = fs::read_dir(dir) else {
        debug!("No staged entries at {}", dir.display());
        return Vec::new();
    };

    let mut entries: Vec<String> = read_dir
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .filter(|name| name != "." && name != "..")
        .collect();
    entries.sort();
    entries
}

/// File the package for `name`/`version` is written to
pub fn output_path(package_dir: &str, name: &str, version: &str) -> PathBuf {
    Path::new(package_dir).join(format!("{name}-{version}.rpm"))
}
