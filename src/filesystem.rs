// src/filesystem.rs

//! Filesystem probes and idempotent directory creation
//!
//! Probes never depend on the execution mode: a dry run takes the same
//! clone/pull decision a real run would, only the resulting commands are
//! suppressed.

use crate::executor::{quote, CommandError, Executor, ShellCommand};
use std::path::Path;
use tracing::debug;

/// Check whether `path` is an existing directory. Never touches the filesystem.
pub fn exists(path: &Path) -> bool {
    path.is_dir()
}

/// Create `path` and its parents unless it already exists
///
/// The creation is issued as `mkdir --parents <path>` through the executor,
/// so a dry run prints it instead of creating anything.
pub fn ensure_directory(exec: &mut dyn Executor, path: &Path) -> Result<(), CommandError> {
    if exists(path) {
        debug!("Directory already present: {}", path.display());
        return Ok(());
    }

    exec.execute(&mkdir_command(path))
}

fn mkdir_command(path: &Path) -> ShellCommand {
    ShellCommand::new(format!(
        "mkdir --parents {}",
        quote(&path.to_string_lossy())
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::{DryRun, Shell};

    #[test]
    fn test_exists_has_no_side_effects() {
        let temp = tempfile::tempdir().unwrap();
        let missing = temp.path().join("missing");

        assert!(exists(temp.path()));
        assert!(!exists(&missing));
        assert!(!missing.exists());
    }

    #[test]
    fn test_exists_rejects_plain_files() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("file");
        std::fs::write(&file, "x").unwrap();

        assert!(!exists(&file));
    }

    #[test]
    fn test_ensure_directory_dry_run_only_prints() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("a/b");
        let mut exec = DryRun::new(Vec::new());

        ensure_directory(&mut exec, &target).unwrap();

        assert!(!target.exists());
        let out = String::from_utf8(exec.into_inner()).unwrap();
        assert_eq!(out, format!("mkdir --parents {}\n", target.display()));
    }

    #[test]
    fn test_ensure_directory_present_is_noop() {
        let temp = tempfile::tempdir().unwrap();
        let mut exec = DryRun::new(Vec::new());

        ensure_directory(&mut exec, temp.path()).unwrap();

        assert!(exec.into_inner().is_empty());
    }

    #[test]
    fn test_ensure_directory_creates_nested_structure() {
        let temp = tempfile::tempdir().unwrap();
        let target = temp.path().join("deeply/nested/dir");
        let mut exec = Shell::new();

        ensure_directory(&mut exec, &target).unwrap();
        ensure_directory(&mut exec, &target).unwrap();

        assert!(target.is_dir());
    }
}
