// src/packaging/fpm.rs

//! RPM packaging through `fpm`

use super::{PackageRequest, Packager};
use crate::executor::{quote, ShellCommand};

/// Builds RPMs from a directory with `fpm -s dir -t rpm`
#[derive(Debug, Clone, Default)]
pub struct Fpm;

impl Packager for Fpm {
    fn command(&self, request: &PackageRequest<'_>) -> ShellCommand {
        let mut line = format!(
            "fpm -s dir -t rpm -n {} -v {} -C {} -p {}",
            quote(request.name),
            quote(request.version),
            quote(&request.source_dir.to_string_lossy()),
            quote(&request.output.to_string_lossy()),
        );
        for entry in request.entries {
            line.push(' ');
            line.push_str(&quote(entry));
        }
        ShellCommand::new(line)
    }
}
