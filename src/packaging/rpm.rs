// src/packaging/rpm.rs

//! Reading back RPMs produced by a packaging run

use crate::error::{Error, Result};
use rpm::Package;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Summary of a produced RPM
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpmArtifact {
    pub name: String,
    pub version: String,
    pub release: Option<String>,
    pub architecture: Option<String>,
    /// Number of file entries in the payload
    pub files: usize,
    /// SHA-256 of the whole package file
    pub sha256: String,
}

/// Parse the RPM at `path` and summarize it
pub fn inspect(path: &Path) -> Result<RpmArtifact> {
    debug!("Inspecting RPM package: {}", path.display());

    let bytes = fs::read(path).map_err(|e| Error::Inspect {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let sha256 = format!("{:x}", Sha256::digest(&bytes));

    let fail = |reason: String| Error::Inspect {
        path: path.display().to_string(),
        reason,
    };

    let mut reader = bytes.as_slice();
    let pkg = Package::parse(&mut reader).map_err(|e| fail(format!("not a valid RPM: {e}")))?;

    let name = pkg
        .metadata
        .get_name()
        .map_err(|e| fail(format!("missing package name: {e}")))?
        .to_string();
    let version = pkg
        .metadata
        .get_version()
        .map_err(|e| fail(format!("missing package version: {e}")))?
        .to_string();
    let release = pkg.metadata.get_release().ok().map(|s| s.to_string());
    let architecture = pkg.metadata.get_arch().ok().map(|s| s.to_string());
    let files = pkg
        .metadata
        .get_file_entries()
        .map(|entries| entries.len())
        .unwrap_or(0);

    debug!("Parsed RPM: {} version {} ({} files)", name, version, files);

    Ok(RpmArtifact {
        name,
        version,
        release,
        architecture,
        files,
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_nonexistent_file() {
        let result = inspect(Path::new("/nonexistent/file.rpm"));
        assert!(matches!(result, Err(Error::Inspect { .. })));
    }

    #[test]
    fn test_inspect_rejects_non_rpm() {
        let temp_file = tempfile::NamedTempFile::with_suffix(".rpm").unwrap();
        fs::write(temp_file.path(), b"definitely not an rpm").unwrap();

        let err = inspect(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("not a valid RPM"));
    }
}
