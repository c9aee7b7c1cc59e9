// src/error.rs

use crate::executor::CommandError;
use thiserror::Error;

/// Core error types for gpm
#[derive(Error, Debug)]
pub enum Error {
    /// Manifest missing, malformed, or missing a required key
    #[error("Configuration error: {0}")]
    Config(String),

    /// Package name not present in the manifest
    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    /// Clone or pull failed
    #[error("Sync failed for {package}: {source}")]
    SyncFailure {
        package: String,
        #[source]
        source: CommandError,
    },

    /// Ref not found, or the local changes could not be discarded
    #[error("Checkout failed for {package}: {source}")]
    CheckoutFailure {
        package: String,
        #[source]
        source: CommandError,
    },

    #[error("Build failed for {package}: {source}")]
    BuildFailure {
        package: String,
        #[source]
        source: CommandError,
    },

    #[error("Packaging failed for {package}: {source}")]
    PackagingFailure {
        package: String,
        #[source]
        source: CommandError,
    },

    #[error("Deploy failed for {package}: {source}")]
    DeployFailure {
        package: String,
        #[source]
        source: CommandError,
    },

    /// Produced package artifact could not be read back
    #[error("Failed to inspect package {path}: {reason}")]
    Inspect { path: String, reason: String },

    /// Tag listing of a remote failed
    #[error("Failed to list releases of {remote}: {reason}")]
    Releases { remote: String, reason: String },
}

impl Error {
    /// Package an error refers to, if it is a per-package failure
    pub fn package(&self) -> Option<&str> {
        match self {
            Error::UnknownPackage(name) => Some(name),
            Error::SyncFailure { package, .. }
            | Error::CheckoutFailure { package, .. }
            | Error::BuildFailure { package, .. }
            | Error::PackagingFailure { package, .. }
            | Error::DeployFailure { package, .. } => Some(package),
            _ => None,
        }
    }

    /// The command line that failed, for stage failures
    pub fn command(&self) -> Option<&str> {
        match self {
            Error::SyncFailure { source, .. }
            | Error::CheckoutFailure { source, .. }
            | Error::BuildFailure { source, .. }
            | Error::PackagingFailure { source, .. }
            | Error::DeployFailure { source, .. } => Some(source.command()),
            _ => None,
        }
    }
}

/// Result type alias using gpm's Error type
pub type Result<T> = std::result::Result<T, Error>;
