// src/manifest.rs

//! Manifest loading
//!
//! A manifest is a YAML mapping with the global settings and a `packages`
//! mapping from package name to [`PackageSpec`]. Package order is preserved.

use crate::error::{Error, Result};
use crate::package::PackageSpec;
use serde::Deserialize;
use serde_yml::{Mapping, Value};
use std::path::Path;
use tracing::debug;

/// Default file name looked up in the current directory
pub const DEFAULT_MANIFEST: &str = "gpm.yaml";

const DEFAULT_STAGING_ROOT: &str = "/tmp/gpm/staging";
const DEFAULT_PACKAGE_DIR: &str = "/tmp/gpm/packages";

/// Settings shared by every package, fixed for the process lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalConfig {
    /// Root for all local checkouts
    pub base_path: String,
    /// Skip the deploy step for every package
    pub build_only: bool,
    /// Never execute, even when asked to run for real
    pub dry_run: bool,
    /// Root of the per-package staging directories used for packaging
    pub staging_root: String,
    /// Where produced packages are written
    pub package_dir: String,
}

#[derive(Deserialize)]
struct RawManifest {
    base_path: Option<String>,
    #[serde(default)]
    build_only: bool,
    #[serde(default)]
    dry_run: bool,
    staging_root: Option<String>,
    package_dir: Option<String>,
    packages: Option<Mapping>,
}

/// A parsed manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    config: GlobalConfig,
    packages: Vec<PackageSpec>,
    raw: Vec<Mapping>,
}

impl Manifest {
    /// Load and parse a manifest file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading manifest from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read manifest {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    /// Parse a manifest from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self> {
        let raw: RawManifest = serde_yml::from_str(contents)
            .map_err(|e| Error::Config(format!("malformed manifest: {e}")))?;

        let base_path = raw
            .base_path
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| Error::Config("missing key `base_path`".to_string()))?;
        let entries = raw
            .packages
            .ok_or_else(|| Error::Config("missing key `packages`".to_string()))?;

        let mut packages = Vec::with_capacity(entries.len());
        let mut fields = Vec::with_capacity(entries.len());
        for (key, value) in &entries {
            let name = key.as_str().ok_or_else(|| {
                Error::Config(format!("package name must be a string, got {key:?}"))
            })?;
            let mapping = value
                .as_mapping()
                .ok_or_else(|| Error::Config(format!("package `{name}` must be a mapping")))?;

            let mut spec: PackageSpec = serde_yml::from_value(value.clone())
                .map_err(|e| Error::Config(format!("package `{name}`: {e}")))?;
            spec.name = name.to_string();

            packages.push(spec);
            fields.push(mapping.clone());
        }

        debug!("Manifest lists {} package(s)", packages.len());

        Ok(Self {
            config: GlobalConfig {
                base_path,
                build_only: raw.build_only,
                dry_run: raw.dry_run,
                staging_root: raw
                    .staging_root
                    .unwrap_or_else(|| DEFAULT_STAGING_ROOT.to_string()),
                package_dir: raw
                    .package_dir
                    .unwrap_or_else(|| DEFAULT_PACKAGE_DIR.to_string()),
            },
            packages,
            raw: fields,
        })
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub fn packages(&self) -> &[PackageSpec] {
        &self.packages
    }

    /// Package names in manifest order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.iter().map(|p| p.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&PackageSpec> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Resolve `names` to specs in the requested order
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&PackageSpec>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name)
                    .ok_or_else(|| Error::UnknownPackage(name.to_string()))
            })
            .collect()
    }

    /// Like [`Manifest::select`], also rejecting specs that cannot be synced
    pub fn select_valid<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&PackageSpec>> {
        let specs = self.select(names)?;
        for spec in &specs {
            spec.validate()?;
        }
        Ok(specs)
    }

    /// The package's fields as written, rendered for display
    pub fn fields(&self, name: &str) -> Result<Vec<(String, String)>> {
        let index = self
            .packages
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| Error::UnknownPackage(name.to_string()))?;

        Ok(self.raw[index]
            .iter()
            .map(|(key, value)| (render(key), render(value)))
            .collect())
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "~".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => format!(
            "[{}]",
            items.iter().map(render).collect::<Vec<_>>().join(", ")
        ),
        Value::Mapping(map) => format!(
            "{{{}}}",
            map.iter()
                .map(|(k, v)| format!("{}: {}", render(k), render(v)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Value::Tagged(tagged) => render(&tagged.value),
    }
}
