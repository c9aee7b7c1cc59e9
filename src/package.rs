// src/package.rs

//! Package specifications and the descriptor derived from them
//!
//! Manifest fields that accept several shapes (`build: false`, a flag list, a
//! `flags:` mapping, ...) are resolved into [`Toggle`] and [`Configure`] when
//! the manifest is loaded, so nothing downstream inspects raw YAML.

use crate::error::{Error, Result};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yml::Value;
use std::path::PathBuf;

/// Placeholder in configure flags replaced by the manifest's `base_path`
pub const BASE_PATH_TOKEN: &str = "#{base_path}";

/// An on/off manifest switch. Only an explicit `false` disables it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Toggle {
    #[default]
    Enabled,
    Disabled,
}

impl Toggle {
    pub fn is_enabled(self) -> bool {
        self == Toggle::Enabled
    }
}

impl<'de> Deserialize<'de> for Toggle {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Bool(false) => Toggle::Disabled,
            _ => Toggle::Enabled,
        })
    }
}

/// How `./configure` runs for a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Configure {
    /// `configure: false`
    Disabled,
    /// Run with these flags (possibly none)
    Flags(Vec<String>),
}

impl Default for Configure {
    fn default() -> Self {
        Configure::Flags(Vec::new())
    }
}

impl<'de> Deserialize<'de> for Configure {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match &value {
            Value::Bool(false) => Ok(Configure::Disabled),
            Value::Sequence(items) => flag_list(items)
                .map(Configure::Flags)
                .map_err(D::Error::custom),
            Value::Mapping(_) => match value.get("flags") {
                Some(Value::Sequence(items)) => {
                    flag_list(items).map(Configure::Flags).map_err(D::Error::custom)
                }
                Some(Value::Null) | None => Ok(Configure::default()),
                Some(_) => Err(D::Error::custom("`configure.flags` must be a sequence")),
            },
            Value::String(flag) => Ok(Configure::Flags(vec![flag.clone()])),
            _ => Ok(Configure::default()),
        }
    }
}

fn flag_list(items: &[Value]) -> std::result::Result<Vec<String>, String> {
    items
        .iter()
        .map(|item| {
            scalar(item).ok_or_else(|| format!("configure flag must be a scalar, got {item:?}"))
        })
        .collect()
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Null => Ok(Vec::new()),
        Value::String(command) => Ok(vec![command.clone()]),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| D::Error::custom("preconfigure entries must be strings"))
            })
            .collect(),
        _ => Err(D::Error::custom("`preconfigure` must be a string or a sequence of strings")),
    }
}

/// One named package entry from the manifest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageSpec {
    /// Manifest key; filled in by the loader
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub local: String,
    #[serde(default)]
    pub remote: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub build: Toggle,
    #[serde(default)]
    pub install: Toggle,
    #[serde(default)]
    pub configure: Configure,
    #[serde(default, deserialize_with = "one_or_many")]
    pub preconfigure: Vec<String>,
    #[serde(default)]
    pub needs_autoconf: bool,
    #[serde(default)]
    pub alternate_build: Option<String>,
    #[serde(default)]
    pub alternate_install: Option<String>,
}

impl PackageSpec {
    /// Check the fields a sync and checkout cannot do without
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("local", &self.local),
            ("remote", &self.remote),
            ("version", &self.version),
        ] {
            if value.trim().is_empty() {
                return Err(Error::Config(format!(
                    "package `{}` is missing `{}`",
                    self.name, key
                )));
            }
        }
        Ok(())
    }
}

/// Derived view of a [`PackageSpec`] against a base path. No I/O.
#[derive(Debug, Clone, Copy)]
pub struct Package<'a> {
    spec: &'a PackageSpec,
    base_path: &'a str,
}

impl<'a> Package<'a> {
    pub fn new(spec: &'a PackageSpec, base_path: &'a str) -> Self {
        Self { spec, base_path }
    }

    pub fn spec(&self) -> &'a PackageSpec {
        self.spec
    }

    pub fn name(&self) -> &'a str {
        &self.spec.name
    }

    pub fn version(&self) -> &'a str {
        &self.spec.version
    }

    pub fn is_buildable(&self) -> bool {
        self.spec.build.is_enabled()
    }

    pub fn is_installable(&self) -> bool {
        self.spec.install.is_enabled()
    }

    pub fn is_configurable(&self) -> bool {
        !matches!(self.spec.configure, Configure::Disabled)
    }

    pub fn configure_flags(&self) -> &'a [String] {
        match &self.spec.configure {
            Configure::Flags(flags) => flags,
            Configure::Disabled => &[],
        }
    }

    pub fn needs_preconfigure(&self) -> bool {
        !self.spec.preconfigure.is_empty()
    }

    pub fn needs_autoconf(&self) -> bool {
        self.spec.needs_autoconf
    }

    pub fn preconfigure_commands(&self) -> &'a [String] {
        &self.spec.preconfigure
    }

    /// `./configure` with the flags joined and `#{base_path}` substituted
    pub fn configure_command(&self) -> Option<String> {
        if !self.is_configurable() {
            return None;
        }

        let mut command = String::from("./configure");
        for flag in self.configure_flags() {
            command.push(' ');
            command.push_str(&flag.replace(BASE_PATH_TOKEN, self.base_path));
        }
        Some(command)
    }

    pub fn build_command(&self) -> String {
        self.spec
            .alternate_build
            .clone()
            .unwrap_or_else(|| "make".to_string())
    }

    pub fn install_command(&self, with_sudo: bool, dest_dir: Option<&str>) -> String {
        let base = self.spec.alternate_install.as_deref().unwrap_or("make install");
        let mut command = if with_sudo {
            format!("sudo {base}")
        } else {
            base.to_string()
        };
        if let Some(dest) = dest_dir {
            command.push_str(" DESTDIR=");
            command.push_str(dest);
        }
        command
    }

    pub fn local_directory(&self) -> PathBuf {
        PathBuf::from(join(self.base_path, &self.spec.local))
    }

    /// Staging directory for this package under `staging_root`
    pub fn staging_directory(&self, staging_root: &str) -> PathBuf {
        PathBuf::from(join(staging_root, &self.spec.local))
    }
}

fn join(root: &str, relative: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), relative.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(yaml: &str) -> PackageSpec {
        let mut spec: PackageSpec = serde_yml::from_str(yaml).unwrap();
        spec.name = "test".to_string();
        spec
    }

    #[test]
    fn test_defaults_enable_everything() {
        let spec = spec("local: foo\nremote: http://x/foo.git\nversion: v1\n");
        let pkg = Package::new(&spec, "/opt");

        assert!(pkg.is_buildable());
        assert!(pkg.is_installable());
        assert!(pkg.is_configurable());
        assert!(!pkg.needs_preconfigure());
        assert!(pkg.configure_flags().is_empty());
        assert_eq!(pkg.configure_command().as_deref(), Some("./configure"));
    }

    #[test]
    fn test_only_explicit_false_disables() {
        // Absence, `true`, null and non-boolean values all leave the step enabled
        let disabled = spec("build: false\ninstall: false\n");
        let pkg = Package::new(&disabled, "/opt");
        assert!(!pkg.is_buildable());
        assert!(!pkg.is_installable());

        let other = spec("build: ~\ninstall: \"no\"\n");
        let pkg = Package::new(&other, "/opt");
        assert!(pkg.is_buildable());
        assert!(pkg.is_installable());

        let explicit = spec("build: true\ninstall: true\n");
        let pkg = Package::new(&explicit, "/opt");
        assert!(pkg.is_buildable());
        assert!(pkg.is_installable());
    }

    #[test]
    fn test_configure_false() {
        let spec = spec("configure: false\n");
        let pkg = Package::new(&spec, "/opt");

        assert!(!pkg.is_configurable());
        assert!(pkg.configure_flags().is_empty());
        assert_eq!(pkg.configure_command(), None);
    }

    #[test]
    fn test_configure_flag_forms() {
        let list = spec("configure: [\"--prefix=/usr\", \"--enable-shared\"]\n");
        assert_eq!(
            Package::new(&list, "/opt").configure_command().as_deref(),
            Some("./configure --prefix=/usr --enable-shared")
        );

        let mapping = spec("configure:\n  flags:\n    - --prefix=/usr\n");
        assert_eq!(
            Package::new(&mapping, "/opt").configure_flags(),
            ["--prefix=/usr".to_string()]
        );

        let bare = spec("configure: true\n");
        assert_eq!(bare.configure, Configure::Flags(vec![]));
    }

    #[test]
    fn test_configure_rejects_nested_flags() {
        let result: std::result::Result<PackageSpec, _> =
            serde_yml::from_str("configure: [[\"--a\"]]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_base_path_substitution() {
        let spec = spec(
            "configure: [\"--with-lib=#{base_path}/lib\", \"--prefix=#{base_path}\"]\n",
        );
        let pkg = Package::new(&spec, "/opt");

        assert_eq!(
            pkg.configure_command().as_deref(),
            Some("./configure --with-lib=/opt/lib --prefix=/opt")
        );
    }

    #[test]
    fn test_install_command_variants() {
        let spec = spec("local: foo\n");
        let pkg = Package::new(&spec, "/opt");

        assert_eq!(pkg.install_command(false, None), "make install");
        assert!(pkg.install_command(true, None).starts_with("sudo "));
        assert!(pkg
            .install_command(false, Some("/tmp/x"))
            .ends_with(" DESTDIR=/tmp/x"));
        assert_eq!(
            pkg.install_command(true, Some("/tmp/x")),
            "sudo make install DESTDIR=/tmp/x"
        );
    }

    #[test]
    fn test_alternate_commands() {
        let spec =
            spec("alternate_build: ninja -C build\nalternate_install: ninja -C build install\n");
        let pkg = Package::new(&spec, "/opt");

        assert_eq!(pkg.build_command(), "ninja -C build");
        assert_eq!(pkg.install_command(true, None), "sudo ninja -C build install");
    }

    #[test]
    fn test_local_directory() {
        let spec = spec("local: foo\n");
        assert_eq!(
            Package::new(&spec, "/opt").local_directory(),
            PathBuf::from("/opt/foo")
        );
        assert_eq!(
            Package::new(&spec, "/opt/").local_directory(),
            PathBuf::from("/opt/foo")
        );
        assert_eq!(
            Package::new(&spec, "/opt").staging_directory("/tmp/gpm/staging"),
            PathBuf::from("/tmp/gpm/staging/foo")
        );
    }

    #[test]
    fn test_preconfigure_forms() {
        let single = spec("preconfigure: ./bootstrap\n");
        assert_eq!(single.preconfigure, vec!["./bootstrap".to_string()]);

        let list = spec("preconfigure: [\"./autogen.sh\", \"libtoolize\"]\n");
        let pkg = Package::new(&list, "/opt");
        assert!(pkg.needs_preconfigure());
        assert_eq!(pkg.preconfigure_commands().len(), 2);

        let empty = spec("preconfigure: []\n");
        assert!(!Package::new(&empty, "/opt").needs_preconfigure());
    }

    #[test]
    fn test_validate_requires_sync_fields() {
        let spec = spec("local: foo\nversion: v1\n");
        let err = spec.validate().unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("remote"));
    }
}
