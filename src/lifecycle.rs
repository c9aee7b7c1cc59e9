// src/lifecycle.rs

//! Package lifecycle engine
//!
//! Each selected package goes through
//!
//! ```text
//! Unsynced -> Synced -> CheckedOut -> Built -> Packaged -> Deployed -> Done
//! ```
//!
//! Build, package and deploy are conditional; sync and checkout always run.
//! Packages are processed one at a time. A failing transition ends that
//! package's lifecycle and the engine moves on to the next package.

use crate::error::{Error, Result};
use crate::executor::{quote, CommandError, Executor, ShellCommand};
use crate::filesystem;
use crate::manifest::GlobalConfig;
use crate::package::{Package, PackageSpec};
use crate::packaging::{self, PackageRequest, Packager};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Lifecycle position of a package
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    Unsynced,
    Synced,
    CheckedOut,
    Built,
    Packaged,
    Deployed,
    Done,
}

/// The transition a command belongs to, used to classify its failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sync,
    Checkout,
    Build,
    Package,
    Deploy,
}

impl Stage {
    fn failure(self, package: &str, source: CommandError) -> Error {
        let package = package.to_string();
        match self {
            Stage::Sync => Error::SyncFailure { package, source },
            Stage::Checkout => Error::CheckoutFailure { package, source },
            Stage::Build => Error::BuildFailure { package, source },
            Stage::Package => Error::PackagingFailure { package, source },
            Stage::Deploy => Error::DeployFailure { package, source },
        }
    }
}

/// Caller choices for an install run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallOptions {
    /// Stop after building; no deploy
    pub build_only: bool,
    /// Prefix the deploy command with `sudo`
    pub with_sudo: bool,
    /// Stage the install and produce an RPM before deploying
    pub package: bool,
    /// Run `make clean` before building
    pub clean: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            build_only: false,
            with_sudo: false,
            package: false,
            clean: true,
        }
    }
}

/// Install switches as given on the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallFlags {
    pub build_only: bool,
    pub for_real: bool,
    pub with_sudo: bool,
    pub rpm: bool,
    pub no_clean: bool,
}

impl InstallOptions {
    /// Combine command-line flags with the manifest's global settings
    ///
    /// Returns the options and whether commands are only printed. Either side
    /// can ask for build-only; the manifest's `dry_run` wins over `--for-real`.
    pub fn resolve(config: &GlobalConfig, flags: InstallFlags) -> (Self, bool) {
        let options = Self {
            build_only: flags.build_only || config.build_only,
            with_sudo: flags.with_sudo,
            package: flags.rpm,
            clean: !flags.no_clean,
        };
        (options, config.dry_run || !flags.for_real)
    }
}

/// Result of driving one package
#[derive(Debug)]
pub struct PackageOutcome {
    pub name: String,
    /// Last state reached; `Done` on success
    pub reached: State,
    /// Package file written by the packaging transition
    pub artifact: Option<PathBuf>,
    pub error: Option<Error>,
}

impl PackageOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcomes of a run, in processing order
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<PackageOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(PackageOutcome::is_success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Error> {
        self.outcomes.iter().filter_map(|o| o.error.as_ref())
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Path> {
        self.outcomes.iter().filter_map(|o| o.artifact.as_deref())
    }
}

/// Drives packages through their lifecycle
pub struct Engine<'a> {
    config: &'a GlobalConfig,
    options: InstallOptions,
    exec: &'a mut dyn Executor,
    packager: &'a dyn Packager,
}

impl<'a> Engine<'a> {
    pub fn new(
        config: &'a GlobalConfig,
        options: InstallOptions,
        exec: &'a mut dyn Executor,
        packager: &'a dyn Packager,
    ) -> Self {
        Self {
            config,
            options,
            exec,
            packager,
        }
    }

    /// Process every package in order, continuing past failures
    pub fn run(&mut self, specs: &[&PackageSpec]) -> RunReport {
        let mut report = RunReport::default();
        for spec in specs {
            report.outcomes.push(self.install(spec));
        }
        report
    }

    /// Drive a single package as far as it goes
    pub fn install(&mut self, spec: &PackageSpec) -> PackageOutcome {
        info!("For package {}...", spec.name);

        let config = self.config;
        let pkg = Package::new(spec, &config.base_path);
        let mut outcome = PackageOutcome {
            name: spec.name.clone(),
            reached: State::Unsynced,
            artifact: None,
            error: None,
        };

        // Empty sync fields would aim every command at the base path itself
        if let Err(e) = spec.validate().and_then(|()| self.drive(&pkg, &mut outcome)) {
            error!("{}", e);
            outcome.error = Some(e);
        }
        outcome
    }

    fn drive(&mut self, pkg: &Package<'_>, outcome: &mut PackageOutcome) -> Result<()> {
        self.sync(pkg)?;
        outcome.reached = State::Synced;

        self.checkout(pkg)?;
        outcome.reached = State::CheckedOut;

        if pkg.is_buildable() {
            self.build(pkg)?;
            outcome.reached = State::Built;
        }

        if self.options.package && pkg.is_installable() {
            outcome.artifact = Some(self.package(pkg)?);
            outcome.reached = State::Packaged;
        }

        if pkg.is_installable() && !self.options.build_only {
            self.deploy(pkg)?;
            outcome.reached = State::Deployed;
        }

        outcome.reached = State::Done;
        Ok(())
    }

    fn run_step(&mut self, stage: Stage, pkg: &Package<'_>, command: ShellCommand) -> Result<()> {
        self.exec
            .execute(&command)
            .map_err(|e| stage.failure(pkg.name(), e))
    }

    fn ensure_directory(&mut self, stage: Stage, pkg: &Package<'_>, dir: &Path) -> Result<()> {
        filesystem::ensure_directory(&mut *self.exec, dir).map_err(|e| stage.failure(pkg.name(), e))
    }

    fn sync(&mut self, pkg: &Package<'_>) -> Result<()> {
        let dir = pkg.local_directory();
        let remote = &pkg.spec().remote;

        if !filesystem::exists(&dir) {
            self.ensure_directory(Stage::Sync, pkg, &dir)?;
        }

        let command = if filesystem::exists(&dir.join(".git")) {
            "git pull".to_string()
        } else {
            format!("git clone {} .", quote(remote))
        };
        self.run_step(Stage::Sync, pkg, ShellCommand::new(command).in_dir(&dir))
    }

    fn checkout(&mut self, pkg: &Package<'_>) -> Result<()> {
        let dir = pkg.local_directory();

        // A clean tree has no stash to drop, so this one may exit non-zero
        self.run_step(
            Stage::Checkout,
            pkg,
            ShellCommand::new("git stash --keep-index && git stash drop")
                .in_dir(&dir)
                .best_effort(),
        )?;
        self.run_step(
            Stage::Checkout,
            pkg,
            ShellCommand::new(format!("git checkout {}", quote(pkg.version()))).in_dir(&dir),
        )
    }

    fn build(&mut self, pkg: &Package<'_>) -> Result<()> {
        let dir = pkg.local_directory();

        if self.options.clean {
            self.run_step(
                Stage::Build,
                pkg,
                ShellCommand::new("make clean").in_dir(&dir).best_effort(),
            )?;
        }

        for command in pkg.preconfigure_commands() {
            self.run_step(Stage::Build, pkg, ShellCommand::new(command.as_str()).in_dir(&dir))?;
        }

        if pkg.needs_autoconf() {
            self.run_step(Stage::Build, pkg, ShellCommand::new("autoconf").in_dir(&dir))?;
        }

        if let Some(configure) = pkg.configure_command() {
            self.run_step(Stage::Build, pkg, ShellCommand::new(configure).in_dir(&dir))?;
        }

        self.run_step(
            Stage::Build,
            pkg,
            ShellCommand::new(pkg.build_command()).in_dir(&dir),
        )
    }

    fn package(&mut self, pkg: &Package<'_>) -> Result<PathBuf> {
        let dir = pkg.local_directory();
        let staging = pkg.staging_directory(&self.config.staging_root);

        self.ensure_directory(Stage::Package, pkg, &staging)?;
        let dest_dir = staging.to_string_lossy().into_owned();
        let staged_install = pkg.install_command(false, Some(dest_dir.as_str()));
        self.run_step(Stage::Package, pkg, ShellCommand::new(staged_install).in_dir(&dir))?;

        let entries = packaging::staged_entries(&staging);
        let package_dir = PathBuf::from(&self.config.package_dir);
        self.ensure_directory(Stage::Package, pkg, &package_dir)?;

        let output = packaging::output_path(&self.config.package_dir, pkg.name(), pkg.version());
        let request = PackageRequest {
            name: pkg.name(),
            version: pkg.version(),
            source_dir: &staging,
            output: &output,
            entries: &entries,
        };
        self.packager
            .package(&mut *self.exec, &request)
            .map_err(|e| Stage::Package.failure(pkg.name(), e))?;

        info!("Packaged {} into {}", pkg.name(), output.display());
        Ok(output)
    }

    fn deploy(&mut self, pkg: &Package<'_>) -> Result<()> {
        let command = pkg.install_command(self.options.with_sudo, None);
        self.run_step(
            Stage::Deploy,
            pkg,
            ShellCommand::new(command).in_dir(pkg.local_directory()),
        )
    }
}
