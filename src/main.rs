// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use gpm::lifecycle::{Engine, InstallFlags, InstallOptions};
use gpm::manifest::{Manifest, DEFAULT_MANIFEST};
use gpm::packaging::{self, Fpm};
use gpm::releases::{self, DEFAULT_HISTORY_DEPTH};
use gpm::{DryRun, Executor, Shell};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};

const INSTALL_NOTE: &str = "A checkout pinned to a tag is left on a detached HEAD, \
    so `git pull` fails the next time that package is installed. Pin `version` \
    to a branch, or remove the checkout to have it cloned again.";

#[derive(Parser)]
#[command(name = "gpm")]
#[command(
    author,
    version,
    about = "Source-build package manager driven by a YAML manifest",
    long_about = None
)]
struct Cli {
    /// Manifest path
    #[arg(short, long, global = true, env = "GPM_MANIFEST", default_value = DEFAULT_MANIFEST)]
    manifest: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all packages in the manifest
    List,
    /// Show the manifest fields of packages
    Info {
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Show the most recent tags of packages' upstream repositories
    Releases {
        /// Number of tags to show per package
        #[arg(long, default_value_t = DEFAULT_HISTORY_DEPTH)]
        history_depth: usize,
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Sync, build and install packages (prints the commands unless --for-real)
    #[command(after_help = INSTALL_NOTE)]
    Install {
        /// Build without installing
        #[arg(long)]
        build_only: bool,
        /// Execute the commands instead of printing them
        #[arg(long)]
        for_real: bool,
        /// Install with sudo
        #[arg(long)]
        with_sudo: bool,
        /// Produce an RPM from a staged install before installing
        #[arg(long)]
        rpm: bool,
        /// Skip `make clean` before building
        #[arg(long)]
        no_clean: bool,
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: clap_complete::Shell,
    },
}

fn main() -> ExitCode {
    // Initialize tracing subscriber for logging; stdout carries the command stream
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Some(Commands::List) => {
            let manifest = Manifest::load(&cli.manifest)?;
            for name in manifest.names() {
                println!("{}", name);
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Info { packages }) => {
            let manifest = Manifest::load(&cli.manifest)?;
            manifest.select(&packages)?;

            for (index, name) in packages.iter().enumerate() {
                if index > 0 {
                    println!();
                }
                let fields = manifest.fields(name)?;
                let width = fields.iter().map(|(key, _)| key.len()).max().unwrap_or(0);

                println!("{}:", name);
                for (key, value) in &fields {
                    println!("  {key:>width$}: {value}");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Releases {
            history_depth,
            packages,
        }) => {
            let manifest = Manifest::load(&cli.manifest)?;
            let specs = manifest.select(&packages)?;

            let mut failed = false;
            for spec in specs {
                match releases::releases(&spec.remote, history_depth) {
                    Ok(tags) => {
                        println!("{}:", spec.name);
                        for tag in tags {
                            println!("  {}", tag);
                        }
                    }
                    Err(e) => {
                        eprintln!("Error: {e}");
                        failed = true;
                    }
                }
            }
            Ok(if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Some(Commands::Install {
            build_only,
            for_real,
            with_sudo,
            rpm,
            no_clean,
            packages,
        }) => {
            let manifest = Manifest::load(&cli.manifest)?;
            let config = manifest.config();

            // Structural checks happen before anything runs
            let specs = manifest.select_valid(&packages)?;

            if for_real && config.dry_run {
                warn!("Manifest sets dry_run; printing commands instead of running them");
            }
            let flags = InstallFlags {
                build_only,
                for_real,
                with_sudo,
                rpm,
                no_clean,
            };
            let (options, dry_run) = InstallOptions::resolve(config, flags);

            let mut exec: Box<dyn Executor> = if dry_run {
                Box::new(DryRun::stdout())
            } else {
                Box::new(Shell::new())
            };
            let report = Engine::new(config, options, exec.as_mut(), &Fpm).run(&specs);

            if !dry_run {
                for artifact in report.artifacts() {
                    match packaging::rpm::inspect(artifact) {
                        Ok(summary) => println!(
                            "Packaged {} {} ({} files) at {}\n  sha256: {}",
                            summary.name,
                            summary.version,
                            summary.files,
                            artifact.display(),
                            summary.sha256
                        ),
                        Err(e) => warn!("{}", e),
                    }
                }
            }

            let failures: Vec<_> = report.failures().collect();
            if failures.is_empty() {
                info!("All {} package(s) processed", report.outcomes.len());
                return Ok(ExitCode::SUCCESS);
            }

            for failure in &failures {
                eprintln!("Error: {failure}");
            }
            eprintln!(
                "{} of {} package(s) failed",
                failures.len(),
                report.outcomes.len()
            );
            Ok(ExitCode::FAILURE)
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "gpm", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            // No command provided, show help
            println!("gpm v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'gpm --help' for usage information");
            Ok(ExitCode::SUCCESS)
        }
    }
}
