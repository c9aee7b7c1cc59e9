// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

const INSTALL_NOTE: &str = "A checkout pinned to a tag is left on a detached HEAD, \
    so `git pull` fails the next time that package is installed. Pin `version` \
    to a branch, or remove the checkout to have it cloned again.";

fn packages_arg() -> Arg {
    Arg::new("packages")
        .required(true)
        .num_args(1..)
        .help("Package names")
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .action(ArgAction::SetTrue)
        .help(help)
}

fn build_cli() -> Command {
    Command::new("gpm")
        .version(env!("CARGO_PKG_VERSION"))
        .author("gpm Contributors")
        .about("Source-build package manager driven by a YAML manifest")
        .subcommand_required(false)
        .arg(
            Arg::new("manifest")
                .short('m')
                .long("manifest")
                .value_name("PATH")
                .default_value("gpm.yaml")
                .global(true)
                .help("Manifest path (env: GPM_MANIFEST)"),
        )
        .subcommand(Command::new("list").about("List all packages in the manifest"))
        .subcommand(
            Command::new("info")
                .about("Show the manifest fields of packages")
                .arg(packages_arg()),
        )
        .subcommand(
            Command::new("releases")
                .about("Show the most recent tags of packages' upstream repositories")
                .arg(
                    Arg::new("history-depth")
                        .long("history-depth")
                        .value_name("N")
                        .default_value("5")
                        .help("Number of tags to show per package"),
                )
                .arg(packages_arg()),
        )
        .subcommand(
            Command::new("install")
                .about("Sync, build and install packages (prints the commands unless --for-real)")
                .arg(flag("build-only", "Build without installing"))
                .arg(flag("for-real", "Execute the commands instead of printing them"))
                .arg(flag("with-sudo", "Install with sudo"))
                .arg(flag("rpm", "Produce an RPM from a staged install before installing"))
                .arg(flag("no-clean", "Skip `make clean` before building"))
                .arg(packages_arg())
                .after_help(INSTALL_NOTE),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("gpm.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
