// src/executor.rs

//! Command execution
//!
//! Every lifecycle step is expressed as a [`ShellCommand`] and handed to an
//! [`Executor`]. [`DryRun`] writes the command line to an output stream,
//! [`Shell`] runs it through `sh -c` in the command's working directory.
//! Both consume the same rendered line, so what a dry run prints is exactly
//! what a real run executes.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::{debug, warn};

/// A single shell command line with the directory it runs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    line: String,
    dir: Option<PathBuf>,
    best_effort: bool,
}

impl ShellCommand {
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            dir: None,
            best_effort: false,
        }
    }

    /// Run the command with `dir` as its working directory
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// A non-zero exit is logged and otherwise ignored
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    pub fn is_best_effort(&self) -> bool {
        self.best_effort
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

/// Failure of one executed command
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("`{command}` exited with {status}")]
    Exit { command: String, status: ExitStatus },

    #[error("`{command}` could not be run: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

impl CommandError {
    /// The command line that failed
    pub fn command(&self) -> &str {
        match self {
            CommandError::Exit { command, .. } | CommandError::Spawn { command, .. } => command,
        }
    }
}

/// Runs or displays commands
pub trait Executor {
    /// Execute (or display) a command, blocking until it completes
    fn execute(&mut self, command: &ShellCommand) -> Result<(), CommandError>;
}

/// Prints each command line instead of running it
pub struct DryRun<W: Write> {
    out: W,
}

impl DryRun<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> DryRun<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Executor for DryRun<W> {
    fn execute(&mut self, command: &ShellCommand) -> Result<(), CommandError> {
        writeln!(self.out, "{}", command.line()).map_err(|e| CommandError::Spawn {
            command: command.line().to_string(),
            source: e,
        })
    }
}

/// Runs each command line through the host shell
pub struct Shell {
    program: String,
}

impl Shell {
    pub fn new() -> Self {
        Self::with_program("sh")
    }

    /// Use `program` instead of `sh`; it is invoked as `<program> -c <line>`
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for Shell {
    fn execute(&mut self, command: &ShellCommand) -> Result<(), CommandError> {
        let mut process = Command::new(&self.program);
        process.arg("-c").arg(command.line());
        if let Some(dir) = command.dir() {
            process.current_dir(dir);
        }

        debug!(
            "Running `{}` in {}",
            command.line(),
            command
                .dir()
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| ".".to_string())
        );

        let status = process.status().map_err(|e| CommandError::Spawn {
            command: command.line().to_string(),
            source: e,
        })?;

        if status.success() {
            return Ok(());
        }

        if command.is_best_effort() {
            warn!("`{}` exited with {}, continuing", command.line(), status);
            return Ok(());
        }

        Err(CommandError::Exit {
            command: command.line().to_string(),
            status,
        })
    }
}

/// Records every command line before handing it to the wrapped executor
pub struct Transcript<E> {
    inner: E,
    lines: Vec<String>,
}

impl<E: Executor> Transcript<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            lines: Vec::new(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_parts(self) -> (E, Vec<String>) {
        (self.inner, self.lines)
    }
}

impl<E: Executor> Executor for Transcript<E> {
    fn execute(&mut self, command: &ShellCommand) -> Result<(), CommandError> {
        self.lines.push(command.line().to_string());
        self.inner.execute(command)
    }
}

/// Quote a single argument for the shell.
/// Arguments without shell metacharacters are returned unchanged.
pub fn quote(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", arg.replace('\'', "'\\''"))
}
