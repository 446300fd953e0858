use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use tracing::debug;

use crate::error::{DripError, Result};
use crate::output::Console;
use crate::types::RunOptions;

pub trait GitRunner {
    /// Run the `git` command within the given `repo` with `args`, capturing its output.
    ///
    /// # Errors
    /// Returns an error if the `git` process cannot be spawned or fails during execution.
    fn run_git(&self, repo: &Path, args: &[&str]) -> std::io::Result<Output>;

    /// Run the `git` command attached to the terminal so it can print and prompt.
    ///
    /// # Errors
    /// Returns an error if the `git` process cannot be spawned.
    fn run_git_attached(&self, repo: &Path, args: &[&str]) -> std::io::Result<ExitStatus>;
}

pub struct DefaultGitRunner;

impl GitRunner for DefaultGitRunner {
    fn run_git(&self, repo: &Path, args: &[&str]) -> std::io::Result<Output> {
        Command::new("git")
            .arg("-C")
            .arg(repo)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
    }

    fn run_git_attached(&self, repo: &Path, args: &[&str]) -> std::io::Result<ExitStatus> {
        Command::new("git")
            .arg("-C")
            .arg(repo)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
    }
}

/// A repository handle that gates every git invocation through the
/// verbosity and dry-run settings.
///
/// Read-only queries go through [`Git::capture`] or [`Git::succeeds`] and are
/// never suppressed by dry-run. Anything that changes the repository must go
/// through [`Git::run`] or [`Git::run_quiet`].
pub struct Git {
    runner: Box<dyn GitRunner>,
    repo: PathBuf,
    options: RunOptions,
    console: Console,
}

impl Git {
    #[must_use]
    pub fn new(
        runner: Box<dyn GitRunner>,
        repo: impl Into<PathBuf>,
        options: RunOptions,
        console: Console,
    ) -> Self {
        Self {
            runner,
            repo: repo.into(),
            options,
            console,
        }
    }

    #[must_use]
    pub fn repo(&self) -> &Path {
        &self.repo
    }

    #[must_use]
    pub const fn options(&self) -> RunOptions {
        self.options
    }

    #[must_use]
    pub const fn console(&self) -> &Console {
        &self.console
    }

    /// Run a read-only query and return its stdout.
    ///
    /// # Errors
    /// `CommandIo` when git cannot be spawned, `CommandFailed` (carrying the
    /// combined stdout and stderr) when it exits non-zero.
    pub fn capture(&self, args: &[&str]) -> Result<String> {
        let command = command_string(args);
        if self.options.verbosity > 1 {
            self.console.errln(&command);
        }
        debug!(%command, "query");
        let out = self
            .runner
            .run_git(&self.repo, args)
            .map_err(|source| DripError::CommandIo {
                command: command.clone(),
                source,
            })?;
        let stdout = String::from_utf8_lossy(&out.stdout).into_owned();
        if out.status.success() {
            return Ok(stdout);
        }
        let mut output = stdout;
        output.push_str(&String::from_utf8_lossy(&out.stderr));
        Err(DripError::CommandFailed {
            command,
            code: out.status.code(),
            output,
        })
    }

    /// Like [`Git::capture`] with surrounding whitespace removed.
    ///
    /// # Errors
    /// Same as [`Git::capture`].
    pub fn capture_trimmed(&self, args: &[&str]) -> Result<String> {
        self.capture(args).map(|s| s.trim().to_string())
    }

    /// Run a read-only query and report only whether it exited zero.
    ///
    /// # Errors
    /// `CommandIo` when git cannot be spawned.
    pub fn succeeds(&self, args: &[&str]) -> Result<bool> {
        match self.capture(args) {
            Ok(_) => Ok(true),
            Err(DripError::CommandFailed { .. }) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Run a mutating command, returning the failure to the caller untouched.
    ///
    /// # Errors
    /// `CommandIo` when git cannot be spawned, `CommandFailed` when it exits non-zero.
    pub fn run_quiet(&self, args: &[&str]) -> Result<()> {
        let command = command_string(args);
        if self.options.verbosity > 0 || self.options.dry_run {
            self.console.errln(&command);
        }
        if self.options.dry_run {
            return Ok(());
        }
        debug!(%command, "run");
        let status = self
            .runner
            .run_git_attached(&self.repo, args)
            .map_err(|source| DripError::CommandIo {
                command: command.clone(),
                source,
            })?;
        if status.success() {
            Ok(())
        } else {
            Err(DripError::CommandFailed {
                command,
                code: status.code(),
                output: String::new(),
            })
        }
    }

    /// Run a mutating command whose failure ends the workflow.
    ///
    /// When commands are not being echoed the failing command line is printed
    /// first so the error has context.
    ///
    /// # Errors
    /// Same as [`Git::run_quiet`].
    pub fn run(&self, args: &[&str]) -> Result<()> {
        self.run_quiet(args).inspect_err(|_| {
            if self.options.verbosity == 0 {
                self.console
                    .errln(&format!("(running: {})", command_string(args)));
            }
        })
    }
}

pub(crate) fn command_string(args: &[&str]) -> String {
    let mut s = String::from("git");
    for arg in args {
        s.push(' ');
        s.push_str(arg);
    }
    s
}
