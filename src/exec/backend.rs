// src/exec/backend.rs

//! Pluggable command runner.
//!
//! Plugins hand a [`CommandLine`] to a [`CommandRunner`] instead of spawning
//! processes themselves, so tests can swap in a runner that records
//! invocations and returns canned exit codes.

use std::fmt;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, info};

/// A test-runner invocation: the configured command string plus the files
/// it should run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Command with its options, e.g. `vendor/bin/phpunit --colors`.
    pub command: String,
    /// Files appended as separate arguments.
    pub files: Vec<String>,
}

impl CommandLine {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            files: Vec::new(),
        }
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files.extend(files.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        for file in &self.files {
            write!(f, " {file}")?;
        }
        Ok(())
    }
}

/// Runs a command to completion and reports its exit code.
///
/// `Err` means the process could not be started or waited on at all.
pub trait CommandRunner {
    fn run(&mut self, cmd: &CommandLine, cwd: &Path) -> io::Result<i32>;
}

/// Production runner: a platform shell with inherited stdio, so the test
/// runner's own output reaches the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn build(cmd: &CommandLine) -> Command {
        if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&cmd.command).args(&cmd.files);
            c
        } else {
            // Files go through "$@" so they are never re-split by the shell.
            let mut c = Command::new("sh");
            c.arg("-c")
                .arg(format!("{} \"$@\"", cmd.command))
                .arg("phpguard")
                .args(&cmd.files);
            c
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&mut self, cmd: &CommandLine, cwd: &Path) -> io::Result<i32> {
        info!(cmd = %cmd, "starting test process");

        let status = Self::build(cmd)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;

        let code = status.code().unwrap_or(-1);
        debug!(cmd = %cmd, exit_code = code, success = status.success(), "test process exited");
        Ok(code)
    }
}
