// file: src/vbox/runner.rs
// version: 1.0.0
// guid: e2a58c07-6f1b-4d93-b4e0-19c7a3d6f52b

//! Process invocation of the VBoxManage executable

use crate::error::{VBoxError, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs VBoxManage with an argument vector and waits for it to exit
#[derive(Debug, Clone)]
pub struct CommandRunner {
    program: PathBuf,
}

impl CommandRunner {
    /// Create a runner for the given executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Path or bare name of the executable being run
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, args: &[String]) -> Command {
        debug!("Running {} {:?}", self.program.display(), args);
        let mut cmd = Command::new(&self.program);
        cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> VBoxError {
        VBoxError::Spawn {
            program: self.program.display().to_string(),
            source,
        }
    }

    /// Run with output passed through to our own stdout/stderr.
    ///
    /// Succeeds only when the process exits with code 0.
    pub async fn run(&self, args: &[String]) -> Result<()> {
        let status = self
            .command(args)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !status.success() {
            return Err(VBoxError::command_failed(args, status.code(), ""));
        }

        Ok(())
    }

    /// Run and return the captured standard output.
    ///
    /// Stderr is captured as well and attached to the error on failure.
    pub async fn run_output(&self, args: &[String]) -> Result<String> {
        let output = self
            .command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(VBoxError::command_failed(
                args,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Run with all output discarded and return the raw exit code.
    ///
    /// Only failure to launch is an error here; interpreting the code is up
    /// to the caller. A process killed by a signal has no exit code.
    pub async fn status(&self, args: &[String]) -> Result<Option<i32>> {
        let status = self
            .command(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;

        Ok(status.code())
    }
}
