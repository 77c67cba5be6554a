//! Abstraction over external command dispatch.
//!
//! Every actuation performed by the [`SystemService`](crate::service::SystemService)
//! ends up as a shell command line (`pactl`, `nmcli`, `systemctl`, ...) handed
//! to a [`CommandExecutor`]. Injecting the executor keeps the service
//! deterministic in tests, and lets the binary run against the
//! [`DryRunExecutor`] on hosts where those tools are missing.

use anyhow::{Context, Result};
use futures::future::{self, BoxFuture, FutureExt};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Outcome of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Output of a command which exited with status 0 and printed nothing.
    pub fn ok() -> Self {
        Self {
            code: Some(0),
            ..Default::default()
        }
    }

    /// Return `true` when the command exited with status 0.
    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Capability to run an opaque command line out-of-band.
///
/// `execute` starts the command before returning. The returned future only
/// reports completion; dropping it does not stop the command. Overlapping
/// invocations carry no ordering guarantee.
#[cfg_attr(test, mockall::automock)]
pub trait CommandExecutor: Send + Sync {
    /// Start `command` and return a future resolving to its outcome.
    fn execute(&self, command: &str) -> BoxFuture<'static, Result<CommandOutput>>;
}

/// Executor running each command line through `sh -c`.
///
/// Command text is never logged here: callers own the (possibly redacted)
/// log form of what they dispatch.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    /// Executor using `shell` as interpreter (invoked as `<shell> -c <command>`).
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new("sh")
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&self, command: &str) -> BoxFuture<'static, Result<CommandOutput>> {
        let spawned = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Spawning {}", self.shell));
        match spawned {
            Ok(child) => async move {
                let output = child
                    .wait_with_output()
                    .await
                    .context("Waiting for command completion")?;
                Ok(CommandOutput {
                    code: output.status.code(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                })
            }
            .boxed(),
            Err(e) => future::ready(Err(e)).boxed(),
        }
    }
}

/// Executor that starts nothing and always reports success.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

impl CommandExecutor for DryRunExecutor {
    fn execute(&self, _command: &str) -> BoxFuture<'static, Result<CommandOutput>> {
        debug!("Dry run: command not started");
        future::ready(Ok(CommandOutput::ok())).boxed()
    }
}
