// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Spawning the regeneration build.
//!
//! [`BuildInvoker::run`] never fails: spawn errors, non-zero exits and
//! shutdown cancellation all become a failed [`BuildOutcome`], so the watch
//! loop keeps running after a broken regeneration.

use crate::error::{TypegenError, TypegenResult};
use crate::options::{BuildCommand, PluginConfig};
use crate::report;
use crate::server::wait_closed;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command as TokioCommand;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Result of one regeneration build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Whether the build exited with status zero.
    pub succeeded: bool,
    /// Captured diagnostics for failed builds.
    pub diagnostic: Option<String>,
    /// Wall-clock duration of the invocation.
    pub elapsed: Duration,
}

impl BuildOutcome {
    fn success(elapsed: Duration) -> Self {
        Self {
            succeeded: true,
            diagnostic: None,
            elapsed,
        }
    }

    fn failure(diagnostic: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            succeeded: false,
            diagnostic: Some(diagnostic.into()),
            elapsed,
        }
    }

    /// Converts a failed outcome into a [`TypegenError::BuildInvocation`].
    pub fn into_result(self) -> TypegenResult<Duration> {
        if self.succeeded {
            return Ok(self.elapsed);
        }
        Err(TypegenError::BuildInvocation(
            self.diagnostic
                .unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}

/// Spawns the host build tool in typegen mode.
#[derive(Debug, Clone)]
pub struct BuildInvoker {
    command: BuildCommand,
    cwd: PathBuf,
}

impl BuildInvoker {
    /// Creates an invoker running `command` inside `cwd`.
    pub fn new(command: BuildCommand, cwd: impl Into<PathBuf>) -> Self {
        Self {
            command,
            cwd: cwd.into(),
        }
    }

    /// Creates an invoker from a plugin configuration.
    pub fn from_config(config: &PluginConfig) -> Self {
        Self::new(config.build_command.clone(), config.cwd())
    }

    /// Command this invoker runs.
    pub fn command(&self) -> &BuildCommand {
        &self.command
    }

    /// Runs the build to completion, or until `shutdown` fires.
    ///
    /// On shutdown the child process is killed. There is no other timeout.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> BuildOutcome {
        let start = Instant::now();

        let mut cmd = TokioCommand::new(&self.command.program);
        cmd.args(&self.command.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                return BuildOutcome::failure(
                    format!("Failed to spawn `{}`: {}", self.command, e),
                    start.elapsed(),
                )
            }
        };

        tokio::select! {
            output = child.wait_with_output() => match output {
                Ok(output) if output.status.success() => BuildOutcome::success(start.elapsed()),
                Ok(output) => BuildOutcome::failure(
                    diagnostic_text(&output.stdout, &output.stderr, output.status.code()),
                    start.elapsed(),
                ),
                Err(e) => BuildOutcome::failure(
                    format!("Failed to wait for `{}`: {}", self.command, e),
                    start.elapsed(),
                ),
            },
            _ = wait_closed(shutdown) => {
                BuildOutcome::failure("Cancelled by server shutdown", start.elapsed())
            }
        }
    }

    /// Runs the build as a background task and reports its outcome.
    pub fn spawn(&self, shutdown: watch::Receiver<bool>) -> JoinHandle<BuildOutcome> {
        let invoker = self.clone();
        tokio::spawn(async move {
            report::regenerating(&invoker.command);
            let outcome = invoker.run(shutdown).await;
            report::build_outcome(&outcome);
            outcome
        })
    }
}

/// Picks the most useful diagnostic from a finished process.
///
/// Prefers stderr when non-empty, then stdout, then the exit status.
pub fn diagnostic_text(stdout: &[u8], stderr: &[u8], code: Option<i32>) -> String {
    let stderr = String::from_utf8_lossy(stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    let stdout = String::from_utf8_lossy(stdout);
    if !stdout.trim().is_empty() {
        return stdout.trim().to_string();
    }
    match code {
        Some(code) => format!("Exited with status {}", code),
        None => "Terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::ServerHandle;

    #[test]
    fn test_diagnostic_prefers_stderr() {
        assert_eq!(diagnostic_text(b"out", b"err\n", Some(1)), "err");
        assert_eq!(diagnostic_text(b"out\n", b"  \n", Some(1)), "out");
        assert_eq!(diagnostic_text(b"", b"", Some(3)), "Exited with status 3");
        assert_eq!(diagnostic_text(b"", b"", None), "Terminated by signal");
    }

    #[cfg(unix)]
    fn sh(script: &str) -> BuildInvoker {
        BuildInvoker::new(BuildCommand::new("sh", ["-c", script]), std::env::temp_dir())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_success() {
        let server = ServerHandle::new();
        let outcome = sh("exit 0").run(server.subscribe()).await;
        assert!(outcome.succeeded);
        assert_eq!(outcome.diagnostic, None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failure_captures_stderr() {
        let server = ServerHandle::new();
        let outcome = sh("echo noise; echo 'boom' >&2; exit 3")
            .run(server.subscribe())
            .await;
        assert!(!outcome.succeeded);
        assert_eq!(outcome.diagnostic.as_deref(), Some("boom"));

        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.to_string(), "Build invocation failed: boom");
    }

    #[tokio::test]
    async fn test_spawn_error_is_an_outcome() {
        let server = ServerHandle::new();
        let invoker = BuildInvoker::new(
            BuildCommand::new("hono-typegen-no-such-program", ["build"]),
            std::env::temp_dir(),
        );
        let outcome = invoker.run(server.subscribe()).await;
        assert!(!outcome.succeeded);
        assert!(outcome
            .diagnostic
            .unwrap()
            .contains("hono-typegen-no-such-program"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_overlapping_builds_both_report() {
        let dir = tempfile::tempdir().unwrap();
        let invoker = BuildInvoker::new(
            BuildCommand::new("sh", ["-c", "echo start >> log; sleep 0.3; echo end >> log"]),
            dir.path(),
        );
        let server = ServerHandle::new();

        let first = invoker.spawn(server.subscribe());
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = invoker.spawn(server.subscribe());

        let first = first.await.unwrap();
        let second = second.await.unwrap();
        assert!(first.succeeded, "{:?}", first);
        assert!(second.succeeded, "{:?}", second);

        let log = std::fs::read_to_string(dir.path().join("log")).unwrap();
        assert_eq!(log.lines().collect::<Vec<_>>(), ["start", "start", "end", "end"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_shutdown_cancels_running_build() {
        let server = ServerHandle::new();
        let handle = sh("sleep 30").spawn(server.subscribe());

        tokio::time::sleep(Duration::from_millis(100)).await;
        server.close();

        let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("cancelled build should finish promptly")
            .unwrap();
        assert!(!outcome.succeeded);
        assert_eq!(outcome.diagnostic.as_deref(), Some("Cancelled by server shutdown"));
    }
}
