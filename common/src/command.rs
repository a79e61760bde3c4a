//! Bounded subprocess execution.
//!
//! Both services shell out to external tooling (the site-management
//! executable, `docker-compose`, `docker exec`). Every invocation goes
//! through [`CommandRunner::run`]: arguments are passed as a discrete argv
//! (never formatted into a shell string), output is always captured, and the
//! wall-clock timeout is enforced by killing the process.

use core::time::Duration;
use std::path::PathBuf;
use std::process::Stdio;

use futures::future::BoxFuture;
use thiserror::Error as ThisError;
use tokio::time::timeout;
use tracing::debug;

/// Outcome of one finished subprocess.
///
/// A non-zero exit is not an error: the exit code and captured output are
/// still returned so callers can report the tool's own failure verbatim.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Human-readable rendering of the invocation, for reporting only.
    pub command: String,
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
    /// Exit code, when the process exited normally.
    pub exit_code: Option<i32>,
    /// Whether the process exited with status zero.
    pub success: bool,
}

impl CommandResult {
    /// Iterate over the lines of captured stdout.
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines()
    }

    /// Stdout and stderr concatenated, for passthrough responses.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Errors for invocations that produced no usable result.
///
/// Tool failures (non-zero exit) are *not* represented here; those come back
/// as a [`CommandResult`] with `success == false`.
#[derive(Debug, ThisError)]
pub enum RunError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("`{command}` did not finish within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("failed to collect output of `{command}`: {source}")]
    Output {
        command: String,
        source: std::io::Error,
    },
}

/// Executes a program with arguments under a hard timeout.
///
/// Object-safe so request handlers can hold an `Arc<dyn CommandRunner>` and
/// tests can substitute a scripted mock.
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args`, waiting at most `timeout` for completion.
    ///
    /// # Errors
    ///
    /// Returns [`RunError`] if the process could not be spawned, its output
    /// could not be collected, or the timeout elapsed (the process is killed
    /// in that case). A process that ran to completion is always `Ok`.
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [String],
        timeout: Duration,
    ) -> BoxFuture<'a, Result<CommandResult, RunError>>;
}

/// [`CommandRunner`] backed by [`tokio::process::Command`].
#[derive(Debug, Clone, Default)]
pub struct ToolRunner {
    /// Working directory for spawned processes, when set.
    workdir: Option<PathBuf>,
}

impl ToolRunner {
    /// Create a runner that spawns processes in the inherited working directory.
    pub const fn new() -> Self {
        Self { workdir: None }
    }

    /// Create a runner that spawns processes in `workdir`.
    pub fn with_workdir(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(workdir.into()),
        }
    }
}

/// Rendering of an argv for log lines and error messages.
fn render(program: &str, args: &[String]) -> String {
    let mut rendered = String::from(program);
    for arg in args {
        rendered.push(' ');
        rendered.push_str(arg);
    }
    rendered
}

impl CommandRunner for ToolRunner {
    fn run<'a>(
        &'a self,
        program: &'a str,
        args: &'a [String],
        deadline: Duration,
    ) -> BoxFuture<'a, Result<CommandResult, RunError>> {
        Box::pin(async move {
            let command = render(program, args);
            debug!(%command, ?deadline, "Spawning subprocess");

            let mut cmd = tokio::process::Command::new(program);
            cmd.args(args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                // Dropping the child (e.g. when the timeout elapses) must
                // terminate it; a site operation may never outlive its request.
                .kill_on_drop(true);
            if let Some(ref dir) = self.workdir {
                cmd.current_dir(dir);
            }

            let child = cmd.spawn().map_err(|source| RunError::Spawn {
                command: command.clone(),
                source,
            })?;

            let output = match timeout(deadline, child.wait_with_output()).await {
                Ok(Ok(output)) => output,
                Ok(Err(source)) => {
                    return Err(RunError::Output { command, source });
                }
                Err(_elapsed) => {
                    return Err(RunError::Timeout {
                        command,
                        timeout: deadline,
                    });
                }
            };

            Ok(CommandResult {
                command,
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code(),
                success: output.status.success(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let runner = ToolRunner::new();
        let args = vec!["hello".to_string()];
        let result = runner
            .run("echo", &args, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.stdout.trim(), "hello");
        assert_eq!(result.command, "echo hello");
    }

    #[tokio::test]
    async fn nonzero_exit_is_a_result_not_an_error() {
        let runner = ToolRunner::new();
        let args = vec!["nonexistent_dir_for_test".to_string()];
        let result = runner
            .run("ls", &args, Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!result.success);
        assert_ne!(result.exit_code, Some(0));
        assert!(!result.stderr.is_empty());
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let runner = ToolRunner::new();
        let err = runner
            .run("definitely-not-a-real-binary", &[], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Spawn { .. }));
    }

    #[tokio::test]
    async fn timeout_kills_the_process() {
        let runner = ToolRunner::new();
        let args = vec!["5".to_string()];
        let err = runner
            .run("sleep", &args, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Timeout { .. }));
    }

    #[test]
    fn combined_output_joins_both_streams() {
        let result = CommandResult {
            command: "tool list".to_string(),
            stdout: "out".to_string(),
            stderr: "err".to_string(),
            exit_code: Some(1),
            success: false,
        };
        assert_eq!(result.combined_output(), "out\nerr");
    }
}
