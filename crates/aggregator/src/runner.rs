//! External tool invocation abstraction for testability.
//!
//! The [`ToolRunner`] trait abstracts child-process execution, allowing
//! production code to use [`ProcessRunner`] while tests use scripted mock
//! runners that never spawn a process.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐  ┌───────────────┐
//! │ GenerationExecutor  │  │ MergeReducer  │
//! └─────────┬───────────┘  └──────┬────────┘
//!           │                     │
//!           ▼                     ▼
//!            ┌───────────────────┐
//!            │    ToolRunner     │ (trait)
//!            └───────────────────┘
//!                 │         │
//!                 ▼         ▼
//!           ┌──────────┐ ┌──────┐
//!           │ Process  │ │ Mock │
//!           │ Runner   │ └──────┘
//!           └────┬─────┘
//!                │
//!                ▼
//!      cargo / gradlew / nix / cyclonedx
//! ```
//!
//! # Lifecycle guarantees
//!
//! Every invocation runs under the caller-supplied timeout and observes the
//! shared [`CancellationToken`]. A child that outlives either is killed,
//! and on Unix its whole process group is signalled so generator-spawned
//! descendants (gradle daemons, nix builders) do not linger.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::AggregatorError;

/// A single external tool invocation.
///
/// Carries everything [`ToolRunner::run`] needs: the program, its
/// arguments, an optional working directory, and the timeout budget.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    /// Program to execute (resolved via `PATH` unless absolute).
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Working directory; inherits the parent's when `None`.
    pub cwd: Option<PathBuf>,
    /// Wall-clock budget for the invocation.
    pub timeout: Duration,
}

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    /// Process exited on its own with this status code.
    Exited(i32),
    /// Killed after exceeding the timeout budget.
    TimedOut,
    /// Killed because the pipeline was cancelled.
    Cancelled,
}

impl ToolStatus {
    /// `true` only for a clean zero exit.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }
}

/// Captured result of a completed (or killed) invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Terminal status.
    pub status: ToolStatus,
    /// Captured stderr text (empty when killed before producing any).
    pub stderr: String,
}

impl ToolOutput {
    /// One-line description for outcome diagnostics and logs.
    pub fn describe(&self) -> String {
        match &self.status {
            ToolStatus::Exited(0) => "exited successfully".to_owned(),
            ToolStatus::Exited(code) => {
                let stderr = self.stderr.trim();
                if stderr.is_empty() {
                    format!("exited with status {code}")
                } else {
                    format!("exited with status {code}: {stderr}")
                }
            }
            ToolStatus::TimedOut => "timed out".to_owned(),
            ToolStatus::Cancelled => "cancelled".to_owned(),
        }
    }
}

/// Trait abstracting external tool execution.
///
/// The generation executor and the merge reducer are generic over this
/// trait, so tests can substitute scripted runners and count or fail
/// invocations deterministically.
///
/// # Error semantics
///
/// `Err` is reserved for failures to *run* the tool at all (missing
/// binary, fork failure). A tool that ran and failed — non-zero exit,
/// timeout, cancellation — is reported through [`ToolOutput::status`],
/// because callers treat those three uniformly per invocation.
pub trait ToolRunner: Send + Sync + 'static {
    /// Execute one invocation to completion, kill, or cancellation.
    fn run(
        &self,
        invocation: &ToolInvocation,
    ) -> impl Future<Output = Result<ToolOutput, AggregatorError>> + Send;
}

/// Production runner backed by `tokio::process`.
///
/// Children are spawned into their own Unix process group with
/// `kill_on_drop` set, so neither a timeout nor a cancellation can leak
/// an external tool or its descendants.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cancel: CancellationToken,
}

impl ProcessRunner {
    /// Create a runner observing the given cancellation token.
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }
}

impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<ToolOutput, AggregatorError> {
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &invocation.cwd {
            command.current_dir(dir);
        }
        #[cfg(unix)]
        command.process_group(0);

        debug!(
            program = %invocation.program,
            args = ?invocation.args,
            cwd = ?invocation.cwd,
            "spawning external tool"
        );

        let child = command.spawn().map_err(|e| AggregatorError::Spawn {
            program: invocation.program.clone(),
            reason: e.to_string(),
        })?;
        let pid = child.id();

        tokio::select! {
            result = tokio::time::timeout(invocation.timeout, child.wait_with_output()) => {
                match result {
                    Ok(Ok(output)) => Ok(ToolOutput {
                        status: ToolStatus::Exited(output.status.code().unwrap_or(-1)),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    }),
                    Ok(Err(e)) => Err(AggregatorError::Spawn {
                        program: invocation.program.clone(),
                        reason: format!("wait failed: {e}"),
                    }),
                    Err(_) => {
                        warn!(
                            program = %invocation.program,
                            timeout_secs = invocation.timeout.as_secs(),
                            "external tool timed out, killing process group"
                        );
                        kill_process_group(pid);
                        Ok(ToolOutput {
                            status: ToolStatus::TimedOut,
                            stderr: String::new(),
                        })
                    }
                }
            }
            () = self.cancel.cancelled() => {
                debug!(program = %invocation.program, "cancellation requested, killing process group");
                kill_process_group(pid);
                Ok(ToolOutput {
                    status: ToolStatus::Cancelled,
                    stderr: String::new(),
                })
            }
        }
    }
}

/// Signal the child's whole process group.
///
/// The child was made its own group leader via `process_group(0)`, so the
/// negative-pid form reaches every descendant it spawned. The direct child
/// is additionally covered by `kill_on_drop` when the wait future drops.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // SAFETY: plain syscall; an already-reaped pid makes killpg a no-op error.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}
