//! External command operation.
//!
//! [`CommandOperation`] runs an external executable as one I/O-bound
//! operation. Its stdout, stderr and exit code are captured into a
//! [`CommandOutput`] payload.
//!
//! # Quick Start
//!
//! ```rust
//! use fanstat::CommandOperation;
//! use std::time::Duration;
//!
//! let probe = CommandOperation::builder("curl")
//!     .kind("health_check")
//!     .args(["-s", "https://api.example.com/health"])
//!     .timeout(Duration::from_secs(30))
//!     .build();
//! ```
//!
//! # Failure Modes
//!
//! None of these fail the run; each becomes a failed outcome:
//!
//! - **Non-zero exit code**: the outcome keeps the captured output as payload
//! - **Timeout**: the child is killed and the outcome reports the limit
//! - **Spawn failure**: e.g. program not found
//! - **Cancellation**: the child is killed when the shared token fires

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::core::logger::{FaultLogger, log_fault};
use crate::core::operation::{Operation, OperationError, absorb};
use crate::core::outcome::OperationResult;

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// Exit code, or -1 if the process was killed by a signal.
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl From<&Output> for CommandOutput {
    fn from(output: &Output) -> Self {
        Self {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// An operation that executes an external command.
///
/// # Example
///
/// ```ignore
/// let op = CommandOperation::builder("psql")
///     .kind("row_count")
///     .args(["-tAc", "select count(*) from events"])
///     .env("PGHOST", "localhost")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct CommandOperation {
    /// Report label
    kind: String,
    /// Program to execute
    program: String,
    /// Command arguments
    args: Vec<String>,
    /// Extra environment variables
    env: BTreeMap<String, String>,
    /// Working directory
    working_dir: Option<PathBuf>,
    /// Execution timeout
    timeout: Option<Duration>,
}

impl CommandOperation {
    /// Create a new builder for a command operation.
    pub fn builder(program: impl Into<String>) -> CommandOperationBuilder {
        CommandOperationBuilder::new(program)
    }

    /// Get the program being executed.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the command arguments.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Get the extra environment variables.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Get the working directory.
    pub fn working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }

    /// Get the timeout duration.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        cmd
    }

    async fn run(&self) -> Result<Output, OperationError> {
        let mut cmd = self.command();
        match self.timeout {
            Some(limit) => timeout(limit, cmd.output())
                .await
                .map_err(|_| OperationError::Timeout(limit))?
                .map_err(OperationError::from),
            None => cmd.output().await.map_err(OperationError::from),
        }
    }
}

#[async_trait]
impl Operation for CommandOperation {
    type Output = OperationResult<CommandOutput>;

    fn kind(&self) -> &str {
        &self.kind
    }

    async fn perform(
        &self,
        cancel: &CancellationToken,
        logger: Option<&dyn FaultLogger>,
    ) -> Self::Output {
        // Dropping the losing branch drops the child, which kills it.
        let output = tokio::select! {
            output = self.run() => output,
            _ = cancel.cancelled() => Err(OperationError::Cancelled),
        };

        let output = match output {
            Ok(output) => output,
            Err(err) => return absorb(&self.kind, Err(err), logger),
        };

        let captured = CommandOutput::from(&output);
        if output.status.success() {
            OperationResult::success(captured)
        } else {
            let err = OperationError::CommandFailed {
                code: captured.exit_code,
                stderr: captured.stderr.trim().to_string(),
            };
            let message = format!("{} failed: {}", self.kind, err);
            log_fault(logger, &err, &message);
            OperationResult::failure_with_payload(message, captured)
        }
    }
}

/// Builder for creating `CommandOperation` instances.
#[derive(Debug, Clone)]
pub struct CommandOperationBuilder {
    kind: Option<String>,
    program: String,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl CommandOperationBuilder {
    /// Create a new builder with the given program.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            kind: None,
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            working_dir: None,
            timeout: None,
        }
    }

    /// Set the report label. Defaults to the program name.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Add a single environment variable.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Add multiple environment variables.
    pub fn envs<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the working directory.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set the execution timeout.
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Build the `CommandOperation`.
    pub fn build(self) -> CommandOperation {
        let kind = self.kind.unwrap_or_else(|| self.program.clone());
        CommandOperation {
            kind,
            program: self.program,
            args: self.args,
            env: self.env,
            working_dir: self.working_dir,
            timeout: self.timeout,
        }
    }
}
