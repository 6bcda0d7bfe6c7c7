//! Operation trait and error types.
//!
//! The `Operation` trait is the unit of work the engine fans out. Implement
//! [`Operation::perform`] to define a custom operation; the provided
//! [`Operation::execute`] wraps it with timing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::logger::{FaultLogger, log_fault};
use super::outcome::{BoxedOutcome, Outcome, OperationResult};
use super::timing::{Timed, Timing};

/// Faults an operation may hit before it collapses them into an outcome.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Execution failed with a message.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Operation timed out.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Operation observed the cancellation signal and stopped early.
    #[error("cancelled")]
    Cancelled,

    /// External command exited unsuccessfully.
    #[error("command exited with code {code}: {stderr}")]
    CommandFailed { code: i32, stderr: String },

    /// I/O failure (socket, pipe, process spawn).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error wrapper.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// The core trait for operations the engine can fan out.
///
/// `perform` must never panic: any fault is turned into a failed outcome.
/// A panic is treated as a contract violation and fails the whole run.
///
/// # Example
///
/// ```ignore
/// use fanstat::{FaultLogger, Operation, OperationResult};
/// use async_trait::async_trait;
/// use tokio_util::sync::CancellationToken;
///
/// struct Ping {
///     host: String,
/// }
///
/// #[async_trait]
/// impl Operation for Ping {
///     type Output = OperationResult<u64>;
///
///     fn kind(&self) -> &str {
///         "ping"
///     }
///
///     async fn perform(
///         &self,
///         _cancel: &CancellationToken,
///         _logger: Option<&dyn FaultLogger>,
///     ) -> Self::Output {
///         OperationResult::success(12)
///     }
/// }
/// ```
#[async_trait]
pub trait Operation: Send + Sync {
    /// Outcome produced by one execution.
    type Output: Outcome;

    /// Label used in reports. Not required to be unique.
    fn kind(&self) -> &str;

    /// Do the work.
    ///
    /// # Arguments
    /// * `cancel` - Advisory signal; the operation decides whether to stop early
    /// * `logger` - Optional sink for absorbed faults
    async fn perform(
        &self,
        cancel: &CancellationToken,
        logger: Option<&dyn FaultLogger>,
    ) -> Self::Output;

    /// Run [`perform`](Operation::perform) and record when it started and finished.
    async fn execute(
        &self,
        cancel: &CancellationToken,
        logger: Option<&dyn FaultLogger>,
    ) -> Timed<Self::Output> {
        let start = Utc::now();
        let outcome = self.perform(cancel, logger).await;
        let end = Utc::now();
        Timed::new(Timing::new(start, end), outcome)
    }
}

#[async_trait]
impl<O: Operation + ?Sized> Operation for Arc<O> {
    type Output = O::Output;

    fn kind(&self) -> &str {
        (**self).kind()
    }

    async fn perform(
        &self,
        cancel: &CancellationToken,
        logger: Option<&dyn FaultLogger>,
    ) -> Self::Output {
        (**self).perform(cancel, logger).await
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        logger: Option<&dyn FaultLogger>,
    ) -> Timed<Self::Output> {
        (**self).execute(cancel, logger).await
    }
}

/// An operation whose outcome type has been erased.
pub type DynOperation = dyn Operation<Output = BoxedOutcome>;

/// Adapter boxing the outcome of the wrapped operation.
pub struct Erased<O>(O);

impl<O: Operation> Erased<O> {
    pub fn new(operation: O) -> Self {
        Self(operation)
    }

    pub fn into_inner(self) -> O {
        self.0
    }
}

#[async_trait]
impl<O: Operation> Operation for Erased<O> {
    type Output = BoxedOutcome;

    fn kind(&self) -> &str {
        self.0.kind()
    }

    async fn perform(
        &self,
        cancel: &CancellationToken,
        logger: Option<&dyn FaultLogger>,
    ) -> BoxedOutcome {
        Box::new(self.0.perform(cancel, logger).await)
    }

    async fn execute(
        &self,
        cancel: &CancellationToken,
        logger: Option<&dyn FaultLogger>,
    ) -> Timed<BoxedOutcome> {
        self.0
            .execute(cancel, logger)
            .await
            .map(|outcome| Box::new(outcome) as BoxedOutcome)
    }
}

/// Conversions into the heterogeneous form.
pub trait OperationExt: Operation + Sized + 'static {
    /// Erase the outcome type so the operation can sit next to other kinds.
    fn into_dyn(self) -> Arc<DynOperation> {
        Arc::new(Erased(self))
    }
}

impl<O: Operation + 'static> OperationExt for O {}

/// Collapse a fallible body into an [`OperationResult`], logging the fault.
pub fn absorb<T>(
    kind: &str,
    result: Result<T, OperationError>,
    logger: Option<&dyn FaultLogger>,
) -> OperationResult<T> {
    match result {
        Ok(payload) => OperationResult::success(payload),
        Err(err) => {
            let message = format!("{kind} failed: {err}");
            log_fault(logger, &err, &message);
            OperationResult::failure(message)
        }
    }
}
