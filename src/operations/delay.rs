//! Simulated I/O latency.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::core::logger::FaultLogger;
use crate::core::operation::{Operation, OperationError, absorb};
use crate::core::outcome::OperationResult;

/// An operation that waits for a fixed delay, then succeeds or fails.
///
/// Stands in for a network call or query whose only observable property is
/// how long it takes. The payload of a successful outcome is the delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayOperation {
    kind: String,
    delay: Duration,
    failure: Option<String>,
    cancellable: bool,
}

impl DelayOperation {
    /// Create an operation that succeeds after `delay`.
    pub fn new(kind: impl Into<String>, delay: Duration) -> Self {
        Self {
            kind: kind.into(),
            delay,
            failure: None,
            cancellable: true,
        }
    }

    /// Fail with `message` once the delay has elapsed.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Keep sleeping even after cancellation is requested.
    pub fn ignore_cancellation(mut self) -> Self {
        self.cancellable = false;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    pub fn is_cancellable(&self) -> bool {
        self.cancellable
    }

    async fn wait(&self, cancel: &CancellationToken) -> Result<Duration, OperationError> {
        if self.cancellable {
            tokio::select! {
                _ = sleep(self.delay) => {}
                _ = cancel.cancelled() => return Err(OperationError::Cancelled),
            }
        } else {
            sleep(self.delay).await;
        }

        match &self.failure {
            Some(message) => Err(OperationError::ExecutionFailed(message.clone())),
            None => Ok(self.delay),
        }
    }
}

#[async_trait]
impl Operation for DelayOperation {
    type Output = OperationResult<Duration>;

    fn kind(&self) -> &str {
        &self.kind
    }

    async fn perform(
        &self,
        cancel: &CancellationToken,
        logger: Option<&dyn FaultLogger>,
    ) -> Self::Output {
        let result = self.wait(cancel).await;
        absorb(&self.kind, result, logger)
    }
}
