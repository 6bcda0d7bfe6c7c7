//! Testing utilities for users of the fanstat library.
//!
//! - [`RecordingLogger`]: a fault logger that keeps every entry in memory
//! - [`CountingOperation`]: counts how many times it was executed
//! - [`PanickingOperation`]: breaks the no-panic contract on purpose
//! - [`simulated_batch`]: builds a batch of [`DelayOperation`]s

use async_trait::async_trait;
use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::core::logger::FaultLogger;
use crate::core::operation::Operation;
use crate::core::outcome::OperationResult;
use crate::operations::DelayOperation;

/// A fault logger that records `"{message}: {fault}"` entries.
///
/// # Example
///
/// ```
/// use fanstat::FaultLogger;
/// use fanstat::testing::RecordingLogger;
///
/// let logger = RecordingLogger::new();
/// let err = std::io::Error::other("refused");
/// logger.log_fault(&err, "query failed");
///
/// assert_eq!(logger.entries(), vec!["query failed: refused"]);
/// ```
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries recorded so far.
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Number of entries recorded so far.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FaultLogger for RecordingLogger {
    fn log_fault(&self, fault: &(dyn Error + 'static), message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(format!("{message}: {fault}"));
        }
    }
}

/// An operation that succeeds and counts its completed executions.
///
/// The payload of each outcome is the execution number, starting at 1.
/// With a delay, the count is only bumped once the delay has elapsed.
#[derive(Debug)]
pub struct CountingOperation {
    kind: String,
    count: Arc<AtomicU32>,
    delay: Duration,
}

impl CountingOperation {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            count: Arc::new(AtomicU32::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Wait `delay` before counting. Ignores cancellation.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// How many times this operation has been executed.
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Operation for CountingOperation {
    type Output = OperationResult<u32>;

    fn kind(&self) -> &str {
        &self.kind
    }

    async fn perform(
        &self,
        _cancel: &CancellationToken,
        _logger: Option<&dyn FaultLogger>,
    ) -> Self::Output {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        OperationResult::success(n)
    }
}

/// An operation that panics instead of returning an outcome.
#[derive(Debug, Clone)]
pub struct PanickingOperation {
    kind: String,
    message: String,
}

impl PanickingOperation {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl Operation for PanickingOperation {
    type Output = OperationResult<()>;

    fn kind(&self) -> &str {
        &self.kind
    }

    async fn perform(
        &self,
        _cancel: &CancellationToken,
        _logger: Option<&dyn FaultLogger>,
    ) -> Self::Output {
        panic!("{}", self.message);
    }
}

/// Build one [`DelayOperation`] per `(kind, delay_ms)` pair.
pub fn simulated_batch(delays: &[(&str, u64)]) -> Vec<Arc<DelayOperation>> {
    delays
        .iter()
        .map(|(kind, ms)| Arc::new(DelayOperation::new(*kind, Duration::from_millis(*ms))))
        .collect()
}
