//! Fan-out/fan-in execution engine.
//!
//! The `Engine` launches every operation of a batch at once, waits for all of
//! them, reduces their outcomes and reports how long each operation and each
//! phase of the run took.
//!
//! Operations absorb their own failures, so a completed run says nothing
//! about whether individual operations succeeded. Only a panicking operation
//! (a broken contract) or a failing reducer fails the run itself.

use chrono::Utc;
use std::any::Any;
use std::collections::HashMap;
use std::convert::Infallible;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{AbortHandle, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, info_span};

use crate::core::logger::FaultLogger;
use crate::core::operation::{DynOperation, Operation};
use crate::core::outcome::{BoxedOutcome, Outcome};
use crate::core::timing::{Timed, elapsed_between};
use crate::core::types::RunId;

use super::stats::{OperationTiming, PhaseTimings, StatsTable};

/// Errors that fail a whole run.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// An operation panicked instead of returning an outcome.
    #[error("operation #{index} ({kind}) panicked: {message}")]
    OperationPanicked {
        index: usize,
        kind: String,
        message: String,
    },

    /// An operation's task was aborted before it produced an outcome.
    #[error("operation #{index} ({kind}) was aborted before producing an outcome")]
    OperationAborted { index: usize, kind: String },

    /// The reducer returned an error.
    #[error("reducer failed")]
    Reducer(#[source] Box<dyn StdError + Send + Sync>),
}

impl ExecutionError {
    fn from_join(index: usize, kind: &str, err: JoinError) -> Self {
        let kind = kind.to_string();
        if err.is_panic() {
            ExecutionError::OperationPanicked {
                index,
                kind,
                message: panic_message(err.into_panic()),
            }
        } else {
            ExecutionError::OperationAborted { index, kind }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Runs batches of operations concurrently and times them.
#[derive(Clone, Default)]
pub struct Engine {
    /// Forwarded to every operation.
    logger: Option<Arc<dyn FaultLogger>>,
}

impl Engine {
    /// Create an engine without a fault logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward `logger` to every operation this engine runs.
    pub fn with_logger(mut self, logger: Arc<dyn FaultLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Run `operations` concurrently and reduce their outcomes.
    ///
    /// The reducer receives the outcomes in the same order as `operations`,
    /// whatever order they finished in. `cancel` is handed to every
    /// operation; the engine itself always waits for all of them.
    ///
    /// # Returns
    /// * `Ok((reduced, table))` - All operations returned an outcome
    /// * `Err(ExecutionError)` - An operation panicked or was aborted
    pub async fn run_with_stats<O, R, F>(
        &self,
        operations: &[Arc<O>],
        reducer: F,
        cancel: &CancellationToken,
    ) -> Result<(R, StatsTable), ExecutionError>
    where
        O: Operation + ?Sized + 'static,
        F: FnOnce(Vec<O::Output>) -> R,
    {
        self.try_run_with_stats(
            operations,
            |outcomes| Ok::<R, Infallible>(reducer(outcomes)),
            cancel,
        )
        .await
    }

    /// Like [`run_with_stats`](Self::run_with_stats), with a fallible reducer.
    ///
    /// A reducer error fails the run with [`ExecutionError::Reducer`]; the
    /// original error stays reachable through `source()`.
    pub async fn try_run_with_stats<O, R, E, F>(
        &self,
        operations: &[Arc<O>],
        reducer: F,
        cancel: &CancellationToken,
    ) -> Result<(R, StatsTable), ExecutionError>
    where
        O: Operation + ?Sized + 'static,
        F: FnOnce(Vec<O::Output>) -> Result<R, E>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let run_id = RunId::new();
        let span = info_span!("fan_out", run = %run_id, operations = operations.len());

        self.fan_out(run_id, operations, reducer, cancel)
            .instrument(span)
            .await
    }

    /// Run operations of different kinds; the reducer sees boxed outcomes.
    pub async fn run_dyn_with_stats<R, F>(
        &self,
        operations: &[Arc<DynOperation>],
        reducer: F,
        cancel: &CancellationToken,
    ) -> Result<(R, StatsTable), ExecutionError>
    where
        F: FnOnce(Vec<BoxedOutcome>) -> R,
    {
        self.run_with_stats(operations, reducer, cancel).await
    }

    async fn fan_out<O, R, E, F>(
        &self,
        run_id: RunId,
        operations: &[Arc<O>],
        reducer: F,
        cancel: &CancellationToken,
    ) -> Result<(R, StatsTable), ExecutionError>
    where
        O: Operation + ?Sized + 'static,
        F: FnOnce(Vec<O::Output>) -> Result<R, E>,
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        let overall_start = Utc::now();

        debug!(count = operations.len(), "dispatching operations");

        // Dropping the set aborts whatever is still running.
        let mut tasks = JoinSet::new();
        let mut positions = HashMap::with_capacity(operations.len());
        for (index, operation) in operations.iter().enumerate() {
            let handle = self.dispatch(&mut tasks, index, Arc::clone(operation), cancel.clone());
            positions.insert(handle.id(), index);
        }

        // Join everything before inspecting any result.
        let mut joined: Vec<Option<Result<Timed<O::Output>, JoinError>>> =
            operations.iter().map(|_| None).collect();
        while let Some(result) = tasks.join_next_with_id().await {
            let (id, result) = match result {
                Ok((id, timed)) => (id, Ok(timed)),
                Err(err) => (err.id(), Err(err)),
            };
            if let Some(&index) = positions.get(&id) {
                joined[index] = Some(result);
            }
        }

        let tasks_end = Utc::now();

        let mut timings = Vec::with_capacity(operations.len());
        let mut outcomes = Vec::with_capacity(operations.len());
        for (index, (operation, slot)) in operations.iter().zip(joined).enumerate() {
            let result = slot.ok_or_else(|| ExecutionError::OperationAborted {
                index,
                kind: operation.kind().to_string(),
            })?;
            let (timing, outcome) = result
                .map_err(|err| ExecutionError::from_join(index, operation.kind(), err))?
                .into_parts();
            timings.push(OperationTiming::new(operation.kind(), timing));
            outcomes.push(outcome);
        }

        debug!(
            tasks_ms = %elapsed_between(overall_start, tasks_end).as_millis(),
            "all operations joined"
        );

        let aggregation_start = Utc::now();
        let reduced = reducer(outcomes).map_err(|err| ExecutionError::Reducer(err.into()))?;
        let aggregation_end = Utc::now();

        let overall_end = Utc::now();

        let phases = PhaseTimings {
            overall_start,
            tasks_end,
            aggregation_start,
            aggregation_end,
            overall_end,
        };
        let table = StatsTable::build(run_id, &timings, &phases);

        debug!(
            overall_ms = %elapsed_between(overall_start, overall_end).as_millis(),
            rows = table.len(),
            "run completed"
        );

        Ok((reduced, table))
    }

    fn dispatch<O>(
        &self,
        tasks: &mut JoinSet<Timed<O::Output>>,
        index: usize,
        operation: Arc<O>,
        cancel: CancellationToken,
    ) -> AbortHandle
    where
        O: Operation + ?Sized + 'static,
    {
        let logger = self.logger.clone();
        let span = debug_span!("operation", index, kind = %operation.kind());

        tasks.spawn(
            async move {
                let timed = operation.execute(&cancel, logger.as_deref()).await;
                debug!(
                    success = timed.outcome.is_success(),
                    elapsed_ms = %timed.timing.elapsed().as_millis(),
                    "operation finished"
                );
                timed
            }
            .instrument(span),
        )
    }
}
