//! End-to-end fan-out tests through the public API.

use async_trait::async_trait;
use fanstat::testing::{PanickingOperation, RecordingLogger, simulated_batch};
use fanstat::{
    CancellationToken, CommandOperation, DelayOperation, DynOperation, Engine, ExecutionError,
    FaultLogger, OVERALL_EXECUTION_LABEL, OVERALL_TASKS_LABEL, Operation, OperationError,
    OperationExt, Outcome, Summary, absorb,
};
use std::sync::Arc;
use std::time::Duration;

use crate::common::assert_table_invariants;

/// Response of a simulated HTTP call.
#[derive(Debug)]
struct HttpResponse {
    status: u16,
    body: String,
}

impl Outcome for HttpResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn error_message(&self) -> Option<&str> {
        if self.is_success() {
            None
        } else {
            Some(&self.body)
        }
    }
}

/// Simulated HTTP call with a fixed latency and status.
struct FakeHttpCall {
    latency: Duration,
    status: u16,
}

#[async_trait]
impl Operation for FakeHttpCall {
    type Output = HttpResponse;

    fn kind(&self) -> &str {
        "http"
    }

    async fn perform(
        &self,
        _cancel: &CancellationToken,
        _logger: Option<&dyn FaultLogger>,
    ) -> HttpResponse {
        tokio::time::sleep(self.latency).await;
        HttpResponse {
            status: self.status,
            body: format!("status {}", self.status),
        }
    }
}

/// Simulated database query returning rows or a query error.
struct FakeQuery {
    rows: Option<Vec<i64>>,
}

#[async_trait]
impl Operation for FakeQuery {
    type Output = fanstat::OperationResult<Vec<i64>>;

    fn kind(&self) -> &str {
        "db_query"
    }

    async fn perform(
        &self,
        _cancel: &CancellationToken,
        logger: Option<&dyn FaultLogger>,
    ) -> Self::Output {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let result = self
            .rows
            .clone()
            .ok_or_else(|| OperationError::ExecutionFailed("relation does not exist".into()));
        absorb(self.kind(), result, logger)
    }
}

#[tokio::test]
async fn test_three_delays_run_concurrently() {
    let ops = simulated_batch(&[("first", 200), ("second", 300), ("third", 400)]);

    let (summary, table) = Engine::new()
        .run_with_stats(&ops, |o| Summary::tally(&o), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.to_string(), "Total=3, Success=3, Failures=0");
    assert_table_invariants(&table, 3);

    let tasks = table.phase_row(OVERALL_TASKS_LABEL).unwrap();
    assert!(tasks.elapsed >= Duration::from_millis(400));
    assert!(
        tasks.elapsed < Duration::from_millis(900),
        "tasks phase should track the slowest operation, got {:?}",
        tasks.elapsed
    );

    let overall = table.phase_row(OVERALL_EXECUTION_LABEL).unwrap();
    assert!(overall.elapsed >= tasks.elapsed);
}

#[tokio::test]
async fn test_one_failure_in_five_does_not_fail_the_run() {
    let ops: Vec<Arc<DelayOperation>> = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|kind| {
            let op = DelayOperation::new(*kind, Duration::from_millis(20));
            Arc::new(if *kind == "d" {
                op.failing_with("upstream returned 502")
            } else {
                op
            })
        })
        .collect();

    let (summary, table) = Engine::new()
        .run_with_stats(&ops, |o| Summary::tally(&o), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.total, 5);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(summary.failed, 1);
    assert!(!summary.errors[0].is_empty());
    assert_table_invariants(&table, 5);
    assert_eq!(table.len(), 8);
}

#[tokio::test]
async fn test_contract_violation_fails_the_run() {
    let ops: Vec<Arc<DynOperation>> = vec![
        DelayOperation::new("ok", Duration::from_millis(10)).into_dyn(),
        PanickingOperation::new("broken", "driver state corrupted").into_dyn(),
        DelayOperation::new("also_ok", Duration::from_millis(10)).into_dyn(),
    ];

    let err = Engine::new()
        .run_dyn_with_stats(&ops, |o| Summary::tally(&o), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ExecutionError::OperationPanicked { index: 1, .. }
    ));
    assert!(err.to_string().contains("driver state corrupted"));
}

#[tokio::test]
async fn test_typed_reducer_sees_concrete_outcomes() {
    let ops = vec![
        Arc::new(FakeHttpCall {
            latency: Duration::from_millis(30),
            status: 200,
        }),
        Arc::new(FakeHttpCall {
            latency: Duration::from_millis(10),
            status: 503,
        }),
    ];

    let (statuses, table) = Engine::new()
        .run_with_stats(
            &ops,
            |responses| responses.iter().map(|r| r.status).collect::<Vec<_>>(),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(statuses, vec![200, 503]);
    assert_table_invariants(&table, 2);
}

#[tokio::test]
async fn test_heterogeneous_kinds_in_one_batch() {
    let logger = Arc::new(RecordingLogger::new());
    let ops: Vec<Arc<DynOperation>> = vec![
        FakeHttpCall {
            latency: Duration::from_millis(20),
            status: 204,
        }
        .into_dyn(),
        FakeQuery {
            rows: Some(vec![1, 2, 3]),
        }
        .into_dyn(),
        FakeQuery { rows: None }.into_dyn(),
        CommandOperation::builder("echo")
            .kind("shell")
            .arg("ok")
            .build()
            .into_dyn(),
    ];

    let (summary, table) = Engine::new()
        .with_logger(logger.clone())
        .run_dyn_with_stats(&ops, |o| Summary::tally(&o), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.to_string(), "Total=4, Success=3, Failures=1");
    assert!(summary.errors[0].contains("relation does not exist"));
    assert_eq!(logger.len(), 1);

    let labels: Vec<&str> = table
        .operation_rows()
        .iter()
        .map(|r| r.label.as_str())
        .collect();
    assert_eq!(labels, vec!["http", "db_query", "db_query", "shell"]);
    assert_table_invariants(&table, 4);
}

#[tokio::test]
async fn test_cancelled_run_still_returns_a_full_table() {
    let ops = simulated_batch(&[("long_a", 10_000), ("long_b", 10_000)]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let (summary, table) = Engine::new()
        .run_with_stats(&ops, |o| Summary::tally(&o), &cancel)
        .await
        .unwrap();

    assert_eq!(summary.failed, 2);
    assert!(summary.errors.iter().all(|e| e.contains("cancelled")));
    assert_table_invariants(&table, 2);
}
