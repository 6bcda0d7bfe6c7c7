//! Statistics table builder.
//!
//! Turns per-operation timings and the engine's phase boundaries into a
//! [`StatsTable`]: one row per operation in input order, followed by the
//! three phase rows.

use serde::{Serialize, Serializer};
use std::time::Duration;

use crate::core::timing::{Timestamp, Timing, UNSET, elapsed_between};
use crate::core::types::RunId;

/// Label of the row spanning dispatch through the join.
pub const OVERALL_TASKS_LABEL: &str = "Overall Tasks Execution";
/// Label of the row spanning the reducer call.
pub const AGGREGATION_LABEL: &str = "Aggregation Processing";
/// Label of the row spanning the whole run.
pub const OVERALL_EXECUTION_LABEL: &str = "Overall Execution";

/// Labels of the trailing phase rows, in table order.
pub const PHASE_LABELS: [&str; 3] = [
    OVERALL_TASKS_LABEL,
    AGGREGATION_LABEL,
    OVERALL_EXECUTION_LABEL,
];

/// Timing of one operation, as read from its execution envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationTiming {
    pub kind: String,
    pub timing: Timing,
}

impl OperationTiming {
    pub fn new(kind: impl Into<String>, timing: Timing) -> Self {
        Self {
            kind: kind.into(),
            timing,
        }
    }
}

/// Instants captured by the engine around each phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    pub overall_start: Timestamp,
    pub tasks_end: Timestamp,
    pub aggregation_start: Timestamp,
    pub aggregation_end: Timestamp,
    pub overall_end: Timestamp,
}

/// One line of the statistics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsRow {
    pub label: String,
    /// Start instant, or [`UNSET`] if it was never recorded.
    pub start: Timestamp,
    /// End instant, or [`UNSET`] if it was never recorded.
    pub end: Timestamp,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl StatsRow {
    /// Build a row from a possibly incomplete timing.
    pub fn from_timing(label: impl Into<String>, timing: &Timing) -> Self {
        Self {
            label: label.into(),
            start: timing.start.unwrap_or(UNSET),
            end: timing.end.unwrap_or(UNSET),
            elapsed: timing.elapsed(),
        }
    }

    fn span(label: &str, start: Timestamp, end: Timestamp) -> Self {
        Self {
            label: label.to_string(),
            start,
            end,
            elapsed: elapsed_between(start, end),
        }
    }

    /// Whether both instants of this row were recorded.
    pub fn is_complete(&self) -> bool {
        self.start != UNSET && self.end != UNSET
    }
}

fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(elapsed.as_secs_f64() * 1000.0)
}

/// Tabular timing report for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsTable {
    run_id: RunId,
    rows: Vec<StatsRow>,
}

impl StatsTable {
    /// Build the table for a run.
    ///
    /// Always yields `operations.len() + 3` rows.
    pub fn build(run_id: RunId, operations: &[OperationTiming], phases: &PhaseTimings) -> Self {
        let mut rows = Vec::with_capacity(operations.len() + PHASE_LABELS.len());

        rows.extend(
            operations
                .iter()
                .map(|op| StatsRow::from_timing(op.kind.as_str(), &op.timing)),
        );

        rows.push(StatsRow::span(
            OVERALL_TASKS_LABEL,
            phases.overall_start,
            phases.tasks_end,
        ));
        rows.push(StatsRow::span(
            AGGREGATION_LABEL,
            phases.aggregation_start,
            phases.aggregation_end,
        ));
        rows.push(StatsRow::span(
            OVERALL_EXECUTION_LABEL,
            phases.overall_start,
            phases.overall_end,
        ));

        Self { run_id, rows }
    }

    /// Run this table describes.
    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// All rows, operations first.
    pub fn rows(&self) -> &[StatsRow] {
        &self.rows
    }

    /// Rows describing individual operations, in input order.
    pub fn operation_rows(&self) -> &[StatsRow] {
        &self.rows[..self.rows.len() - PHASE_LABELS.len()]
    }

    /// The three phase rows.
    pub fn phase_rows(&self) -> &[StatsRow] {
        &self.rows[self.rows.len() - PHASE_LABELS.len()..]
    }

    /// Look up a phase row by label.
    pub fn phase_row(&self, label: &str) -> Option<&StatsRow> {
        self.phase_rows().iter().find(|row| row.label == label)
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A table is never empty; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};

    fn phases() -> PhaseTimings {
        let t0 = Utc::now();
        PhaseTimings {
            overall_start: t0,
            tasks_end: t0 + TimeDelta::milliseconds(400),
            aggregation_start: t0 + TimeDelta::milliseconds(401),
            aggregation_end: t0 + TimeDelta::milliseconds(403),
            overall_end: t0 + TimeDelta::milliseconds(404),
        }
    }

    fn timing(offset_ms: i64, len_ms: i64) -> Timing {
        let start = Utc::now() + TimeDelta::milliseconds(offset_ms);
        Timing::new(start, start + TimeDelta::milliseconds(len_ms))
    }

    #[test]
    fn test_row_count_is_operations_plus_three() {
        let ops = vec![
            OperationTiming::new("http", timing(0, 200)),
            OperationTiming::new("db", timing(0, 300)),
        ];

        let table = StatsTable::build(RunId::new(), &ops, &phases());

        assert_eq!(table.len(), ops.len() + 3);
        assert_eq!(table.operation_rows().len(), 2);
    }

    #[test]
    fn test_empty_operations_still_has_phase_rows() {
        let table = StatsTable::build(RunId::new(), &[], &phases());

        assert_eq!(table.len(), 3);
        assert!(table.operation_rows().is_empty());
    }

    #[test]
    fn test_phase_rows_have_fixed_labels_and_order() {
        let ops = vec![OperationTiming::new("http", timing(0, 10))];
        let table = StatsTable::build(RunId::new(), &ops, &phases());

        let labels: Vec<&str> = table.phase_rows().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, PHASE_LABELS);
    }

    #[test]
    fn test_operation_rows_preserve_input_order() {
        let ops = vec![
            OperationTiming::new("c", timing(0, 30)),
            OperationTiming::new("a", timing(0, 10)),
            OperationTiming::new("b", timing(0, 20)),
        ];
        let table = StatsTable::build(RunId::new(), &ops, &phases());

        let labels: Vec<&str> = table
            .operation_rows()
            .iter()
            .map(|r| r.label.as_str())
            .collect();
        assert_eq!(labels, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_elapsed_equals_end_minus_start() {
        let ops = vec![OperationTiming::new("query", timing(5, 250))];
        let table = StatsTable::build(RunId::new(), &ops, &phases());

        for row in table.rows() {
            assert_eq!(row.elapsed, (row.end - row.start).to_std().unwrap());
        }
        assert_eq!(table.rows()[0].elapsed, Duration::from_millis(250));
    }

    #[test]
    fn test_unset_timing_reports_sentinel_and_zero() {
        let ops = vec![
            OperationTiming::new("never_ran", Timing::unset()),
            OperationTiming::new(
                "half",
                Timing {
                    start: Some(Utc::now()),
                    end: None,
                },
            ),
        ];
        let table = StatsTable::build(RunId::new(), &ops, &phases());

        let never = &table.rows()[0];
        assert_eq!(never.start, UNSET);
        assert_eq!(never.end, UNSET);
        assert_eq!(never.elapsed, Duration::ZERO);
        assert!(!never.is_complete());

        let half = &table.rows()[1];
        assert_ne!(half.start, UNSET);
        assert_eq!(half.end, UNSET);
        assert_eq!(half.elapsed, Duration::ZERO);
    }

    #[test]
    fn test_phase_boundaries_are_used() {
        let phases = phases();
        let table = StatsTable::build(RunId::new(), &[], &phases);

        let tasks = table.phase_row(OVERALL_TASKS_LABEL).unwrap();
        assert_eq!(tasks.start, phases.overall_start);
        assert_eq!(tasks.end, phases.tasks_end);
        assert_eq!(tasks.elapsed, Duration::from_millis(400));

        let aggregation = table.phase_row(AGGREGATION_LABEL).unwrap();
        assert_eq!(aggregation.elapsed, Duration::from_millis(2));

        let overall = table.phase_row(OVERALL_EXECUTION_LABEL).unwrap();
        assert_eq!(overall.start, phases.overall_start);
        assert_eq!(overall.end, phases.overall_end);
    }

    #[test]
    fn test_duplicate_kinds_are_kept() {
        let ops = vec![
            OperationTiming::new("http", timing(0, 1)),
            OperationTiming::new("http", timing(0, 2)),
        ];
        let table = StatsTable::build(RunId::new(), &ops, &phases());

        assert_eq!(table.operation_rows().len(), 2);
        assert!(table.phase_row("http").is_none());
    }

    #[test]
    fn test_serializes_elapsed_as_millis() {
        let ops = vec![OperationTiming::new("http", timing(0, 1500))];
        let table = StatsTable::build(RunId::new(), &ops, &phases());

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["rows"][0]["label"], "http");
        assert_eq!(json["rows"][0]["elapsed_ms"], 1500.0);
        assert_eq!(json["rows"].as_array().unwrap().len(), 4);
    }
}
