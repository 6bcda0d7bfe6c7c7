//! Common test utilities shared across integration tests.

use fanstat::{StatsTable, Timestamp};
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Write `yaml` to a temporary plan file that lives as long as the handle.
pub fn write_plan(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Assert the structural invariants every statistics table must satisfy.
///
/// # Panics
///
/// Panics if the row count, phase labels or elapsed values are inconsistent.
pub fn assert_table_invariants(table: &StatsTable, operations: usize) {
    assert_eq!(table.len(), operations + 3, "row count");
    let labels: Vec<&str> = table
        .phase_rows()
        .iter()
        .map(|r| r.label.as_str())
        .collect();
    assert_eq!(labels, fanstat::PHASE_LABELS);

    for row in table.rows() {
        if row.is_complete() {
            assert_eq!(row.elapsed, span(row.start, row.end), "row {}", row.label);
        } else {
            assert_eq!(row.elapsed, Duration::ZERO, "row {}", row.label);
        }
    }
}

fn span(start: Timestamp, end: Timestamp) -> Duration {
    (end - start).to_std().unwrap_or(Duration::ZERO)
}
