//! Rendering of statistics tables.
//!
//! Produces either a terminal-friendly text table or pretty JSON.
//! Rendering only builds strings; writing them anywhere is up to the caller.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, CellAlignment, Table};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::timing::Timestamp;
use crate::execution::{StatsRow, StatsTable};

/// Default `strftime` format for start/end columns.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S%.3f";

/// Output format for a statistics table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Text table.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Render `table` in the requested format.
pub fn render(
    table: &StatsTable,
    format: ReportFormat,
    time_format: &str,
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(render_text(table, time_format)),
        ReportFormat::Json => render_json(table),
    }
}

/// Render `table` as pretty JSON.
pub fn render_json(table: &StatsTable) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(table)
}

/// Render `table` as a text table.
///
/// Unset timestamps are shown as `-`. The phase rows follow the operation
/// rows.
pub fn render_text(table: &StatsTable, time_format: &str) -> String {
    let mut grid = Table::new();
    grid.load_preset(UTF8_FULL_CONDENSED)
        .set_header(vec!["Task", "Start", "End", "Elapsed"]);

    for row in table.rows() {
        grid.add_row(row_cells(row, time_format));
    }

    if let Some(column) = grid.column_mut(3) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    format!("Run {}\n{}\n", table.run_id(), grid)
}

fn row_cells(row: &StatsRow, time_format: &str) -> Vec<Cell> {
    vec![
        Cell::new(&row.label),
        Cell::new(format_timestamp(row.start, time_format)),
        Cell::new(format_timestamp(row.end, time_format)),
        Cell::new(format_elapsed(row.elapsed)),
    ]
}

/// Format a timestamp, or `-` for the unset sentinel.
pub fn format_timestamp(instant: Timestamp, time_format: &str) -> String {
    if instant == crate::core::timing::UNSET {
        "-".to_string()
    } else {
        instant.format(time_format).to_string()
    }
}

/// Format a duration in seconds with millisecond precision.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3}s", elapsed.as_secs_f64())
}
