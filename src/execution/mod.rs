//! Fan-out execution and run statistics.
//!
//! This module provides the engine that runs a batch of operations
//! concurrently, the statistics table it produces, and a counting reducer.

mod engine;
mod stats;
mod summary;

pub use engine::{Engine, ExecutionError};
pub use stats::{
    AGGREGATION_LABEL, OVERALL_EXECUTION_LABEL, OVERALL_TASKS_LABEL, OperationTiming, PHASE_LABELS,
    PhaseTimings, StatsRow, StatsTable,
};
pub use summary::Summary;
