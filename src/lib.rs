//! fanstat - fan-out/fan-in execution of I/O-bound operations with timing statistics.
//!
//! Hand the [`Engine`] a batch of operations; it runs them all at once,
//! waits for every one of them, reduces their outcomes with a function you
//! supply and returns the reduced value together with a [`StatsTable`]
//! describing how long each operation and each phase of the run took.
//!
//! ```no_run
//! use fanstat::{DelayOperation, Engine, Summary};
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), fanstat::ExecutionError> {
//! let ops = vec![
//!     Arc::new(DelayOperation::new("http", Duration::from_millis(200))),
//!     Arc::new(DelayOperation::new("db", Duration::from_millis(300))),
//! ];
//!
//! let (summary, table) = Engine::new()
//!     .run_with_stats(&ops, |outcomes| Summary::tally(&outcomes), &CancellationToken::new())
//!     .await?;
//!
//! assert_eq!(table.len(), ops.len() + 3);
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod execution;
pub mod operations;
pub mod report;
pub mod testing;

pub use config::{ConfigError, OperationConfig, PlanConfig, ReportConfig, YamlLoader};
pub use core::logger::{FaultLogger, TracingFaultLogger};
pub use core::operation::{DynOperation, Erased, Operation, OperationError, OperationExt, absorb};
pub use core::outcome::{BoxedOutcome, OperationResult, Outcome};
pub use core::timing::{Timed, Timestamp, Timing, UNSET};
pub use core::types::RunId;
pub use execution::{
    AGGREGATION_LABEL, Engine, ExecutionError, OVERALL_EXECUTION_LABEL, OVERALL_TASKS_LABEL,
    OperationTiming, PHASE_LABELS, PhaseTimings, StatsRow, StatsTable, Summary,
};
pub use operations::{CommandOperation, CommandOperationBuilder, CommandOutput, DelayOperation};
pub use report::{DEFAULT_TIME_FORMAT, ReportFormat};

pub use tokio_util::sync::CancellationToken;
