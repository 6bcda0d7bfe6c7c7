//! Bundled operation kinds.
//!
//! - [`CommandOperation`]: runs an external process
//! - [`DelayOperation`]: simulates I/O latency

mod command;
mod delay;

pub use command::{CommandOperation, CommandOperationBuilder, CommandOutput};
pub use delay::DelayOperation;
