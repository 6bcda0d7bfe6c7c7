//! Plan configuration.
//!
//! A plan is a YAML file describing one batch of operations to fan out,
//! plus how the resulting statistics table should be reported.

mod error;
mod yaml;

pub use error::ConfigError;
pub use yaml::{OperationConfig, OperationTypeConfig, PlanConfig, ReportConfig, YamlLoader};
