//! YAML plan parsing.
//!
//! Parses plan definitions and turns them into runnable operations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::error::ConfigError;
use crate::core::operation::{DynOperation, OperationExt};
use crate::operations::{CommandOperation, DelayOperation};
use crate::report::{DEFAULT_TIME_FORMAT, ReportFormat};

/// A batch of operations to run together.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Plan name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Reporting options.
    #[serde(default)]
    pub report: ReportConfig,
    /// Operations, in report order.
    #[serde(default)]
    pub operations: Vec<OperationConfig>,
}

/// How the statistics table is reported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Output format.
    pub format: ReportFormat,
    /// `strftime` format for start/end columns.
    pub time_format: Option<String>,
}

impl ReportConfig {
    /// The configured time format, or the default.
    pub fn time_format(&self) -> &str {
        self.time_format.as_deref().unwrap_or(DEFAULT_TIME_FORMAT)
    }
}

/// One operation in a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationConfig {
    /// Report label.
    pub kind: String,
    /// Operation type and configuration.
    #[serde(flatten)]
    pub operation_type: OperationTypeConfig,
}

/// Operation type configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OperationTypeConfig {
    /// External command.
    #[serde(rename = "command")]
    Command {
        /// The program to run.
        program: String,
        /// Program arguments.
        #[serde(default)]
        args: Vec<String>,
        /// Extra environment variables.
        #[serde(default)]
        env: BTreeMap<String, String>,
        /// Working directory.
        working_dir: Option<String>,
        /// Timeout in seconds.
        timeout_secs: Option<u64>,
    },
    /// Simulated latency.
    #[serde(rename = "delay")]
    Delay {
        /// How long to wait, in milliseconds.
        delay_ms: u64,
        /// If set, fail with this message after the delay.
        fail: Option<String>,
    },
}

impl OperationConfig {
    /// Build the runnable operation.
    pub fn build(&self) -> Arc<DynOperation> {
        match &self.operation_type {
            OperationTypeConfig::Command {
                program,
                args,
                env,
                working_dir,
                timeout_secs,
            } => {
                let mut builder = CommandOperation::builder(program.as_str())
                    .kind(self.kind.as_str())
                    .args(args.iter().cloned())
                    .envs(env.clone());
                if let Some(dir) = working_dir {
                    builder = builder.working_dir(dir.as_str());
                }
                if let Some(secs) = timeout_secs {
                    builder = builder.timeout(Duration::from_secs(*secs));
                }
                builder.build().into_dyn()
            }
            OperationTypeConfig::Delay { delay_ms, fail } => {
                let mut op =
                    DelayOperation::new(self.kind.as_str(), Duration::from_millis(*delay_ms));
                if let Some(message) = fail {
                    op = op.failing_with(message.as_str());
                }
                op.into_dyn()
            }
        }
    }
}

impl PlanConfig {
    /// Build every operation, in plan order.
    pub fn build_operations(&self) -> Vec<Arc<DynOperation>> {
        self.operations.iter().map(OperationConfig::build).collect()
    }
}

/// YAML configuration loader.
pub struct YamlLoader;

impl YamlLoader {
    /// Load a plan from a file.
    pub fn load_plan(path: impl AsRef<Path>) -> Result<PlanConfig, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadPlan {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PlanConfig =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::ParseFile {
                path: path.to_path_buf(),
                source,
            })?;
        Self::validate_plan(&config)?;
        Ok(config)
    }

    /// Parse a plan from a YAML string.
    pub fn parse_plan(yaml: &str) -> Result<PlanConfig, ConfigError> {
        let config: PlanConfig = serde_yaml::from_str(yaml)?;
        Self::validate_plan(&config)?;
        Ok(config)
    }

    /// Validate a plan.
    fn validate_plan(config: &PlanConfig) -> Result<(), ConfigError> {
        if config.name.trim().is_empty() {
            return Err(ConfigError::MissingField("name".into()));
        }

        if config.operations.is_empty() {
            return Err(ConfigError::EmptyPlan(config.name.clone()));
        }

        for (index, op) in config.operations.iter().enumerate() {
            if op.kind.trim().is_empty() {
                return Err(ConfigError::MissingField(format!(
                    "operations[{}].kind",
                    index
                )));
            }

            if let OperationTypeConfig::Command {
                program,
                timeout_secs,
                ..
            } = &op.operation_type
            {
                if program.trim().is_empty() {
                    return Err(ConfigError::MissingField(format!(
                        "operations[{}].program",
                        index
                    )));
                }
                if *timeout_secs == Some(0) {
                    return Err(ConfigError::InvalidOperation {
                        index,
                        kind: op.kind.clone(),
                        reason: "zero timeout".into(),
                    });
                }
            }
        }

        Ok(())
    }
}
