//! fanstat - run a batch of I/O-bound operations concurrently and report timings.
//!
//! Usage:
//!   fanstat run <plan.yaml>       Run the operations of a plan
//!   fanstat validate <plan.yaml>  Validate a plan without running it
//!   fanstat demo                  Run a simulated batch

use clap::{Parser, Subcommand};
use fanstat::{
    CancellationToken, DelayOperation, DynOperation, Engine, OperationExt, ReportFormat, Summary,
    TracingFaultLogger, YamlLoader, report,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// fanstat - fan-out/fan-in executor with timing statistics
#[derive(Parser)]
#[command(name = "fanstat")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every operation of a plan concurrently
    Run {
        /// Path to the plan YAML file
        #[arg(value_name = "PLAN")]
        plan: PathBuf,

        /// Report format (overrides the plan)
        #[arg(short, long, value_enum)]
        format: Option<ReportFormat>,
    },

    /// Validate a plan without running it
    Validate {
        /// Path to the plan YAML file
        #[arg(value_name = "PLAN")]
        plan: PathBuf,
    },

    /// Run a batch of simulated operations
    Demo {
        /// Delay of each simulated operation, in milliseconds
        #[arg(short, long, value_delimiter = ',', default_value = "2000,3000,4000")]
        delays_ms: Vec<u64>,

        /// Index of an operation that should fail
        #[arg(long)]
        fail_index: Option<usize>,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: ReportFormat,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { plan, format } => {
            run_plan(plan, format).await?;
        }
        Commands::Validate { plan } => {
            validate_plan(plan)?;
        }
        Commands::Demo {
            delays_ms,
            fail_index,
            format,
        } => {
            run_demo(delays_ms, fail_index, format).await?;
        }
    }

    Ok(())
}

/// Load a plan and run its operations.
async fn run_plan(
    path: PathBuf,
    format: Option<ReportFormat>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Loading plan from: {}", path.display());

    let plan = YamlLoader::load_plan(&path)?;
    let operations = plan.build_operations();

    info!(
        "Running plan '{}' with {} operation(s)",
        plan.name,
        operations.len()
    );

    let format = format.unwrap_or(plan.report.format);
    execute(&operations, format, plan.report.time_format()).await
}

/// Validate a plan without running it.
fn validate_plan(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    info!("Validating plan: {}", path.display());

    match YamlLoader::load_plan(&path) {
        Ok(plan) => {
            info!(
                "Plan '{}' is valid: {} operation(s)",
                plan.name,
                plan.operations.len()
            );
            for op in &plan.operations {
                info!("  - {}", op.kind);
            }
            Ok(())
        }
        Err(e) => {
            error!("Validation failed: {}", e);
            Err(e.into())
        }
    }
}

/// Run a batch of simulated operations.
async fn run_demo(
    delays_ms: Vec<u64>,
    fail_index: Option<usize>,
    format: ReportFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let operations: Vec<Arc<DynOperation>> = delays_ms
        .iter()
        .enumerate()
        .map(|(i, ms)| {
            let op =
                DelayOperation::new(format!("simulated_{}", i + 1), Duration::from_millis(*ms));
            if fail_index == Some(i) {
                op.failing_with("simulated failure").into_dyn()
            } else {
                op.into_dyn()
            }
        })
        .collect();

    info!("Running {} simulated operation(s)", operations.len());

    execute(&operations, format, report::DEFAULT_TIME_FORMAT).await
}

/// Fan out `operations`, then print the summary and the statistics table.
async fn execute(
    operations: &[Arc<DynOperation>],
    format: ReportFormat,
    time_format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();

    let watcher = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling operations");
            watcher.cancel();
        }
    });

    let engine = Engine::new().with_logger(Arc::new(TracingFaultLogger));
    let (summary, table) = engine
        .run_dyn_with_stats(operations, |outcomes| Summary::tally(&outcomes), &cancel)
        .await?;

    for message in &summary.errors {
        warn!("{}", message);
    }

    println!("{}", summary);
    println!();
    print!("{}", report::render(&table, format, time_format)?);

    Ok(())
}
