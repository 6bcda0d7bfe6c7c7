//! Plan loading, execution and reporting.

use fanstat::report::{render, render_text};
use fanstat::{CancellationToken, ConfigError, Engine, ReportFormat, Summary, YamlLoader};

use crate::common::{assert_table_invariants, write_plan};

const MIXED_PLAN: &str = r#"
name: mixed-batch
report:
  format: json
operations:
  - kind: warmup
    type: delay
    delay_ms: 50
  - kind: echo
    type: command
    program: echo
    args: ["hello"]
  - kind: flaky
    type: delay
    delay_ms: 20
    fail: upstream returned 503
  - kind: exit_code
    type: command
    program: sh
    args: ["-c", "exit 4"]
"#;

#[tokio::test]
async fn test_run_plan_from_disk() {
    let file = write_plan(MIXED_PLAN);
    let plan = YamlLoader::load_plan(file.path()).unwrap();
    let ops = plan.build_operations();

    let (summary, table) = Engine::new()
        .run_dyn_with_stats(&ops, |o| Summary::tally(&o), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.to_string(), "Total=4, Success=2, Failures=2");
    assert!(summary.errors[0].contains("upstream returned 503"));
    assert!(summary.errors[1].contains("code 4"));
    assert_table_invariants(&table, 4);
}

#[tokio::test]
async fn test_plan_report_format_is_honored() {
    let plan = YamlLoader::parse_plan(MIXED_PLAN).unwrap();
    let ops = plan.build_operations();

    let (_, table) = Engine::new()
        .run_dyn_with_stats(&ops, |o| o.len(), &CancellationToken::new())
        .await
        .unwrap();

    let rendered = render(&table, plan.report.format, plan.report.time_format()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&rendered).unwrap();

    assert_eq!(plan.report.format, ReportFormat::Json);
    assert_eq!(json["rows"].as_array().unwrap().len(), 7);
    assert_eq!(json["rows"][0]["label"], "warmup");
    assert_eq!(json["rows"][6]["label"], "Overall Execution");
}

#[tokio::test]
async fn test_text_report_lists_every_operation() {
    let plan = YamlLoader::parse_plan(MIXED_PLAN).unwrap();
    let ops = plan.build_operations();

    let (_, table) = Engine::new()
        .run_dyn_with_stats(&ops, |_| (), &CancellationToken::new())
        .await
        .unwrap();

    let text = render_text(&table, plan.report.time_format());
    for label in ["warmup", "echo", "flaky", "exit_code", "Aggregation Processing"] {
        assert!(text.contains(label), "missing {label} in:\n{text}");
    }
}

#[test]
fn test_invalid_plan_on_disk_reports_file() {
    let file = write_plan("name: broken\noperations: [\n");

    let err = YamlLoader::load_plan(file.path()).unwrap_err();

    assert!(matches!(err, ConfigError::ParseFile { .. }));
    assert!(err.to_string().contains(&file.path().display().to_string()));
}
