//! Test: Failure Handling - fail-fast and exit code propagation

use crate::helpers::*;
use buildjob::core::JobError;

/// Format check fails after both builds succeeded
#[tokio::test]
async fn test_format_failure_stages_nothing() {
    let ws = Workspace::new();
    let toolchain = ws
        .toolchain()
        .failing("fmt", Some(1), "Diff in src/main.rs at line 3:\n");
    let calls = toolchain.clone();

    let result = run_job_with(ws.job("generate_digests: true\n"), toolchain).await;

    assert!(!result.is_success());
    assert_eq!(result.exit_code(), 1);
    assert_stage_completed(&result, "build-debug");
    assert_stage_completed(&result, "build-release");
    assert_stage_failed(&result, "fmt");
    assert_stage_skipped(&result, "clippy");
    assert!(!calls.calls().contains(&"clippy".to_string()));

    // Both binaries exist in the target dir but none were staged
    assert!(ws.target().join("debug").join(ARTIFACT).exists());
    assert_nothing_staged(&ws, &result);
}

/// Lint output ends up in the failure report
#[tokio::test]
async fn test_lint_failure_reports_output() {
    let ws = Workspace::new();
    let lint_output =
        "error: this looks like you are swapping `a` and `b` manually\n  --> src/lib.rs:12:5\n";
    let toolchain = ws.toolchain().failing("clippy", Some(101), lint_output);

    let result = run_job_with(ws.job("generate_digests: true\n"), toolchain).await;

    assert_eq!(result.exit_code(), 101);
    match result.result.as_ref().unwrap_err() {
        JobError::Toolchain { stage, output, .. } => {
            assert_eq!(stage, "lint");
            assert_eq!(output, lint_output);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(
        result.stage_output("clippy"),
        vec![
            "error: this looks like you are swapping `a` and `b` manually",
            "  --> src/lib.rs:12:5"
        ]
    );
    assert_eq!(result.job.state.failed_stage.as_deref(), Some("clippy"));
    assert_nothing_staged(&ws, &result);
}

#[tokio::test]
async fn test_version_probe_failure_stops_before_building() {
    let ws = Workspace::new();
    let toolchain = ws.toolchain().failing("version-cargo", Some(127), "cargo: not found\n");
    let calls = toolchain.clone();

    let result = run_job_with(ws.job(""), toolchain).await;

    assert_eq!(result.exit_code(), 127);
    assert_eq!(calls.calls(), vec!["version-cargo"]);
    for stage in ["version-rustc", "build-debug", "build-release", "fmt", "clippy"] {
        assert_stage_skipped(&result, stage);
    }
    assert!(!ws.target().exists());
}

/// A command killed by a signal has no exit code
#[tokio::test]
async fn test_signal_death_exits_with_one() {
    let ws = Workspace::new();
    let toolchain = ws.toolchain().failing("build-release", None, "");

    let result = run_job_with(ws.job(""), toolchain).await;

    assert_eq!(result.exit_code(), 1);
    assert_stage_failed(&result, "build-release");
    assert_nothing_staged(&ws, &result);
}

/// With abort_on_failure off every stage runs, but the first failure wins
#[tokio::test]
async fn test_keep_going_reports_first_failure() {
    let ws = Workspace::new();
    let toolchain = ws
        .toolchain()
        .failing("fmt", Some(1), "fmt diff\n")
        .failing("clippy", Some(101), "clippy error\n");
    let calls = toolchain.clone();

    let result = run_job_with(
        ws.job("policy:\n  abort_on_failure: false\n"),
        toolchain,
    )
    .await;

    assert_eq!(calls.calls().len(), 6);
    assert_eq!(result.exit_code(), 1);
    assert_eq!(result.result.as_ref().unwrap_err().captured_output(), Some("fmt diff\n"));
    assert_stage_failed(&result, "fmt");
    assert_stage_failed(&result, "clippy");
    assert_eq!(result.job.state.failed_stage.as_deref(), Some("fmt"));
    assert_nothing_staged(&ws, &result);
}

/// A build that claims success without producing a binary
#[tokio::test]
async fn test_missing_binary_fails_the_job() {
    let ws = Workspace::new();
    let toolchain = ws.toolchain().without_binary(buildjob::OutputProfile::Release);

    let result = run_job_with(ws.job(""), toolchain).await;

    assert_eq!(result.exit_code(), 1);
    assert!(matches!(
        result.result,
        Err(JobError::MissingArtifact { .. })
    ));
    assert_eq!(result.job.state.status, buildjob::ExecutionStatus::Failed);
    assert_nothing_staged(&ws, &result);
}
