//! Test: a clean run builds, checks and stages both profiles

use crate::helpers::*;
use buildjob::core::ExecutionStatus;

#[tokio::test]
async fn test_all_stages_succeed() {
    let ws = Workspace::new();
    let toolchain = ws.toolchain();
    let calls = toolchain.clone();

    let result = run_job_with(ws.job(""), toolchain).await;

    assert!(result.is_success(), "{:?}", result.result.as_ref().err());
    assert_eq!(result.exit_code(), 0);
    assert_eq!(
        calls.calls(),
        vec!["version-cargo", "version-rustc", "build-debug", "build-release", "fmt", "clippy"]
    );
    for stage in calls.calls() {
        assert_stage_completed(&result, &stage);
    }

    assert_eq!(
        std::fs::read_to_string(ws.staged("debug")).unwrap(),
        binary_contents(buildjob::OutputProfile::Debug)
    );
    assert_eq!(
        std::fs::read_to_string(ws.staged("release")).unwrap(),
        binary_contents(buildjob::OutputProfile::Release)
    );

    // Digests are off unless asked for
    assert!(!ws.digest("debug").exists());
    assert!(result.job.digests.is_empty());
}

#[tokio::test]
async fn test_banners_announce_every_stage_in_order() {
    let ws = Workspace::new();
    let result = run_job_with(ws.job(""), ws.toolchain()).await;

    assert_eq!(
        result.banners(),
        vec![
            "package manager version",
            "compiler version",
            "build (debug)",
            "build (release)",
            "format check",
            "lint",
        ]
    );
    assert_eq!(result.stage_output("build-release"), vec!["build-release ok"]);
}

#[tokio::test]
async fn test_stage_timings_are_recorded() {
    let ws = Workspace::new();
    let result = run_job_with(ws.job(""), ws.toolchain()).await;

    for stage in &result.job.stages {
        assert!(stage.state.measurement().is_some(), "{} has no timing", stage.id);
    }
    assert_eq!(result.job.state.completed_stages, 6);
    assert_eq!(result.job.state.status, ExecutionStatus::Completed);
    assert!(result.job.state.completed_at.is_some());
}

#[tokio::test]
async fn test_release_only_job() {
    let ws = Workspace::new();
    let toolchain = ws.toolchain();
    let calls = toolchain.clone();

    let result = run_job_with(ws.job("profiles: [release]\n"), toolchain).await;

    assert!(result.is_success());
    assert!(!calls.calls().contains(&"build-debug".to_string()));
    assert!(ws.staged("release").exists());
    assert!(!ws.staged("debug").exists());
}
