//! Test: run summaries recorded after a job

use crate::helpers::*;
use buildjob::persistence::{create_summary, InMemoryPersistence, PersistenceBackend};
use buildjob::ExecutionStatus;

#[tokio::test]
async fn test_failed_run_summary() {
    let ws = Workspace::new();
    let toolchain = ws.toolchain().failing("fmt", Some(1), "diff\n");
    let result = run_job_with(ws.job(""), toolchain).await;

    let summary = create_summary(&result.job);
    assert_eq!(summary.status, ExecutionStatus::Failed);
    assert_eq!(summary.failed_stage.as_deref(), Some("fmt"));
    assert_eq!(summary.completed_stages, 4);
    assert!(summary.outputs.is_empty());

    let outcomes: Vec<&str> = summary.stages.iter().map(|s| s.outcome.as_str()).collect();
    assert_eq!(
        outcomes,
        vec!["completed", "completed", "completed", "completed", "failed", "skipped"]
    );
    assert!(summary.stages[5].elapsed_ms.is_none());
}

#[tokio::test]
async fn test_successful_run_is_listed() {
    let ws = Workspace::new();
    let result = run_job_with(ws.job("generate_digests: true\n"), ws.toolchain()).await;

    let store = InMemoryPersistence::new();
    let summary = create_summary(&result.job);
    store.save_run(&summary).await.unwrap();

    let runs = store.list_runs(ARTIFACT).await.unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, ExecutionStatus::Completed);
    assert_eq!(runs[0].outputs.len(), 4);
    assert!(runs[0]
        .outputs
        .contains(&ws.digest("release").to_string_lossy().into_owned()));
}
