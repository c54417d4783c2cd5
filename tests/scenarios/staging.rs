//! Test: staging into an output tree that already exists

use crate::helpers::*;

#[tokio::test]
async fn test_second_run_restages_same_content() {
    let ws = Workspace::new();

    let first = run_job_with(ws.job("generate_digests: true\n"), ws.toolchain()).await;
    assert!(first.is_success());
    let staged = std::fs::read(ws.staged("release")).unwrap();
    let digest = std::fs::read_to_string(ws.digest("release")).unwrap();

    let second = run_job_with(ws.job("generate_digests: true\n"), ws.toolchain()).await;
    assert!(second.is_success());
    assert_eq!(std::fs::read(ws.staged("release")).unwrap(), staged);
    assert_eq!(std::fs::read_to_string(ws.digest("release")).unwrap(), digest);
}

#[tokio::test]
async fn test_stale_artifact_is_replaced() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.work().join("debug")).unwrap();
    std::fs::write(ws.staged("debug"), b"left over from last week").unwrap();

    let result = run_job_with(ws.job(""), ws.toolchain()).await;

    assert!(result.is_success());
    assert_eq!(
        std::fs::read_to_string(ws.staged("debug")).unwrap(),
        binary_contents(buildjob::OutputProfile::Debug)
    );
}

#[tokio::test]
async fn test_output_outside_rules_is_staged_but_flagged() {
    let ws = Workspace::new();
    let extra = format!("output_rules:\n  - {}/release/*\n", ws.work().display());

    let result = run_job_with(ws.job(&extra), ws.toolchain()).await;

    assert!(result.is_success());
    assert!(ws.staged("debug").exists());
    let flagged: Vec<bool> = result
        .events
        .iter()
        .filter_map(|e| match e {
            buildjob::ExecutionEvent::ArtifactStaged { collectible, .. } => Some(*collectible),
            _ => None,
        })
        .collect();
    assert_eq!(flagged, vec![false, true]);
}
