//! Test: publish descriptor validation happens before any stage runs

use crate::helpers::*;
use buildjob::core::JobError;

#[test]
fn test_publish_entry_for_staged_release() {
    let ws = Workspace::new();
    let extra = format!(
        "publish:\n  - series: image\n    name: {artifact}\n    from_output: {path}\n",
        artifact = ARTIFACT,
        path = ws.staged("release").display()
    );

    let job = ws.job(&extra);
    let by_series = job.publish.by_series();

    assert_eq!(by_series.len(), 1);
    assert_eq!(by_series["image"][0].name, ARTIFACT);
}

#[test]
fn test_digest_can_be_published_when_enabled() {
    let ws = Workspace::new();
    let publish = format!(
        "publish:\n  - series: image\n    name: {artifact}.sha256\n    from_output: {path}\n",
        artifact = ARTIFACT,
        path = ws.digest("release").display()
    );

    assert!(ws.config(&format!("generate_digests: true\n{}", publish)).is_ok());

    let err = ws.config(&publish).unwrap_err();
    assert!(err.to_string().contains("never produces"), "{}", err);
}

#[test]
fn test_dangling_publish_reference_is_rejected() {
    let ws = Workspace::new();
    let extra = format!(
        "publish:\n  - series: image\n    name: other\n    from_output: {}/release/other\n",
        ws.work().display()
    );

    let err = ws.config(&extra).unwrap_err();
    assert!(matches!(err, JobError::Configuration(_)));
    assert!(err.to_string().contains("never produces"), "{}", err);
}

#[test]
fn test_publish_outside_output_rules_is_rejected() {
    let ws = Workspace::new();
    let extra = format!(
        "output_rules:\n  - {work}/debug/*\n\
         publish:\n  - series: image\n    name: {artifact}\n    from_output: {path}\n",
        work = ws.work().display(),
        artifact = ARTIFACT,
        path = ws.staged("release").display()
    );

    let err = ws.config(&extra).unwrap_err();
    assert!(err.to_string().contains("no output rule covers"), "{}", err);
}

#[test]
fn test_unknown_fields_are_rejected() {
    let ws = Workspace::new();
    let err = ws.config("retries: 3\n").unwrap_err();
    assert!(matches!(err, JobError::Configuration(_)));
}
