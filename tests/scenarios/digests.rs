//! Test: digest files next to staged artifacts

use crate::helpers::*;
use buildjob::execution::{verify_digest, Verification};
use buildjob::OutputProfile;
use sha2::{Digest, Sha256};

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[tokio::test]
async fn test_digests_written_for_every_profile() {
    let ws = Workspace::new();
    let result = run_job_with(ws.job("generate_digests: true\n"), ws.toolchain()).await;

    assert!(result.is_success());
    assert_eq!(result.job.digests.len(), 2);

    for profile in [OutputProfile::Debug, OutputProfile::Release] {
        let name = profile.to_string();
        let content = std::fs::read_to_string(ws.digest(&name)).unwrap();
        let expected = sha256_hex(binary_contents(profile).as_bytes());

        assert_eq!(content, format!("{}  {}\n", expected, ARTIFACT));
        assert_eq!(expected.len(), 64);
        assert!(expected.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}

#[tokio::test]
async fn test_digest_matches_staged_bytes() {
    let ws = Workspace::new();
    let result = run_job_with(ws.job("generate_digests: true\n"), ws.toolchain()).await;

    for digest in &result.job.digests {
        let staged = std::fs::read(&digest.artifact).unwrap();
        assert_eq!(digest.hex, sha256_hex(&staged));
        assert!(matches!(
            verify_digest(&digest.path).unwrap(),
            Verification::Match { .. }
        ));
    }
}

#[tokio::test]
async fn test_tampered_artifact_fails_verification() {
    let ws = Workspace::new();
    run_job_with(ws.job("generate_digests: true\n"), ws.toolchain()).await;

    std::fs::write(ws.staged("release"), b"tampered").unwrap();

    match verify_digest(&ws.digest("release")).unwrap() {
        Verification::Mismatch { actual, .. } => assert_eq!(actual, sha256_hex(b"tampered")),
        other => panic!("expected a mismatch, got {:?}", other),
    }
    assert!(verify_digest(&ws.digest("debug")).unwrap().is_match());
}
