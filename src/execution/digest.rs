//! Digest generator - SHA-256 checksum files beside staged artifacts
//!
//! The file format is the one `sha256sum` writes and `sha256sum -c` reads:
//! `<64 lowercase hex>  <file name>\n`.

use crate::core::{digest_path_for, Artifact, Digest, JobError};
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes `<artifact>.sha256` files
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestGenerator;

impl DigestGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Hash a staged artifact and write its checksum file
    pub fn digest(&self, artifact: &Artifact) -> Result<Digest, JobError> {
        let hex = hash_file(&artifact.destination)?;
        let path = digest_path_for(&artifact.destination);
        let line = format_checksum_line(&hex, &artifact.destination);

        std::fs::write(&path, line).map_err(|e| JobError::io(&path, e))?;
        info!("Wrote {} ({})", path.display(), hex);

        Ok(Digest {
            hex,
            artifact: artifact.destination.clone(),
            path,
        })
    }
}

/// SHA-256 of a file's contents, lowercase hex
pub fn hash_file(path: &Path) -> Result<String, JobError> {
    let mut file = File::open(path).map_err(|e| JobError::io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = file.read(&mut buf).map_err(|e| JobError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// `<hex>  <file name>\n`
pub fn format_checksum_line(hex: &str, artifact: &Path) -> String {
    let name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}  {}\n", hex, name)
}

/// Parse a checksum line into (hex, file name)
pub fn parse_checksum_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim_end_matches(['\n', '\r']);
    let (hex, name) = line.split_once("  ")?;
    let valid = hex.len() == 64
        && hex
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase());
    if !valid || name.is_empty() {
        return None;
    }
    Some((hex, name))
}

/// Outcome of re-checking a digest file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The artifact still hashes to the recorded value
    Match { artifact: PathBuf, hex: String },
    /// The artifact changed since the digest was written
    Mismatch {
        artifact: PathBuf,
        expected: String,
        actual: String,
    },
}

impl Verification {
    pub fn is_match(&self) -> bool {
        matches!(self, Verification::Match { .. })
    }
}

/// Recompute the checksum of the artifact a digest file names
///
/// The artifact is looked up next to the digest file, as `sha256sum -c`
/// would when run from that directory.
pub fn verify_digest(digest_path: &Path) -> Result<Verification, JobError> {
    let content =
        std::fs::read_to_string(digest_path).map_err(|e| JobError::io(digest_path, e))?;
    let (expected, name) = parse_checksum_line(&content).ok_or_else(|| {
        JobError::Configuration(format!(
            "{} is not a checksum file",
            digest_path.display()
        ))
    })?;

    let artifact = digest_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(name);
    let actual = hash_file(&artifact)?;

    if actual == expected {
        Ok(Verification::Match {
            artifact,
            hex: actual,
        })
    } else {
        Ok(Verification::Mismatch {
            artifact,
            expected: expected.to_string(),
            actual,
        })
    }
}
