//! Artifact stager - copies built binaries into the staging tree

use crate::core::{Artifact, JobError, OutputProfile, StagingLayout};
use std::fs;
use tracing::{debug, info};

/// Copies a profile's binary from the toolchain output into its staging dir
#[derive(Debug, Clone)]
pub struct ArtifactStager {
    layout: StagingLayout,
    artifact_name: String,
}

impl ArtifactStager {
    pub fn new(layout: StagingLayout, artifact_name: impl Into<String>) -> Self {
        Self {
            layout,
            artifact_name: artifact_name.into(),
        }
    }

    /// Fail unless every profile left a binary behind
    pub fn check_sources(&self, profiles: &[OutputProfile]) -> Result<(), JobError> {
        for &profile in profiles {
            let source = self.layout.source_path(profile, &self.artifact_name);
            if !source.is_file() {
                return Err(JobError::MissingArtifact {
                    profile,
                    path: source,
                });
            }
        }
        Ok(())
    }

    /// Stage the binary for `profile`
    ///
    /// The destination directory is created if needed; an existing directory
    /// or a stale file from an earlier run is not an error, the copy simply
    /// overwrites it.
    pub fn stage(&self, profile: OutputProfile) -> Result<Artifact, JobError> {
        let source = self.layout.source_path(profile, &self.artifact_name);
        let destination = self.layout.destination_path(profile, &self.artifact_name);

        if !source.is_file() {
            return Err(JobError::MissingArtifact {
                profile,
                path: source,
            });
        }

        let dest_dir = profile.staging_dir(&self.layout.output_root);
        fs::create_dir_all(&dest_dir).map_err(|e| JobError::io(&dest_dir, e))?;

        if destination.exists() {
            debug!("Overwriting previously staged {}", destination.display());
        }

        let bytes = fs::copy(&source, &destination).map_err(|e| JobError::io(&destination, e))?;
        info!(
            "Staged {} -> {} ({} bytes)",
            source.display(),
            destination.display(),
            bytes
        );

        Ok(Artifact {
            name: self.artifact_name.clone(),
            profile,
            source,
            destination,
        })
    }
}
