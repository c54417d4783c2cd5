//! Job domain model

use crate::core::{
    config::JobConfig,
    error::JobError,
    profile::OutputProfile,
    publish::{OutputRule, PublishDescriptor},
    stage::Stage,
    state::{JobState, StageState},
};
use crate::toolchain::ToolchainConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Stage runner policy flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerPolicy {
    /// Stop at the first failing stage
    pub abort_on_failure: bool,

    /// Echo each command line before running it
    pub log_each_invocation: bool,
}

impl Default for RunnerPolicy {
    fn default() -> Self {
        Self {
            abort_on_failure: true,
            log_each_invocation: true,
        }
    }
}

/// Where binaries come from and where they are staged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingLayout {
    /// Toolchain output directory (already resolved against the working dir)
    pub target_dir: PathBuf,

    /// Root of the staging tree
    pub output_root: PathBuf,
}

impl StagingLayout {
    pub fn new(working_dir: &Path, target_dir: &Path, output_root: &Path) -> Self {
        Self {
            target_dir: working_dir.join(target_dir),
            output_root: output_root.to_path_buf(),
        }
    }

    pub fn source_path(&self, profile: OutputProfile, artifact: &str) -> PathBuf {
        profile.source_dir(&self.target_dir).join(artifact)
    }

    pub fn destination_path(&self, profile: OutputProfile, artifact: &str) -> PathBuf {
        profile.staging_dir(&self.output_root).join(artifact)
    }
}

/// Path of the digest file for a staged artifact: `<artifact>.sha256`
pub fn digest_path_for(artifact: &Path) -> PathBuf {
    let mut path = artifact.as_os_str().to_owned();
    path.push(".sha256");
    PathBuf::from(path)
}

/// A staged copy of a compiled binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub name: String,
    pub profile: OutputProfile,
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// A checksum file written beside an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    /// Lowercase hex SHA-256
    pub hex: String,

    /// The artifact the digest covers
    pub artifact: PathBuf,

    /// The `.sha256` file
    pub path: PathBuf,
}

/// A job definition plus its runtime state
#[derive(Debug, Clone)]
pub struct Job {
    /// Job name
    pub name: String,

    /// Target platform identifier
    pub target: String,

    /// Toolchain channel
    pub channel: String,

    /// Binary name
    pub artifact_name: String,

    /// Profiles in canonical order
    pub profiles: Vec<OutputProfile>,

    /// Stages in execution order
    pub stages: Vec<Stage>,

    pub output_rules: Vec<OutputRule>,

    pub publish: PublishDescriptor,

    pub generate_digests: bool,

    pub policy: RunnerPolicy,

    pub layout: StagingLayout,

    pub toolchain: ToolchainConfig,

    /// Execution state
    pub state: JobState,

    /// Artifacts staged so far
    pub artifacts: Vec<Artifact>,

    /// Digests written so far
    pub digests: Vec<Digest>,
}

impl Job {
    /// Create a job from configuration
    pub fn from_config(config: &JobConfig) -> Result<Self, JobError> {
        config.validate()?;

        let profiles = config.sorted_profiles();
        let output_rules = config.compiled_output_rules()?;

        Ok(Job {
            name: config.name.clone(),
            target: config.target.clone(),
            channel: config.rust_toolchain.clone(),
            artifact_name: config.artifact.clone(),
            stages: Stage::standard(&profiles),
            profiles,
            output_rules,
            publish: PublishDescriptor::new(config.publish.clone()),
            generate_digests: config.generate_digests,
            policy: config.policy,
            layout: config.layout(),
            toolchain: config.toolchain_config(),
            state: JobState::new(),
            artifacts: Vec::new(),
            digests: Vec::new(),
        })
    }

    /// Get a stage by ID
    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Get a mutable stage by ID
    pub fn stage_mut(&mut self, id: &str) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.id == id)
    }

    /// Check if every stage reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.stages.iter().all(|s| s.state.is_terminal())
    }

    /// Check if every stage completed successfully
    pub fn all_stages_succeeded(&self) -> bool {
        self.stages
            .iter()
            .all(|s| matches!(s.state, StageState::Completed { .. }))
    }

    /// Whether the CI host will collect `path`
    pub fn is_collectible(&self, path: &Path) -> bool {
        let path = path.to_string_lossy();
        self.output_rules.iter().any(|r| r.matches(&path))
    }

    /// Every path a successful run writes, in staging order
    pub fn produced_paths(&self) -> Vec<PathBuf> {
        produced_paths(
            &self.layout,
            &self.profiles,
            &self.artifact_name,
            self.generate_digests,
        )
    }
}

/// Staged binaries for `profiles`, each followed by its digest when enabled
pub fn produced_paths(
    layout: &StagingLayout,
    profiles: &[OutputProfile],
    artifact: &str,
    digests: bool,
) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for profile in profiles {
        let staged = layout.destination_path(*profile, artifact);
        if digests {
            let digest = digest_path_for(&staged);
            paths.push(staged);
            paths.push(digest);
        } else {
            paths.push(staged);
        }
    }
    paths
}
