//! Job configuration from YAML

use crate::core::{
    error::JobError,
    job::{self, Job, RunnerPolicy, StagingLayout},
    profile::OutputProfile,
    publish::{OutputRule, PublishDescriptor, PublishEntry},
};
use crate::toolchain::ToolchainConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Top-level job configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    /// Job name
    pub name: String,

    /// Target platform identifier
    #[serde(default = "default_target")]
    pub target: String,

    /// Toolchain channel (e.g. "stable", "nightly-2024-01-01")
    #[serde(default = "default_channel")]
    pub rust_toolchain: String,

    /// Name of the binary the build produces
    pub artifact: String,

    /// Root of the staging tree
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Toolchain output directory, relative to `working_dir` unless absolute
    #[serde(default = "default_target_dir")]
    pub target_dir: PathBuf,

    /// Directory the toolchain runs in
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,

    /// Profiles to build and stage
    #[serde(default = "default_profiles")]
    pub profiles: Vec<OutputProfile>,

    /// Whether to write `<artifact>.sha256` next to each staged artifact
    #[serde(default)]
    pub generate_digests: bool,

    /// Glob patterns the CI host may collect; derived from profiles when empty
    #[serde(default)]
    pub output_rules: Vec<String>,

    /// Publish entries read by the distribution system after the job
    #[serde(default)]
    pub publish: Vec<PublishEntry>,

    /// Stage runner policy
    #[serde(default)]
    pub policy: RunnerPolicy,

    /// Toolchain executables and environment
    #[serde(default)]
    pub toolchain: ToolchainSettings,
}

/// Toolchain section of the job file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolchainSettings {
    #[serde(default = "default_cargo")]
    pub cargo: String,

    #[serde(default = "default_rustc")]
    pub rustc: String,

    /// Extra environment passed to every toolchain command
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Default for ToolchainSettings {
    fn default() -> Self {
        Self {
            cargo: default_cargo(),
            rustc: default_rustc(),
            env: BTreeMap::new(),
        }
    }
}

fn default_target() -> String {
    "host".to_string()
}

fn default_channel() -> String {
    "stable".to_string()
}

fn default_output_root() -> PathBuf {
    PathBuf::from("/work")
}

fn default_target_dir() -> PathBuf {
    PathBuf::from("target")
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_profiles() -> Vec<OutputProfile> {
    OutputProfile::ALL.to_vec()
}

fn default_cargo() -> String {
    "cargo".to_string()
}

fn default_rustc() -> String {
    "rustc".to_string()
}

impl JobConfig {
    /// Load job configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, JobError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| JobError::io(path, e))?;
        Self::from_yaml(&content)
    }

    /// Parse job configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, JobError> {
        let config: JobConfig =
            serde_yaml::from_str(yaml).map_err(|e| JobError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Point the staging tree somewhere else. Explicit output rules are kept;
    /// derived ones follow the new root.
    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    /// Run the toolchain in a different directory
    pub fn with_working_dir(mut self, working_dir: impl Into<PathBuf>) -> Self {
        self.working_dir = working_dir.into();
        self
    }

    /// Validate the job configuration
    ///
    /// Everything that can be checked without running a stage is checked
    /// here, so a bad publish rule fails before any build work is done.
    pub fn validate(&self) -> Result<(), JobError> {
        if self.name.trim().is_empty() {
            return Err(JobError::Configuration("job name must not be empty".into()));
        }

        if self.artifact.trim().is_empty()
            || self.artifact.contains('/')
            || self.artifact == "."
            || self.artifact == ".."
        {
            return Err(JobError::Configuration(format!(
                "invalid artifact name '{}'",
                self.artifact
            )));
        }

        if self.profiles.is_empty() {
            return Err(JobError::Configuration(
                "at least one output profile is required".into(),
            ));
        }

        let mut seen = HashSet::new();
        for profile in &self.profiles {
            if !seen.insert(profile) {
                return Err(JobError::Configuration(format!(
                    "profile '{}' listed more than once",
                    profile
                )));
            }
        }

        let rules = self.compiled_output_rules()?;
        let produced = self.produced_paths();

        for path in &produced {
            if !rules.iter().any(|r| r.matches(path)) {
                tracing::warn!(
                    "{} is not covered by any output rule and will not be collected",
                    path
                );
            }
        }

        PublishDescriptor::new(self.publish.clone())
            .validate(&rules, &produced)
            .map_err(JobError::Configuration)
    }

    /// Output rules as written, or one `<root>/<profile>/*` rule per profile
    pub fn effective_output_rules(&self) -> Vec<String> {
        if !self.output_rules.is_empty() {
            return self.output_rules.clone();
        }

        self.sorted_profiles()
            .iter()
            .map(|p| {
                p.staging_dir(&self.output_root)
                    .join("*")
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    pub(crate) fn compiled_output_rules(&self) -> Result<Vec<OutputRule>, JobError> {
        self.effective_output_rules()
            .iter()
            .map(|pattern| {
                OutputRule::new(pattern).map_err(|e| {
                    JobError::Configuration(format!("invalid output rule '{}': {}", pattern, e))
                })
            })
            .collect()
    }

    /// Every path the job writes on success, in staging order
    pub fn produced_paths(&self) -> Vec<String> {
        job::produced_paths(
            &self.layout(),
            &self.sorted_profiles(),
            &self.artifact,
            self.generate_digests,
        )
        .iter()
        .map(|path| path.to_string_lossy().into_owned())
        .collect()
    }

    pub(crate) fn sorted_profiles(&self) -> Vec<OutputProfile> {
        let mut profiles = self.profiles.clone();
        profiles.sort();
        profiles.dedup();
        profiles
    }

    pub fn layout(&self) -> StagingLayout {
        StagingLayout::new(&self.working_dir, &self.target_dir, &self.output_root)
    }

    /// Explicit toolchain configuration for this job
    pub fn toolchain_config(&self) -> ToolchainConfig {
        ToolchainConfig::new()
            .with_cargo(self.toolchain.cargo.clone())
            .with_rustc(self.toolchain.rustc.clone())
            .with_channel(self.rust_toolchain.clone())
            .with_working_dir(self.working_dir.clone())
            .with_env(self.toolchain.env.clone())
    }

    /// Convert config to a Job domain model
    pub fn to_job(&self) -> Result<Job, JobError> {
        Job::from_config(self)
    }
}
