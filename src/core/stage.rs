//! Stage domain model

use crate::core::{profile::OutputProfile, state::StageState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tools whose version is reported before building
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    /// The package manager (`cargo`)
    PackageManager,
    /// The compiler driver (`rustc`)
    Compiler,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::PackageManager => f.write_str("package manager"),
            Tool::Compiler => f.write_str("compiler"),
        }
    }
}

/// What a stage asks the toolchain to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "arg", rename_all = "snake_case")]
pub enum StageAction {
    ReportVersion(Tool),
    Build(OutputProfile),
    FormatCheck,
    Lint,
}

impl StageAction {
    /// Identifier used in logs and run history
    pub fn id(&self) -> String {
        match self {
            StageAction::ReportVersion(Tool::PackageManager) => "version-cargo".to_string(),
            StageAction::ReportVersion(Tool::Compiler) => "version-rustc".to_string(),
            StageAction::Build(profile) => format!("build-{}", profile),
            StageAction::FormatCheck => "fmt".to_string(),
            StageAction::Lint => "clippy".to_string(),
        }
    }

    /// Banner group a stage belongs to
    pub fn group(&self) -> &'static str {
        match self {
            StageAction::ReportVersion(_) => "toolchain",
            StageAction::Build(_) => "build",
            StageAction::FormatCheck | StageAction::Lint => "check",
        }
    }
}

/// A single ordered unit of work in a job
#[derive(Debug, Clone)]
pub struct Stage {
    /// Unique stage identifier
    pub id: String,

    /// Human-readable label shown in the banner
    pub label: String,

    /// The toolchain invocation this stage wraps
    pub action: StageAction,

    /// Runtime state
    pub state: StageState,
}

impl Stage {
    pub fn new(action: StageAction) -> Self {
        let label = match action {
            StageAction::ReportVersion(tool) => format!("{} version", tool),
            StageAction::Build(profile) => format!("build ({})", profile),
            StageAction::FormatCheck => "format check".to_string(),
            StageAction::Lint => "lint".to_string(),
        };

        Self {
            id: action.id(),
            label,
            action,
            state: StageState::Pending,
        }
    }

    /// The standard stage list: version reports, one build per profile,
    /// then the static checks.
    pub fn standard(profiles: &[OutputProfile]) -> Vec<Stage> {
        let mut stages = vec![
            Stage::new(StageAction::ReportVersion(Tool::PackageManager)),
            Stage::new(StageAction::ReportVersion(Tool::Compiler)),
        ];
        stages.extend(profiles.iter().map(|p| Stage::new(StageAction::Build(*p))));
        stages.push(Stage::new(StageAction::FormatCheck));
        stages.push(Stage::new(StageAction::Lint));
        stages
    }
}
