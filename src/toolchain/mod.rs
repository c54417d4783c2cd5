//! Toolchain adapter - the external build, format and lint commands

pub mod config;
pub mod output;
pub mod rusage;
pub mod streaming;
pub mod subprocess;

use crate::core::{OutputProfile, StageAction, Tool};
use async_trait::async_trait;
pub use config::{CommandSpec, ToolchainConfig};
pub use output::{OutputStream, ToolchainError, ToolchainOutput};
pub use streaming::{NoopCallback, OutputCallback};
pub use subprocess::SubprocessRunner;

/// Trait for toolchain execution - allows for different implementations
///
/// Each operation runs one external command to completion. Success means the
/// command exited 0; anything else is a [`ToolchainError`] carrying the exit
/// status and captured output.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Print the version of a tool
    async fn report_version(
        &self,
        tool: Tool,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError>;

    /// Build the project in the given profile
    async fn build(
        &self,
        profile: OutputProfile,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError>;

    /// Fail if any source file is not formatted
    async fn format_check(
        &self,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError>;

    /// Fail on lint violations
    async fn lint(&self, callback: &dyn OutputCallback) -> Result<ToolchainOutput, ToolchainError>;

    /// Command line echoed before a stage runs
    fn describe(&self, action: StageAction) -> String;

    /// Dispatch a stage action to the matching operation
    async fn execute(
        &self,
        action: StageAction,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError> {
        match action {
            StageAction::ReportVersion(tool) => self.report_version(tool, callback).await,
            StageAction::Build(profile) => self.build(profile, callback).await,
            StageAction::FormatCheck => self.format_check(callback).await,
            StageAction::Lint => self.lint(callback).await,
        }
    }
}

/// The cargo/rustc toolchain, driven as subprocesses
#[derive(Debug, Clone)]
pub struct CargoToolchain {
    runner: SubprocessRunner,
}

impl CargoToolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self {
            runner: SubprocessRunner::new(config),
        }
    }

    pub fn config(&self) -> &ToolchainConfig {
        self.runner.config()
    }

    async fn run_action(
        &self,
        action: StageAction,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError> {
        let spec = self.config().command_for(action);
        self.runner.run(&spec, callback).await
    }
}

#[async_trait]
impl Toolchain for CargoToolchain {
    async fn report_version(
        &self,
        tool: Tool,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError> {
        self.run_action(StageAction::ReportVersion(tool), callback).await
    }

    async fn build(
        &self,
        profile: OutputProfile,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError> {
        self.run_action(StageAction::Build(profile), callback).await
    }

    async fn format_check(
        &self,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError> {
        self.run_action(StageAction::FormatCheck, callback).await
    }

    async fn lint(&self, callback: &dyn OutputCallback) -> Result<ToolchainOutput, ToolchainError> {
        self.run_action(StageAction::Lint, callback).await
    }

    fn describe(&self, action: StageAction) -> String {
        self.config().command_for(action).to_string()
    }
}
