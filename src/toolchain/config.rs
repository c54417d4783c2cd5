//! Toolchain configuration
//!
//! Everything a toolchain invocation depends on is carried here explicitly:
//! executables, channel, working directory and environment. Nothing is read
//! from or written to the ambient process state.

use crate::core::{StageAction, Tool};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Configuration for the toolchain adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainConfig {
    /// Package manager executable
    pub cargo: String,

    /// Compiler driver executable
    pub rustc: String,

    /// Channel passed to the children as `RUSTUP_TOOLCHAIN`
    pub channel: Option<String>,

    /// Directory every command runs in
    pub working_dir: PathBuf,

    /// Extra environment for every command
    pub env: BTreeMap<String, String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            cargo: "cargo".to_string(),
            rustc: "rustc".to_string(),
            channel: None,
            working_dir: PathBuf::from("."),
            env: BTreeMap::new(),
        }
    }
}

impl ToolchainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cargo(mut self, cargo: String) -> Self {
        self.cargo = cargo;
        self
    }

    pub fn with_rustc(mut self, rustc: String) -> Self {
        self.rustc = rustc;
        self
    }

    pub fn with_channel(mut self, channel: String) -> Self {
        self.channel = Some(channel);
        self
    }

    pub fn with_working_dir(mut self, working_dir: PathBuf) -> Self {
        self.working_dir = working_dir;
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Environment actually handed to a child process
    pub fn child_env(&self) -> BTreeMap<String, String> {
        let mut env = self.env.clone();
        if let Some(channel) = &self.channel {
            env.insert("RUSTUP_TOOLCHAIN".to_string(), channel.clone());
        }
        env
    }

    /// The command line a stage action maps to
    pub fn command_for(&self, action: StageAction) -> CommandSpec {
        match action {
            StageAction::ReportVersion(Tool::PackageManager) => {
                CommandSpec::new(&self.cargo, &["--version"])
            }
            StageAction::ReportVersion(Tool::Compiler) => {
                CommandSpec::new(&self.rustc, &["--version"])
            }
            StageAction::Build(profile) => {
                let mut args = vec!["build"];
                args.extend_from_slice(profile.build_args());
                CommandSpec::new(&self.cargo, &args)
            }
            StageAction::FormatCheck => CommandSpec::new(&self.cargo, &["fmt", "--", "--check"]),
            StageAction::Lint => CommandSpec::new(&self.cargo, &["clippy"]),
        }
    }
}

/// A program plus its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
