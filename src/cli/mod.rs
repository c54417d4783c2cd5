//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{
    HistoryCommand, PlanCommand, PublishCommand, RunCommand, ValidateCommand, VerifyCommand,
};
use std::ffi::OsString;

/// Fail-fast CI build job runner
#[derive(Debug, Parser, Clone)]
#[command(name = "buildjob")]
#[command(author = "buildjob Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Builds, checks, stages and digests a Rust binary", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress streamed command output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a build job
    Run(RunCommand),

    /// Validate a job definition
    Validate(ValidateCommand),

    /// Show the stages and outputs of a job without running it
    Plan(PlanCommand),

    /// Print the publish descriptor of a job
    Publish(PublishCommand),

    /// Check staged artifacts against their digest files
    Verify(VerifyCommand),

    /// Show run history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
