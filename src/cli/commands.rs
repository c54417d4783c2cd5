//! CLI command definitions

use clap::Args;
use std::path::PathBuf;

/// Run a build job
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to job YAML file
    #[arg(short, long)]
    pub file: String,

    /// Override the staging root
    #[arg(long)]
    pub output_root: Option<PathBuf>,

    /// Override the directory the toolchain runs in
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Run every stage even after a failure (the job still fails)
    #[arg(long)]
    pub keep_going: bool,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate a job definition
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to job YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show what a job would do
#[derive(Debug, Args, Clone)]
pub struct PlanCommand {
    /// Path to job YAML file
    #[arg(short, long)]
    pub file: String,
}

/// Print the publish descriptor
#[derive(Debug, Args, Clone)]
pub struct PublishCommand {
    /// Path to job YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Verify digest files
#[derive(Debug, Args, Clone)]
pub struct VerifyCommand {
    /// Digest files (`<artifact>.sha256`)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Job name to filter by
    #[arg(short, long)]
    pub job: Option<String>,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
