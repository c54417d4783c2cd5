//! Toolchain result types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for toolchain invocations
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{}", describe_exit(.status))]
    Failed {
        status: Option<i32>,
        output: String,
        /// Peak resident set size of the command in KiB, when the host reports it
        peak_rss_kib: Option<u64>,
    },

    #[error("I/O error while running command: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("command exited with code {}", code),
        None => "command terminated by signal".to_string(),
    }
}

impl ToolchainError {
    /// Exit status of the failed command, if it ran to completion
    pub fn status(&self) -> Option<i32> {
        match self {
            ToolchainError::Failed { status, .. } => *status,
            _ => None,
        }
    }

    /// Whatever the command printed, or the error itself if it never ran
    pub fn output(&self) -> String {
        match self {
            ToolchainError::Failed { output, .. } => output.clone(),
            other => other.to_string(),
        }
    }

    /// Peak memory of the failed command in KiB
    pub fn peak_rss_kib(&self) -> Option<u64> {
        match self {
            ToolchainError::Failed { peak_rss_kib, .. } => *peak_rss_kib,
            _ => None,
        }
    }
}

/// Which pipe a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Successful toolchain invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolchainOutput {
    /// Exit status (always 0 for real commands)
    pub status: i32,

    /// Captured stdout and stderr, interleaved in arrival order
    pub output: String,

    /// Peak resident set size of the command in KiB
    #[serde(default)]
    pub peak_rss_kib: Option<u64>,
}

impl ToolchainOutput {
    pub fn new(output: String) -> Self {
        Self {
            status: 0,
            output,
            peak_rss_kib: None,
        }
    }
}
