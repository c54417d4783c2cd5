//! Job error taxonomy

use crate::core::OutputProfile;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal job errors. None of these are retried.
#[derive(Debug, Error)]
pub enum JobError {
    /// An external toolchain command failed or could not be started
    #[error("stage '{stage}' failed{}", status_suffix(.status))]
    Toolchain {
        stage: String,
        status: Option<i32>,
        output: String,
    },

    /// A build reported success but left no binary behind
    #[error("{profile} build produced no artifact at {}", .path.display())]
    MissingArtifact {
        profile: OutputProfile,
        path: PathBuf,
    },

    /// The job definition is invalid
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn status_suffix(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!(" with exit code {}", code),
        None => String::new(),
    }
}

impl JobError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        JobError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this failure
    ///
    /// Toolchain failures propagate the command's own exit code; everything
    /// else (including signal deaths) maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            JobError::Toolchain {
                status: Some(code), ..
            } if *code != 0 => *code,
            _ => 1,
        }
    }

    /// Captured output of the failing command, if any
    pub fn captured_output(&self) -> Option<&str> {
        match self {
            JobError::Toolchain { output, .. } => Some(output),
            _ => None,
        }
    }
}
