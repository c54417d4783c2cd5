//! buildjob - a fail-fast CI build job
//!
//! Builds a single binary in debug and release, runs format and lint checks,
//! stages the binaries, writes SHA-256 digests and carries a publish
//! descriptor for an external distribution system.

pub mod cli;
pub mod core;
pub mod execution;
pub mod persistence;
pub mod toolchain;

// Re-export commonly used types
pub use core::config::JobConfig;
pub use core::{ExecutionStatus, Job, JobError, OutputProfile, Stage, StageAction};
pub use execution::{ExecutionEngine, ExecutionEvent};
pub use toolchain::{CargoToolchain, Toolchain, ToolchainConfig, ToolchainError, ToolchainOutput};
