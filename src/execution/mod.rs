//! Job execution engine

pub mod digest;
pub mod engine;
pub mod executor;
pub mod stager;

pub use digest::{verify_digest, DigestGenerator, Verification};
pub use engine::{ExecutionEngine, ExecutionEvent};
pub use executor::{ExecutionResult, StageExecutor};
pub use stager::ArtifactStager;
