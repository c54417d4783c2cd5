//! Core domain models for build jobs
//!
//! This module defines the job definition, its stages, output profiles,
//! the publish descriptor and the error taxonomy.

pub mod config;
pub mod error;
pub mod job;
pub mod profile;
pub mod publish;
pub mod stage;
pub mod state;

pub use error::JobError;
pub use job::*;
pub use profile::OutputProfile;
pub use publish::{OutputRule, PublishDescriptor, PublishEntry};
pub use stage::*;
pub use state::*;
