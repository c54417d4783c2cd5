//! Scenario-based tests for buildjob

mod digests;
mod failure_handling;
mod history;
mod publish_validation;
mod staging;
mod success;
