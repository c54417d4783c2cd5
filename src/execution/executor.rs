//! Stage executor - runs a single stage against the toolchain

use crate::{
    core::{Stage, StageAction, StageMeasurement},
    toolchain::{OutputCallback, Toolchain},
};
use std::time::Instant;
use tracing::{debug, error, info};

/// Result of executing a stage
#[derive(Debug, Clone)]
pub enum ExecutionResult {
    /// Command exited 0
    Success {
        output: String,
        measurement: StageMeasurement,
    },
    /// Command failed or could not be started
    Failed {
        error: String,
        status: Option<i32>,
        output: String,
        measurement: StageMeasurement,
    },
}

/// Executes a single stage
pub struct StageExecutor<T> {
    toolchain: T,
}

impl<T: Toolchain> StageExecutor<T> {
    pub fn new(toolchain: T) -> Self {
        Self { toolchain }
    }

    /// Command line the stage will run
    pub fn describe(&self, action: StageAction) -> String {
        self.toolchain.describe(action)
    }

    /// Execute a stage and return the measured result
    ///
    /// Returns once the command has exited and its outcome is logged.
    pub async fn execute(&self, stage: &Stage, callback: &dyn OutputCallback) -> ExecutionResult {
        info!("Executing stage: {}", stage.id);

        let started = Instant::now();
        let result = self.toolchain.execute(stage.action, callback).await;
        let elapsed = started.elapsed();

        match result {
            Ok(output) => {
                let measurement = StageMeasurement::new(elapsed, output.peak_rss_kib);
                info!(
                    "Stage {} completed in {}ms",
                    stage.id, measurement.elapsed_ms
                );
                debug!(
                    "Stage {} produced {} bytes of output",
                    stage.id,
                    output.output.len()
                );
                ExecutionResult::Success {
                    output: output.output,
                    measurement,
                }
            }
            Err(e) => {
                let measurement = StageMeasurement::new(elapsed, e.peak_rss_kib());
                error!("Stage {} failed: {}", stage.id, e);
                ExecutionResult::Failed {
                    error: e.to_string(),
                    status: e.status(),
                    output: e.output(),
                    measurement,
                }
            }
        }
    }
}
