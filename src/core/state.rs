//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Overall job execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    /// Job has not started
    Pending,
    /// Job is currently running
    Running,
    /// Every stage, staging and digest step succeeded
    Completed,
    /// Job failed
    Failed,
}

/// Elapsed time and peak resident memory of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageMeasurement {
    /// Wall-clock time in milliseconds
    pub elapsed_ms: u64,

    /// Peak resident set size of the stage's command, in KiB (unix only)
    pub peak_rss_kib: Option<u64>,
}

impl StageMeasurement {
    pub fn new(elapsed: Duration, peak_rss_kib: Option<u64>) -> Self {
        Self {
            elapsed_ms: elapsed.as_millis() as u64,
            peak_rss_kib,
        }
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }
}

/// State of a single stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageState {
    /// Stage has not run yet
    Pending,
    /// Stage is currently running
    Running {
        started_at: DateTime<Utc>,
    },
    /// Stage completed successfully
    Completed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        measurement: StageMeasurement,
    },
    /// Stage failed
    Failed {
        error: String,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
        measurement: StageMeasurement,
    },
    /// Stage never ran because an earlier stage failed
    Skipped {
        reason: String,
    },
}

impl StageState {
    /// Check if stage is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StageState::Completed { .. } | StageState::Failed { .. } | StageState::Skipped { .. }
        )
    }

    pub fn measurement(&self) -> Option<&StageMeasurement> {
        match self {
            StageState::Completed { measurement, .. } | StageState::Failed { measurement, .. } => {
                Some(measurement)
            }
            _ => None,
        }
    }
}

/// Overall job state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    /// Unique run ID
    pub run_id: Uuid,

    /// Current execution status
    pub status: ExecutionStatus,

    /// When execution started
    pub started_at: Option<DateTime<Utc>>,

    /// When execution completed/failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of stages
    pub total_stages: usize,

    /// Number of completed stages
    pub completed_stages: usize,

    /// Stage that failed the job, if any
    pub failed_stage: Option<String>,
}

impl JobState {
    /// Create a new job state
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            total_stages: 0,
            completed_stages: 0,
            failed_stage: None,
        }
    }

    /// Mark job as started
    pub fn start(&mut self, total_stages: usize) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_stages = total_stages;
    }

    /// Mark job as completed
    pub fn complete(&mut self) {
        self.status = ExecutionStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark job as failed. The first failing stage wins.
    pub fn fail(&mut self, stage: Option<&str>) {
        self.status = ExecutionStatus::Failed;
        self.completed_at = Some(Utc::now());
        if self.failed_stage.is_none() {
            self.failed_stage = stage.map(str::to_string);
        }
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::new()
    }
}
