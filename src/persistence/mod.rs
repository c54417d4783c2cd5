//! Persistence layer for job run history

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteRunStore;

pub use crate::core::ExecutionStatus;
use crate::core::{Job, StageState};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to one stage in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRecord {
    pub id: String,
    pub label: String,
    /// "completed", "failed", "skipped" or "pending"
    pub outcome: String,
    pub elapsed_ms: Option<u64>,
    pub peak_rss_kib: Option<u64>,
}

/// Summary of a job run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run ID
    pub run_id: Uuid,

    /// Job name
    pub job_name: String,

    /// Target platform
    pub target: String,

    /// Final status
    pub status: ExecutionStatus,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (if it did)
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of completed stages
    pub completed_stages: usize,

    /// Total number of stages
    pub total_stages: usize,

    /// First stage that failed
    pub failed_stage: Option<String>,

    /// Per-stage outcome and timings
    pub stages: Vec<StageRecord>,

    /// Staged artifact and digest paths
    pub outputs: Vec<String>,
}

/// Trait for persistence backends
#[async_trait::async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Save a run
    async fn save_run(&self, run: &RunSummary) -> Result<()>;

    /// Load a run by ID
    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>>;

    /// List runs of a job, newest first
    async fn list_runs(&self, job_name: &str) -> Result<Vec<RunSummary>>;

    /// List all job names
    async fn list_jobs(&self) -> Result<Vec<String>>;
}

/// In-memory persistence (for testing or `--no-history`)
pub struct InMemoryPersistence {
    runs: tokio::sync::RwLock<std::collections::HashMap<Uuid, RunSummary>>,
    by_job: tokio::sync::RwLock<std::collections::HashMap<String, Vec<Uuid>>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self {
            runs: tokio::sync::RwLock::new(std::collections::HashMap::new()),
            by_job: tokio::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }
}

impl Default for InMemoryPersistence {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for InMemoryPersistence {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        let mut runs = self.runs.write().await;
        let is_new = runs.insert(run.run_id, run.clone()).is_none();

        if is_new {
            let mut by_job = self.by_job.write().await;
            by_job
                .entry(run.job_name.clone())
                .or_insert_with(Vec::new)
                .push(run.run_id);
        }

        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let runs = self.runs.read().await;
        Ok(runs.get(&run_id).cloned())
    }

    async fn list_runs(&self, job_name: &str) -> Result<Vec<RunSummary>> {
        let runs = self.runs.read().await;
        let by_job = self.by_job.read().await;

        let mut result: Vec<RunSummary> = by_job
            .get(job_name)
            .map(|ids| ids.iter().filter_map(|id| runs.get(id).cloned()).collect())
            .unwrap_or_default();
        result.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(result)
    }

    async fn list_jobs(&self) -> Result<Vec<String>> {
        let by_job = self.by_job.read().await;
        let mut names: Vec<String> = by_job.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Create a summary from a job
pub fn create_summary(job: &Job) -> RunSummary {
    let stages = job
        .stages
        .iter()
        .map(|stage| {
            let outcome = match &stage.state {
                StageState::Completed { .. } => "completed",
                StageState::Failed { .. } => "failed",
                StageState::Skipped { .. } => "skipped",
                StageState::Pending | StageState::Running { .. } => "pending",
            };
            let measurement = stage.state.measurement();
            StageRecord {
                id: stage.id.clone(),
                label: stage.label.clone(),
                outcome: outcome.to_string(),
                elapsed_ms: measurement.map(|m| m.elapsed_ms),
                peak_rss_kib: measurement.and_then(|m| m.peak_rss_kib),
            }
        })
        .collect();

    let outputs = job
        .artifacts
        .iter()
        .map(|a| a.destination.to_string_lossy().into_owned())
        .chain(job.digests.iter().map(|d| d.path.to_string_lossy().into_owned()))
        .collect();

    RunSummary {
        run_id: job.state.run_id,
        job_name: job.name.clone(),
        target: job.target.clone(),
        status: job.state.status,
        started_at: job.state.started_at.unwrap_or_else(Utc::now),
        completed_at: job.state.completed_at,
        completed_stages: job.state.completed_stages,
        total_stages: job.state.total_stages,
        failed_stage: job.state.failed_stage.clone(),
        stages,
        outputs,
    }
}
