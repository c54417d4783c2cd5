//! SQLite-based run history store

use crate::core::ExecutionStatus;
use crate::persistence::{PersistenceBackend, RunSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqliteRow};
use sqlx::Row;
use std::path::Path;
use uuid::Uuid;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS runs (
    id TEXT PRIMARY KEY,
    job_name TEXT NOT NULL,
    target TEXT NOT NULL,
    status TEXT NOT NULL,
    started_at TEXT NOT NULL,
    completed_at TEXT,
    completed_stages INTEGER NOT NULL DEFAULT 0,
    total_stages INTEGER NOT NULL DEFAULT 0,
    failed_stage TEXT,
    stages TEXT NOT NULL DEFAULT '[]',
    outputs TEXT NOT NULL DEFAULT '[]',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_job_name ON runs(job_name);
CREATE INDEX IF NOT EXISTS idx_started_at ON runs(started_at);
"#;

const SELECT_COLUMNS: &str = "SELECT id, job_name, target, status, started_at, completed_at, \
     completed_stages, total_stages, failed_stage, stages, outputs FROM runs";

/// SQLite run store
pub struct SqliteRunStore {
    pool: SqlitePool,
}

impl SqliteRunStore {
    /// Open (creating if needed) a store at `db_path`
    pub async fn new(db_path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let db_dir = data_dir.join("buildjob");
        std::fs::create_dir_all(&db_dir)
            .with_context(|| format!("Failed to create {}", db_dir.display()))?;

        Self::new(&db_dir.join("runs.db")).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .context("Failed to initialize schema")?;
        Ok(())
    }

    fn parse_status(status: &str) -> ExecutionStatus {
        match status {
            "Running" => ExecutionStatus::Running,
            "Completed" => ExecutionStatus::Completed,
            "Failed" => ExecutionStatus::Failed,
            _ => ExecutionStatus::Pending,
        }
    }

    fn from_row(row: &SqliteRow) -> Result<RunSummary> {
        Ok(RunSummary {
            run_id: Uuid::parse_str(&row.get::<String, _>("id"))?,
            job_name: row.get("job_name"),
            target: row.get("target"),
            status: Self::parse_status(&row.get::<String, _>("status")),
            started_at: row.get::<DateTime<Utc>, _>("started_at"),
            completed_at: row.get::<Option<DateTime<Utc>>, _>("completed_at"),
            completed_stages: row.get::<i64, _>("completed_stages") as usize,
            total_stages: row.get::<i64, _>("total_stages") as usize,
            failed_stage: row.get("failed_stage"),
            stages: serde_json::from_str(&row.get::<String, _>("stages"))
                .context("Corrupt stage records")?,
            outputs: serde_json::from_str(&row.get::<String, _>("outputs"))
                .context("Corrupt output list")?,
        })
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for SqliteRunStore {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO runs
            (id, job_name, target, status, started_at, completed_at,
             completed_stages, total_stages, failed_stage, stages, outputs)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(run.run_id.to_string())
        .bind(&run.job_name)
        .bind(&run.target)
        .bind(format!("{:?}", run.status))
        .bind(run.started_at)
        .bind(run.completed_at)
        .bind(run.completed_stages as i64)
        .bind(run.total_stages as i64)
        .bind(&run.failed_stage)
        .bind(serde_json::to_string(&run.stages)?)
        .bind(serde_json::to_string(&run.outputs)?)
        .execute(&self.pool)
        .await
        .context("Failed to save run")?;

        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .bind(run_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load run")?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn list_runs(&self, job_name: &str) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(&format!(
            "{} WHERE job_name = ?1 ORDER BY started_at DESC",
            SELECT_COLUMNS
        ))
        .bind(job_name)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list runs")?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn list_jobs(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT job_name FROM runs ORDER BY job_name ASC")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list jobs")?;

        Ok(rows.iter().map(|row| row.get("job_name")).collect())
    }
}
