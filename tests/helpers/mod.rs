//! Test utilities for buildjob

#![allow(dead_code)]

use async_trait::async_trait;
use buildjob::core::config::JobConfig;
use buildjob::core::{ExecutionStatus, Job, JobError, OutputProfile, StageAction, StageState, Tool};
use buildjob::execution::{ExecutionEngine, ExecutionEvent};
use buildjob::toolchain::{OutputCallback, OutputStream, Toolchain, ToolchainError, ToolchainOutput};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const ARTIFACT: &str = "p9kp";

/// Toolchain double: scripts a failure per stage id and writes a fake
/// binary into the target directory for every successful build.
#[derive(Clone)]
pub struct MockToolchain {
    target_dir: PathBuf,
    failures: Arc<HashMap<String, (Option<i32>, String)>>,
    skip_binary: Arc<Vec<OutputProfile>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockToolchain {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            failures: Arc::new(HashMap::new()),
            skip_binary: Arc::new(Vec::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make the stage with `stage_id` exit with `status` after printing `output`
    pub fn failing(mut self, stage_id: &str, status: Option<i32>, output: &str) -> Self {
        Arc::make_mut(&mut self.failures)
            .insert(stage_id.to_string(), (status, output.to_string()));
        self
    }

    /// Report success for this build without leaving a binary behind
    pub fn without_binary(mut self, profile: OutputProfile) -> Self {
        Arc::make_mut(&mut self.skip_binary).push(profile);
        self
    }

    /// Stage ids invoked so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn invoke(
        &self,
        action: StageAction,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError> {
        let id = action.id();
        self.calls.lock().unwrap().push(id.clone());

        if let Some((status, output)) = self.failures.get(&id) {
            for line in output.lines() {
                callback.on_line(OutputStream::Stderr, line);
            }
            return Err(ToolchainError::Failed {
                status: *status,
                output: output.clone(),
                peak_rss_kib: None,
            });
        }

        let line = format!("{} ok", id);
        callback.on_line(OutputStream::Stdout, &line);
        Ok(ToolchainOutput::new(format!("{}\n", line)))
    }
}

#[async_trait]
impl Toolchain for MockToolchain {
    async fn report_version(
        &self,
        tool: Tool,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError> {
        self.invoke(StageAction::ReportVersion(tool), callback)
    }

    async fn build(
        &self,
        profile: OutputProfile,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError> {
        let output = self.invoke(StageAction::Build(profile), callback)?;
        if !self.skip_binary.contains(&profile) {
            let dir = profile.source_dir(&self.target_dir);
            std::fs::create_dir_all(&dir)?;
            std::fs::write(dir.join(ARTIFACT), binary_contents(profile))?;
        }
        Ok(output)
    }

    async fn format_check(
        &self,
        callback: &dyn OutputCallback,
    ) -> Result<ToolchainOutput, ToolchainError> {
        self.invoke(StageAction::FormatCheck, callback)
    }

    async fn lint(&self, callback: &dyn OutputCallback) -> Result<ToolchainOutput, ToolchainError> {
        self.invoke(StageAction::Lint, callback)
    }

    fn describe(&self, action: StageAction) -> String {
        format!("mock {}", action.id())
    }
}

/// What the mock writes as the built binary for `profile`
pub fn binary_contents(profile: OutputProfile) -> String {
    format!("#!fake {} build of {}\n", profile, ARTIFACT)
}

/// Isolated working directory, target directory and staging root
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Staging root (plays the part of `/work`)
    pub fn work(&self) -> PathBuf {
        self.root().join("work")
    }

    pub fn target(&self) -> PathBuf {
        self.root().join("target")
    }

    pub fn staged(&self, profile: &str) -> PathBuf {
        self.work().join(profile).join(ARTIFACT)
    }

    pub fn digest(&self, profile: &str) -> PathBuf {
        self.work().join(profile).join(format!("{}.sha256", ARTIFACT))
    }

    /// Job YAML rooted in this workspace; `extra` is appended verbatim
    pub fn yaml(&self, extra: &str) -> String {
        format!(
            "name: {artifact}\ntarget: helios-2.0\nartifact: {artifact}\n\
             working_dir: {root}\noutput_root: {work}\n{extra}",
            artifact = ARTIFACT,
            root = self.root().display(),
            work = self.work().display(),
            extra = extra,
        )
    }

    pub fn config(&self, extra: &str) -> Result<JobConfig, JobError> {
        JobConfig::from_yaml(&self.yaml(extra))
    }

    pub fn job(&self, extra: &str) -> Job {
        self.config(extra).unwrap().to_job().unwrap()
    }

    pub fn toolchain(&self) -> MockToolchain {
        MockToolchain::new(self.target())
    }
}

/// Result of running a job through the engine
pub struct JobTestResult {
    pub job: Job,
    pub result: Result<(), JobError>,
    pub events: Vec<ExecutionEvent>,
}

impl JobTestResult {
    pub fn is_success(&self) -> bool {
        self.result.is_ok() && self.job.state.status == ExecutionStatus::Completed
    }

    pub fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(()) => 0,
            Err(err) => err.exit_code(),
        }
    }

    pub fn stage_state(&self, stage_id: &str) -> &StageState {
        &self
            .job
            .stage(stage_id)
            .unwrap_or_else(|| panic!("Stage '{}' not found", stage_id))
            .state
    }

    /// Banner labels in the order they were announced
    pub fn banners(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ExecutionEvent::StageStarted { label, .. } => Some(label.clone()),
                _ => None,
            })
            .collect()
    }

    /// Lines streamed by one stage
    pub fn stage_output(&self, stage_id: &str) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ExecutionEvent::StageOutput { stage_id: id, line, .. } if id == stage_id => {
                    Some(line.clone())
                }
                _ => None,
            })
            .collect()
    }
}

/// Run a job with the given toolchain, collecting every event
pub async fn run_job_with<T: Toolchain + 'static>(mut job: Job, toolchain: T) -> JobTestResult {
    let engine = ExecutionEngine::new(toolchain);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    engine.add_event_handler(move |event| sink.lock().unwrap().push(event));

    let result = engine.execute(&mut job).await;
    let events = events.lock().unwrap().clone();

    JobTestResult { job, result, events }
}

/// Assert a stage completed
pub fn assert_stage_completed(result: &JobTestResult, stage_id: &str) {
    let state = result.stage_state(stage_id);
    assert!(
        matches!(state, StageState::Completed { .. }),
        "Stage '{}' should be completed, but was in state: {:?}",
        stage_id,
        state
    );
}

/// Assert a stage failed
pub fn assert_stage_failed(result: &JobTestResult, stage_id: &str) {
    let state = result.stage_state(stage_id);
    assert!(
        matches!(state, StageState::Failed { .. }),
        "Stage '{}' should have failed, but was in state: {:?}",
        stage_id,
        state
    );
}

/// Assert a stage never ran
pub fn assert_stage_skipped(result: &JobTestResult, stage_id: &str) {
    let state = result.stage_state(stage_id);
    assert!(
        matches!(state, StageState::Skipped { .. }),
        "Stage '{}' should have been skipped, but was in state: {:?}",
        stage_id,
        state
    );
}

/// Assert nothing was staged or digested for any profile
pub fn assert_nothing_staged(ws: &Workspace, result: &JobTestResult) {
    assert!(result.job.artifacts.is_empty(), "artifacts: {:?}", result.job.artifacts);
    assert!(result.job.digests.is_empty(), "digests: {:?}", result.job.digests);
    for profile in ["debug", "release"] {
        assert!(!ws.staged(profile).exists(), "{} was staged", profile);
        assert!(!ws.digest(profile).exists(), "{} digest was written", profile);
    }
}
