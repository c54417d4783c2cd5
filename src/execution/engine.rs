//! Main execution engine - orchestrates the entire job run

use crate::{
    core::{ExecutionStatus, Job, JobError, OutputProfile, StageMeasurement, StageState},
    execution::{ArtifactStager, DigestGenerator, ExecutionResult, StageExecutor},
    toolchain::{OutputCallback, OutputStream, Toolchain},
};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Events that can occur during job execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    JobStarted {
        run_id: Uuid,
        job_name: String,
        target: String,
        channel: String,
    },
    /// Start boundary of a stage; rendered as a banner
    StageStarted {
        stage_id: String,
        label: String,
        group: String,
        index: usize,
        total: usize,
    },
    /// Command line about to run
    Invocation {
        stage_id: String,
        command: String,
    },
    StageOutput {
        stage_id: String,
        stream: OutputStream,
        line: String,
    },
    StageCompleted {
        stage_id: String,
        label: String,
        measurement: StageMeasurement,
    },
    StageFailed {
        stage_id: String,
        label: String,
        error: String,
        output: String,
        measurement: StageMeasurement,
    },
    StageSkipped {
        stage_id: String,
        reason: String,
    },
    ArtifactStaged {
        profile: OutputProfile,
        path: PathBuf,
        collectible: bool,
    },
    DigestWritten {
        profile: OutputProfile,
        path: PathBuf,
        hex: String,
    },
    JobCompleted {
        run_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

type HandlerList = Arc<RwLock<Vec<EventHandler>>>;

/// Main job execution engine
///
/// Stages run strictly one after another. Staging and digests happen only
/// once every stage has succeeded.
pub struct ExecutionEngine<T> {
    executor: Arc<StageExecutor<T>>,
    event_handlers: HandlerList,
}

impl<T: Toolchain + 'static> ExecutionEngine<T> {
    pub fn new(toolchain: T) -> Self {
        Self {
            executor: Arc::new(StageExecutor::new(toolchain)),
            event_handlers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        let mut handlers = self
            .event_handlers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        handlers.push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        emit(&self.event_handlers, event);
    }

    /// Execute the entire job
    ///
    /// Returns the first error encountered. On error nothing is staged.
    pub async fn execute(&self, job: &mut Job) -> Result<(), JobError> {
        let run_id = job.state.run_id;

        info!("Starting job: {} ({}) for {}", job.name, run_id, job.target);
        self.emit_event(ExecutionEvent::JobStarted {
            run_id,
            job_name: job.name.clone(),
            target: job.target.clone(),
            channel: job.channel.clone(),
        });

        job.state.start(job.stages.len());

        if let Err(err) = self.run_stages(job).await {
            return Err(self.finish_failed(job, err));
        }

        if let Err(err) = self.stage_outputs(job) {
            return Err(self.finish_failed(job, err));
        }

        job.state.complete();
        info!("Job finished: {} - {:?}", job.name, job.state.status);
        self.emit_event(ExecutionEvent::JobCompleted {
            run_id,
            status: ExecutionStatus::Completed,
        });

        Ok(())
    }

    /// Run every stage in order, returning the first failure
    async fn run_stages(&self, job: &mut Job) -> Result<(), JobError> {
        let total = job.stages.len();
        let mut first_error: Option<JobError> = None;

        for index in 0..total {
            let stage = job.stages[index].clone();

            if let Some(failed) = &first_error {
                if job.policy.abort_on_failure {
                    let reason = format!("aborted after {}", failed);
                    job.stages[index].state = StageState::Skipped {
                        reason: reason.clone(),
                    };
                    self.emit_event(ExecutionEvent::StageSkipped {
                        stage_id: stage.id.clone(),
                        reason,
                    });
                    continue;
                }
            }

            self.emit_event(ExecutionEvent::StageStarted {
                stage_id: stage.id.clone(),
                label: stage.label.clone(),
                group: stage.action.group().to_string(),
                index: index + 1,
                total,
            });

            if job.policy.log_each_invocation {
                let command = self.executor.describe(stage.action);
                info!("+ {}", command);
                self.emit_event(ExecutionEvent::Invocation {
                    stage_id: stage.id.clone(),
                    command,
                });
            }

            let started_at = chrono::Utc::now();
            job.stages[index].state = StageState::Running { started_at };

            let forwarder = EventForwarder {
                stage_id: &stage.id,
                handlers: &self.event_handlers,
            };
            let result = self.executor.execute(&stage, &forwarder).await;

            match result {
                ExecutionResult::Success { measurement, .. } => {
                    job.stages[index].state = StageState::Completed {
                        started_at,
                        completed_at: chrono::Utc::now(),
                        measurement,
                    };
                    job.state.completed_stages += 1;
                    self.emit_event(ExecutionEvent::StageCompleted {
                        stage_id: stage.id.clone(),
                        label: stage.label.clone(),
                        measurement,
                    });
                }
                ExecutionResult::Failed {
                    error,
                    status,
                    output,
                    measurement,
                } => {
                    job.stages[index].state = StageState::Failed {
                        error: error.clone(),
                        started_at,
                        failed_at: chrono::Utc::now(),
                        measurement,
                    };
                    job.state.fail(Some(&stage.id));
                    self.emit_event(ExecutionEvent::StageFailed {
                        stage_id: stage.id.clone(),
                        label: stage.label.clone(),
                        error,
                        output: output.clone(),
                        measurement,
                    });

                    if first_error.is_none() {
                        first_error = Some(JobError::Toolchain {
                            stage: stage.label.clone(),
                            status,
                            output,
                        });
                    } else {
                        warn!("Stage {} also failed; reporting the first failure only", stage.id);
                    }
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Copy binaries into the staging tree and write digests
    fn stage_outputs(&self, job: &mut Job) -> Result<(), JobError> {
        debug_assert!(job.all_stages_succeeded());

        let stager = ArtifactStager::new(job.layout.clone(), job.artifact_name.clone());
        let digests = DigestGenerator::new();
        stager.check_sources(&job.profiles)?;

        for profile in job.profiles.clone() {
            let artifact = stager.stage(profile)?;
            let collectible = job.is_collectible(&artifact.destination);
            if !collectible {
                warn!(
                    "{} is outside every output rule and will not be collected",
                    artifact.destination.display()
                );
            }
            self.emit_event(ExecutionEvent::ArtifactStaged {
                profile,
                path: artifact.destination.clone(),
                collectible,
            });

            if job.generate_digests {
                let digest = digests.digest(&artifact)?;
                self.emit_event(ExecutionEvent::DigestWritten {
                    profile,
                    path: digest.path.clone(),
                    hex: digest.hex.clone(),
                });
                job.digests.push(digest);
            }

            job.artifacts.push(artifact);
        }

        Ok(())
    }

    fn finish_failed(&self, job: &mut Job, err: JobError) -> JobError {
        error!("Job {} failed: {}", job.name, err);
        job.state.fail(None);
        self.emit_event(ExecutionEvent::JobCompleted {
            run_id: job.state.run_id,
            status: ExecutionStatus::Failed,
        });
        err
    }
}

fn emit(handlers: &RwLock<Vec<EventHandler>>, event: ExecutionEvent) {
    let handlers = handlers
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    for handler in handlers.iter() {
        handler(event.clone());
    }
}

/// Turns streamed command output into `StageOutput` events
struct EventForwarder<'a> {
    stage_id: &'a str,
    handlers: &'a RwLock<Vec<EventHandler>>,
}

impl OutputCallback for EventForwarder<'_> {
    fn on_line(&self, stream: OutputStream, line: &str) {
        emit(
            self.handlers,
            ExecutionEvent::StageOutput {
                stage_id: self.stage_id.to_string(),
                stream,
                line: line.to_string(),
            },
        );
    }
}
