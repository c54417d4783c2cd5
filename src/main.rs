use anyhow::{Context, Result};
use buildjob::cli::commands::{
    HistoryCommand, PlanCommand, PublishCommand, RunCommand, ValidateCommand, VerifyCommand,
};
use buildjob::cli::output::*;
use buildjob::cli::{Cli, Command};
use buildjob::core::config::JobConfig;
use buildjob::execution::{verify_digest, ExecutionEngine, ExecutionEvent};
use buildjob::persistence::{
    create_summary, InMemoryPersistence, PersistenceBackend, RunSummary,
};
use buildjob::{CargoToolchain, ExecutionStatus, JobError, Toolchain};
use indicatif::ProgressBar;
use std::sync::{Arc, Mutex};
use tracing::{error, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    let code = match &cli.command {
        Command::Run(cmd) => run_job(cmd, cli.quiet).await?,
        Command::Validate(cmd) => validate_job(cmd)?,
        Command::Plan(cmd) => plan_job(cmd)?,
        Command::Publish(cmd) => show_publish(cmd)?,
        Command::Verify(cmd) => verify_digests(cmd),
        Command::History(cmd) => show_history(cmd).await?,
    };

    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}

fn load_config(file: &str) -> Result<JobConfig> {
    JobConfig::from_file(file).with_context(|| format!("Failed to load job config {}", file))
}

async fn open_store(no_history: bool) -> Arc<dyn PersistenceBackend> {
    if no_history {
        return Arc::new(InMemoryPersistence::new());
    }

    #[cfg(feature = "sqlite")]
    {
        match buildjob::persistence::SqliteRunStore::with_default_path().await {
            Ok(store) => return Arc::new(store),
            Err(e) => warn!("Run history unavailable, keeping this run in memory: {:#}", e),
        }
    }

    Arc::new(InMemoryPersistence::new())
}

async fn run_job(cmd: &RunCommand, quiet: bool) -> Result<i32> {
    let mut config = load_config(&cmd.file)?;
    if let Some(root) = &cmd.output_root {
        config = config.with_output_root(root);
    }
    if let Some(dir) = &cmd.work_dir {
        config = config.with_working_dir(dir);
    }
    let mut job = config
        .to_job()
        .context("Job is invalid with the given overrides")?;
    if cmd.keep_going {
        job.policy.abort_on_failure = false;
    }

    println!(
        "{} Loaded job: {} ({} stages)",
        INFO,
        style(&job.name).bold(),
        style(job.stages.len()).cyan()
    );

    let store = open_store(cmd.no_history).await;

    let engine = ExecutionEngine::new(CargoToolchain::new(job.toolchain.clone()));

    // Set up event handler for console output
    let width = terminal_width();
    let use_spinner = quiet && console::Term::stdout().is_term();
    let spinner: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));
    engine.add_event_handler(move |event| {
        let mut active = spinner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        match &event {
            ExecutionEvent::StageOutput { .. } if quiet => return,
            ExecutionEvent::StageStarted { label, .. } => {
                println!("{}", format_execution_event(&event, width));
                if use_spinner {
                    *active = Some(create_spinner(label.clone()));
                }
                return;
            }
            ExecutionEvent::StageCompleted { .. } | ExecutionEvent::StageFailed { .. } => {
                if let Some(bar) = active.take() {
                    bar.finish_and_clear();
                }
            }
            _ => {}
        }

        match active.as_ref() {
            Some(bar) => bar.println(format_execution_event(&event, width)),
            None => println!("{}", format_execution_event(&event, width)),
        }
    });

    let result = engine.execute(&mut job).await;

    let summary = create_summary(&job);
    if let Err(e) = store.save_run(&summary).await {
        warn!("Failed to save run history: {:#}", e);
    } else if !cmd.no_history {
        println!(
            "{} Run saved to history (ID: {})",
            INFO,
            style(&summary.run_id.to_string()[..8]).dim()
        );
    }

    match result {
        Ok(()) => {
            println!(
                "\n{} {} completed {}",
                CHECK,
                style(&job.name).bold(),
                style("successfully").green()
            );
            Ok(0)
        }
        Err(err) => {
            if let JobError::Toolchain { stage, output, .. } = &err {
                eprint!("{}", format_failure_report(stage, output, width));
            }
            println!(
                "\n{} {} {}",
                CROSS,
                style(&job.name).bold(),
                style("failed").red()
            );
            error!("{}", err);
            Ok(err.exit_code())
        }
    }
}

fn validate_job(cmd: &ValidateCommand) -> Result<i32> {
    println!("{} Validating job...", INFO);

    match JobConfig::from_file(&cmd.file) {
        Ok(config) => {
            println!("{} Job configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Artifact: {}", style(&config.artifact).cyan());
            println!("  Profiles: {}", style(config.profiles.len()).cyan());
            println!("  Publish entries: {}", style(config.publish.len()).cyan());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(0)
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            Ok(1)
        }
    }
}

fn plan_job(cmd: &PlanCommand) -> Result<i32> {
    let config = load_config(&cmd.file)?;
    let job = config.to_job()?;
    let toolchain = CargoToolchain::new(job.toolchain.clone());

    println!(
        "{} {} for {} on {}",
        INFO,
        style(&job.name).bold(),
        style(&job.target).cyan(),
        style(&job.channel).cyan()
    );

    println!("\n{}", style("Stages:").bold());
    for (index, stage) in job.stages.iter().enumerate() {
        println!(
            "  {}. {} {}",
            index + 1,
            stage.label,
            style(format!("({})", toolchain.describe(stage.action))).dim()
        );
    }

    println!("\n{}", style("Outputs:").bold());
    for path in job.produced_paths() {
        let marker = if job.is_collectible(&path) {
            CHECK
        } else {
            WARN
        };
        println!("  {}{}", marker, path.display());
    }

    if !job.publish.is_empty() {
        println!("\n{}", style("Publish:").bold());
        for entry in &job.publish.entries {
            println!(
                "  {}/{} <- {}",
                style(&entry.series).cyan(),
                entry.name,
                style(&entry.from_output).dim()
            );
        }
    }

    Ok(0)
}

fn show_publish(cmd: &PublishCommand) -> Result<i32> {
    let config = load_config(&cmd.file)?;
    let job = config.to_job()?;
    let by_series = job.publish.by_series();

    if cmd.json {
        let data = serde_json::json!({ "job": job.name, "series": by_series });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(0);
    }

    if by_series.is_empty() {
        println!("{} {} publishes nothing", INFO, style(&job.name).bold());
        return Ok(0);
    }

    for (series, entries) in &by_series {
        println!("{} {}", PACKAGE, style(series).bold());
        for entry in entries {
            println!("  {} <- {}", entry.name, style(&entry.from_output).dim());
        }
    }

    Ok(0)
}

fn verify_digests(cmd: &VerifyCommand) -> i32 {
    let mut failures = 0;

    for file in &cmd.files {
        match verify_digest(file) {
            Ok(verification) => {
                if !verification.is_match() {
                    failures += 1;
                }
                println!("{}", format_verification(&verification));
            }
            Err(e) => {
                failures += 1;
                println!("{} {}: {}", CROSS, file.display(), style(e).red());
            }
        }
    }

    if failures > 0 {
        1
    } else {
        0
    }
}

async fn show_history(cmd: &HistoryCommand) -> Result<i32> {
    #[cfg(feature = "sqlite")]
    let store = buildjob::persistence::SqliteRunStore::with_default_path().await?;
    #[cfg(not(feature = "sqlite"))]
    let store = InMemoryPersistence::new();

    let runs: Vec<RunSummary> = match &cmd.job {
        Some(job_name) => store.list_runs(job_name).await?,
        None => {
            let mut all_runs = Vec::new();
            for job_name in store.list_jobs().await? {
                all_runs.extend(store.list_runs(&job_name).await?);
            }
            all_runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
            all_runs
        }
    }
    .into_iter()
    .take(cmd.limit)
    .collect();

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(0);
    }

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(0);
    }

    println!("{} Run history (showing latest {}):", INFO, cmd.limit);
    for summary in &runs {
        println!("  {}", format_run_summary(summary));
        if summary.status == ExecutionStatus::Failed {
            for stage in summary.stages.iter().filter(|s| s.outcome == "failed") {
                println!("      {} {}", CROSS, style(&stage.label).red());
            }
        }
    }

    Ok(0)
}
