//! CLI output formatting

use crate::{
    core::{ExecutionStatus, StageMeasurement},
    execution::{ExecutionEvent, Verification},
    persistence::RunSummary,
    toolchain::OutputStream,
};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static PACKAGE: Emoji<'_, '_> = Emoji("📦 ", "+ ");

const DEFAULT_WIDTH: usize = 80;

/// Terminal width, or 80 when stdout is not a terminal
pub fn terminal_width() -> usize {
    term_size::dimensions_stdout()
        .map(|(w, _)| w)
        .filter(|w| *w > 0)
        .unwrap_or(DEFAULT_WIDTH)
}

/// Render a stage banner: `==== [3/6] build (debug) ====...`
pub fn banner(label: &str, index: usize, total: usize, width: usize) -> String {
    rule(format!("==== [{}/{}] {} ", index, total, label), width)
}

fn rule(title: String, width: usize) -> String {
    let fill = width.saturating_sub(title.chars().count()).max(4);
    format!("{}{}", title, "=".repeat(fill))
}

/// Create a spinner shown while a stage runs with output suppressed
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    let secs = duration.as_secs();
    if secs < 1 {
        format!("{}ms", millis)
    } else if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Elapsed time plus peak memory, e.g. `12.3s, peak 512.0 MiB`
pub fn format_measurement(measurement: &StageMeasurement) -> String {
    let elapsed = format_duration(measurement.elapsed());
    match measurement.peak_rss_kib {
        Some(kib) if kib >= 1024 => format!("{}, peak {:.1} MiB", elapsed, kib as f64 / 1024.0),
        Some(kib) => format!("{}, peak {} KiB", elapsed, kib),
        None => elapsed,
    }
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent, width: usize) -> String {
    match event {
        ExecutionEvent::JobStarted {
            run_id,
            job_name,
            target,
            channel,
        } => format!(
            "{} Starting job {} for {} on {} ({})",
            ROCKET,
            style(job_name).bold(),
            style(target).cyan(),
            style(channel).cyan(),
            style(&run_id.to_string()[..8]).dim()
        ),
        ExecutionEvent::StageStarted {
            label,
            group,
            index,
            total,
            ..
        } => format!(
            "\n{} {}",
            style(banner(label, *index, *total, width.saturating_sub(group.len() + 3))).bold(),
            style(format!("[{}]", group)).dim()
        ),
        ExecutionEvent::Invocation { command, .. } => {
            format!("{}", style(format!("+ {}", command)).dim())
        }
        ExecutionEvent::StageOutput { stream, line, .. } => match stream {
            OutputStream::Stdout => line.clone(),
            OutputStream::Stderr => format!("{}", style(line).dim()),
        },
        ExecutionEvent::StageCompleted {
            label, measurement, ..
        } => format!(
            "{} {} ({})",
            CHECK,
            style(label).green(),
            style(format_measurement(measurement)).dim()
        ),
        ExecutionEvent::StageFailed {
            label,
            error,
            measurement,
            ..
        } => format!(
            "{} {}: {} ({})",
            CROSS,
            style(label).red(),
            style(error).dim(),
            style(format_measurement(measurement)).dim()
        ),
        ExecutionEvent::StageSkipped { stage_id, reason } => format!(
            "{} {} skipped: {}",
            WARN,
            style(stage_id).yellow(),
            style(reason).dim()
        ),
        ExecutionEvent::ArtifactStaged {
            profile,
            path,
            collectible,
        } => {
            let line = format!(
                "{} {} -> {}",
                PACKAGE,
                style(profile).cyan(),
                style(path.display()).bold()
            );
            if *collectible {
                line
            } else {
                format!("{} {}", line, style("(not covered by any output rule)").yellow())
            }
        }
        ExecutionEvent::DigestWritten { path, hex, .. } => format!(
            "{} {} {}",
            PACKAGE,
            style(path.display()).bold(),
            style(hex).dim()
        ),
        ExecutionEvent::JobCompleted { run_id, status } => {
            let status_str = match status {
                ExecutionStatus::Completed => {
                    format!("{} completed", style("successfully").green())
                }
                ExecutionStatus::Failed => style("failed").red().to_string(),
                other => format_status(*other),
            };
            format!(
                "\n{} Job ({}) {}",
                INFO,
                style(&run_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}

/// Failure report: the failing stage banner followed by its output verbatim
pub fn format_failure_report(label: &str, output: &str, width: usize) -> String {
    let title = format!("==== [FAILED] {} ", label);
    let mut report = format!("{}\n", style(rule(title, width)).red());
    report.push_str(output);
    if !output.is_empty() && !output.ends_with('\n') {
        report.push('\n');
    }
    report
}

/// Format run summary for display
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        ExecutionStatus::Completed => CHECK,
        ExecutionStatus::Failed => CROSS,
        ExecutionStatus::Running => SPINNER,
        ExecutionStatus::Pending => INFO,
    };

    let failed = summary
        .failed_stage
        .as_ref()
        .map(|stage| format!(" at {}", style(stage).red()))
        .unwrap_or_default();

    format!(
        "{} {} - {} - {} ({}/{}){} - {}",
        status_icon,
        style(&summary.run_id.to_string()[..8]).dim(),
        style(&summary.job_name).bold(),
        format_status(summary.status),
        summary.completed_stages,
        summary.total_stages,
        failed,
        style(summary.started_at.format("%Y-%m-%d %H:%M:%S")).dim()
    )
}

pub fn format_verification(verification: &Verification) -> String {
    match verification {
        Verification::Match { artifact, .. } => {
            format!("{} {}: {}", CHECK, artifact.display(), style("OK").green())
        }
        Verification::Mismatch {
            artifact,
            expected,
            actual,
        } => format!(
            "{} {}: {} (expected {}, got {})",
            CROSS,
            artifact.display(),
            style("FAILED").red(),
            style(expected).dim(),
            style(actual).dim()
        ),
    }
}
