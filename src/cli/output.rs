//! CLI output formatting

use crate::{
    core::{JobState, RunStatus, StepState},
    execution::RunEvent,
    persistence::RunSummary,
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
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Create a progress bar over the matrix's jobs
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let progress = ProgressBar::new(total as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.enable_steady_tick(Duration::from_millis(100));
    progress
}

/// Print a separator line spanning the terminal width
pub fn print_separator() {
    let width = term_size::dimensions_stdout().map(|(w, _)| w).unwrap_or(80);
    println!("{}", "─".repeat(width));
}

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { attempt, .. } => {
            style(format!("RUNNING (attempt {})", attempt)).yellow().to_string()
        }
        StepState::Completed { .. } => style("PASSED").green().to_string(),
        StepState::Failed { .. } => style("FAILED").red().to_string(),
        StepState::Skipped { .. } => style("SKIPPED").dim().to_string(),
    }
}

/// Format a job state for display
pub fn format_job_state(state: &JobState) -> String {
    match state {
        JobState::Pending => style("PENDING").dim().to_string(),
        JobState::Running { .. } => style("RUNNING").yellow().to_string(),
        JobState::Passed { .. } => style("PASSED").green().to_string(),
        JobState::Failed { .. } => style("FAILED").red().to_string(),
    }
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Pending => style("PENDING").dim().to_string(),
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Passed => style("PASSED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
        RunStatus::Cancelled => style("CANCELLED").yellow().to_string(),
    }
}

/// Format a run summary for display
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        RunStatus::Passed => CHECK,
        RunStatus::Failed => CROSS,
        RunStatus::Running => SPINNER,
        _ => INFO,
    };

    format!(
        "{} {} - {} - {} ({}/{}) - {}",
        status_icon,
        style(&summary.run_id.to_string()[..8]).dim(),
        style(&summary.matrix_name).bold(),
        format_status(summary.status),
        summary.passed_jobs,
        summary.total_jobs,
        style(format!("{:.0}%", summary.progress * 100.0)).cyan()
    )
}

/// Format a run event for display
pub fn format_run_event(event: &RunEvent) -> String {
    match event {
        RunEvent::RunStarted {
            run_id,
            matrix_name,
        } => format!(
            "{} Starting matrix {} ({})",
            ROCKET,
            style(matrix_name).bold(),
            style(&run_id.to_string()[..8]).dim()
        ),
        RunEvent::JobStarted { job } => {
            format!("{} {}", SPINNER, style(job).cyan())
        }
        RunEvent::StepStarted { job, step, attempt } => {
            if *attempt > 1 {
                format!(
                    "{} {}/{} (attempt {})",
                    SPINNER,
                    style(job).dim(),
                    style(step).cyan(),
                    style(attempt).dim()
                )
            } else {
                format!("{} {}/{}", SPINNER, style(job).dim(), style(step).cyan())
            }
        }
        RunEvent::StepOutput { job, step, output } => {
            format!(
                "{} Output from {}/{}:\n{}",
                INFO,
                style(job).dim(),
                style(step).dim(),
                output
            )
        }
        RunEvent::StepSkipped { job, step, reason } => {
            format!(
                "{} {}/{} ({})",
                SKIP,
                style(job).dim(),
                style(step).dim(),
                style(reason).dim()
            )
        }
        RunEvent::StepRetrying {
            job,
            step,
            attempt,
            retries,
        } => format!(
            "{} {}/{} (attempt {}/{})",
            WARN,
            style(job).dim(),
            style(step).yellow(),
            attempt,
            retries + 1
        ),
        RunEvent::StepCompleted {
            job,
            step,
            duration_ms,
            ..
        } => format!(
            "{} {}/{} ({})",
            CHECK,
            style(job).dim(),
            style(step).green(),
            style(format_millis(*duration_ms)).dim()
        ),
        RunEvent::StepFailed { job, step, error } => {
            format!(
                "{} {}/{}: {}",
                CROSS,
                style(job).dim(),
                style(step).red(),
                style(error).dim()
            )
        }
        RunEvent::JobPassed { job } => format!("{} {}", CHECK, style(job).green()),
        RunEvent::JobFailed {
            job,
            error,
            allowed,
        } => {
            if *allowed {
                format!(
                    "{} {} ({}, failure allowed)",
                    WARN,
                    style(job).yellow(),
                    style(error).dim()
                )
            } else {
                format!("{} {}: {}", CROSS, style(job).red(), style(error).dim())
            }
        }
        RunEvent::RunCompleted { run_id, status } => {
            let status_str = match status {
                RunStatus::Passed => style("passed").green().to_string(),
                RunStatus::Failed => style("failed").red().to_string(),
                _ => format!("{:?}", status),
            };
            format!(
                "{} Matrix run ({}) {}",
                INFO,
                style(&run_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}

fn format_millis(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}
