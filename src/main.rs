use anyhow::{Context, Result};
use matrixci::cli::commands::{HistoryCommand, JobsCommand, ListCommand, RunCommand, ValidateCommand};
use matrixci::cli::output::*;
use matrixci::cli::{Cli, Command};
use matrixci::core::config::MatrixConfig;
use matrixci::core::env::apply_overrides;
use matrixci::core::RunStatus;
use matrixci::execution::{RunEngine, RunEvent, SchedulingStrategy, ShellRunner};
use matrixci::persistence::{
    create_summary, InMemoryStore, PersistenceBackend, RunSummary, SqliteRunStore,
};
use std::sync::Arc;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    // Execute command
    match &cli.command {
        Command::Run(cmd) => run_matrix(cmd, cli.clone()).await?,
        Command::Validate(cmd) => validate_matrix(cmd)?,
        Command::Jobs(cmd) => show_jobs(cmd)?,
        Command::List(cmd) => list_matrices(cmd).await?,
        Command::History(cmd) => show_history(cmd).await?,
    }

    Ok(())
}

async fn run_matrix(cmd: &RunCommand, cli: Cli) -> Result<()> {
    // Load matrix config
    let config = MatrixConfig::from_file(&cmd.file).context("Failed to load matrix config")?;

    println!("{} Loaded matrix: {}", INFO, style(&config.name).bold());

    // Expand into jobs
    let mut matrix = config.to_matrix();

    if !cmd.job.is_empty() {
        matrix.select_jobs(&cmd.job)?;
        println!(
            "{} Restricted to {} job(s)",
            INFO,
            style(matrix.jobs.len()).cyan()
        );
    }

    // Apply environment overrides to every job
    for (key, value) in &cmd.env {
        println!(
            "{} Env override: {} = {}",
            INFO,
            style(key).cyan(),
            style(value).dim()
        );
    }
    for job in &mut matrix.jobs {
        apply_overrides(&mut job.env, &cmd.env);
    }

    // Set up persistence
    let store: Arc<dyn PersistenceBackend> = if cmd.no_history {
        Arc::new(InMemoryStore::new())
    } else {
        Arc::new(SqliteRunStore::with_default_path().await?)
    };

    let runner = ShellRunner::new(matrix.shell.clone());
    let strategy: SchedulingStrategy = cmd.strategy.into();
    let engine = RunEngine::new(runner, strategy);

    // Set up event handling for console output
    if cli.stream {
        engine.add_event_handler(move |event| {
            println!("{}", format_run_event(&event));

            if let RunEvent::StepOutput { output, .. } = &event {
                println!("{}", format_output(output, 10));
            }
        });
    } else {
        // Progress bar over jobs; only job-level events are printed
        let bar = create_progress_bar(matrix.jobs.len());
        engine.add_event_handler(move |event| match &event {
            RunEvent::JobStarted { job } => bar.set_message(job.clone()),
            RunEvent::JobPassed { .. } | RunEvent::JobFailed { .. } => {
                bar.println(format_run_event(&event));
                bar.inc(1);
            }
            RunEvent::StepFailed { .. } => bar.println(format_run_event(&event)),
            RunEvent::RunCompleted { .. } => bar.finish_and_clear(),
            _ => {}
        });
    }

    // Execute the matrix
    println!();
    let result = engine.execute(&mut matrix).await;

    // Save to history
    if !cmd.no_history {
        let summary = create_summary(&matrix);
        store.save_run(&summary).await?;
        println!(
            "\n{} Run saved to history (ID: {})",
            INFO,
            style(&summary.run_id.to_string()[..8]).dim()
        );
    }

    // Print per-job results
    println!();
    print_separator();
    for job in &matrix.jobs {
        println!(
            "  {} ({}) - {}",
            style(&job.name).bold(),
            style(&job.tag).dim(),
            format_job_state(&job.state)
        );
    }
    print_separator();

    // Print final status
    match result {
        Ok(()) if !matrix.has_failed() => {
            println!(
                "\n{} {} {}",
                CHECK,
                style(&matrix.name).bold(),
                style("passed").green()
            );
            Ok(())
        }
        Ok(()) => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(&matrix.name).bold(),
                style("failed").red()
            );
            std::process::exit(1);
        }
        Err(e) => {
            println!(
                "\n{} {} {}",
                CROSS,
                style(&matrix.name).bold(),
                style("failed").red()
            );
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

fn validate_matrix(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating matrix...", INFO);

    let result = MatrixConfig::from_file(&cmd.file);

    match result {
        Ok(config) => {
            println!("{} Matrix configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Jobs: {}", style(config.matrix.len()).cyan());
            println!(
                "  Steps: {} install, {} script",
                style(config.install.len()).cyan(),
                style(config.script.len()).cyan()
            );

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(e).red());
            std::process::exit(1);
        }
    }
}

fn show_jobs(cmd: &JobsCommand) -> Result<()> {
    let config = MatrixConfig::from_file(&cmd.file).context("Failed to load matrix config")?;
    let matrix = config.to_matrix();

    if cmd.json {
        let jobs: Vec<_> = matrix
            .jobs
            .iter()
            .map(|job| {
                serde_json::json!({
                    "name": job.name,
                    "tag": job.tag,
                    "allow_failure": job.allow_failure,
                    "env": job.env,
                    "steps": job.steps.iter().map(|step| {
                        serde_json::json!({
                            "name": step.name,
                            "phase": step.phase.as_str(),
                            "command": step.command,
                            "runs": step.should_run(&job.env),
                        })
                    }).collect::<Vec<_>>(),
                })
            })
            .collect();
        let data = serde_json::json!({ "matrix": matrix.name, "jobs": jobs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    println!(
        "{} Matrix {} expands to {} job(s):",
        INFO,
        style(&matrix.name).bold(),
        style(matrix.jobs.len()).cyan()
    );

    for job in &matrix.jobs {
        println!(
            "\n  {} (tag {}){}",
            style(&job.name).bold(),
            style(&job.tag).cyan(),
            if job.allow_failure {
                style(" [failure allowed]").dim().to_string()
            } else {
                String::new()
            }
        );
        let env_line = job
            .env
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ");
        println!("    {}", style(env_line).dim());
        for step in &job.steps {
            let marker = if step.should_run(&job.env) {
                style("+").green().to_string()
            } else {
                style("-").dim().to_string()
            };
            println!(
                "    {} {} {}",
                marker,
                style(format!("{:7}", step.phase.as_str())).dim(),
                step.command
            );
        }
    }

    Ok(())
}

async fn list_matrices(cmd: &ListCommand) -> Result<()> {
    let store = SqliteRunStore::with_default_path().await?;
    let matrices = store.list_matrices().await?;

    if matrices.is_empty() {
        println!("{} No matrices found in history", INFO);
        return Ok(());
    }

    println!("{} Matrices in history:", INFO);

    for matrix_name in &matrices {
        let runs = store.list_runs(matrix_name).await?;

        if cmd.with_counts {
            let passed = runs.iter().filter(|r| r.status == RunStatus::Passed).count();
            let failed = runs.iter().filter(|r| r.status == RunStatus::Failed).count();
            println!(
                "  {} ({} runs: {} passed, {} failed)",
                style(matrix_name).bold(),
                style(runs.len()).cyan(),
                style(passed).green(),
                style(failed).red()
            );
        } else {
            println!("  {}", style(matrix_name).bold());
        }
    }

    if cmd.json {
        let mut json_data = Vec::new();
        for matrix_name in &matrices {
            let runs = store.list_runs(matrix_name).await.ok();
            json_data.push(serde_json::json!({
                "name": matrix_name,
                "run_count": runs.as_ref().map(|r| r.len()).unwrap_or(0)
            }));
        }
        let data = serde_json::json!({ "matrices": json_data });
        println!("\n{}", serde_json::to_string_pretty(&data)?);
    }

    Ok(())
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = SqliteRunStore::with_default_path().await?;

    // If a specific run ID is requested
    if let Some(run_id_str) = &cmd.run_id {
        let run_id = uuid::Uuid::parse_str(run_id_str).context("Invalid run ID format")?;
        let summary = store.load_run(run_id).await?;

        match summary {
            Some(summary) => {
                print_run_details(&summary, cmd.verbose)?;
            }
            None => {
                println!("{} Run not found", WARN);
            }
        }
        return Ok(());
    }

    // List runs for one matrix or all
    let runs = if let Some(matrix_name) = &cmd.matrix {
        store.list_runs(matrix_name).await?
    } else {
        let matrices = store.list_matrices().await?;
        let mut all_runs = Vec::new();
        for matrix_name in &matrices {
            all_runs.extend(store.list_runs(matrix_name).await?);
        }
        all_runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all_runs
    };
    let runs: Vec<_> = runs.into_iter().take(cmd.limit).collect();

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    println!("{} Run history (showing latest {}):", INFO, cmd.limit);

    if cmd.json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
    } else {
        for summary in &runs {
            println!("  {}", format_run_summary(summary));
        }
    }

    Ok(())
}

fn print_run_details(summary: &RunSummary, verbose: bool) -> Result<()> {
    println!("{} Run Details", INFO);
    println!("  ID: {}", style(summary.run_id).cyan());
    println!("  Matrix: {}", style(&summary.matrix_name).bold());
    println!("  Status: {}", format_status(summary.status));
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
        if let Ok(duration) = completed.signed_duration_since(summary.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }
    println!(
        "  Jobs: {} ({} passed, {} failed of {})",
        style(format!("{:.0}%", summary.progress * 100.0)).cyan(),
        summary.passed_jobs,
        summary.failed_jobs,
        summary.total_jobs
    );

    if verbose {
        println!("\n  {}", style("Full details:").bold());
        let json = serde_json::to_string_pretty(summary)?;
        for line in json.lines() {
            println!("    {}", line);
        }
    }

    Ok(())
}

fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
