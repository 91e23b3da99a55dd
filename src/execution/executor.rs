//! Job executor - runs a single job's steps in order

use crate::{
    core::{Job, JobState, StepState},
    execution::{
        engine::{EventSink, RunEvent},
        runner::{CommandRunner, RunnerError},
    },
};
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

/// Outcome of running one step attempt
enum AttemptOutcome {
    Success { exit_code: i32, output: String, duration_ms: u64 },
    Failure { error: String, exit_code: Option<i32>, output: String },
}

/// Executes a single job
pub struct JobExecutor<R> {
    runner: R,
}

impl<R: CommandRunner> JobExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    /// Execute every step of the job in declaration order.
    ///
    /// Steps whose condition is not met are skipped without spawning a
    /// process. After the first failed step, all remaining steps are skipped
    /// and the job is marked failed.
    pub async fn execute_job(&self, job: &mut Job, workdir: Option<&str>, events: &EventSink) {
        let started_at = chrono::Utc::now();
        job.state = JobState::Running { started_at };
        events.emit(RunEvent::JobStarted {
            job: job.name.clone(),
        });

        info!("Executing job: {} (tag {})", job.name, job.tag);

        let mut failed_step: Option<String> = None;

        for index in 0..job.steps.len() {
            if let Some(ref failed) = failed_step {
                let reason = format!("step {} failed", failed);
                job.steps[index].state = StepState::Skipped {
                    reason: reason.clone(),
                };
                events.emit(RunEvent::StepSkipped {
                    job: job.name.clone(),
                    step: job.steps[index].name.clone(),
                    reason,
                });
                continue;
            }

            if !job.steps[index].should_run(&job.env) {
                let reason = match &job.steps[index].when {
                    Some(cond) => format!("condition {} not met", cond),
                    None => "condition not met".to_string(),
                };
                debug!("Skipping step {} of {}: {}", job.steps[index].name, job.name, reason);
                job.steps[index].state = StepState::Skipped {
                    reason: reason.clone(),
                };
                events.emit(RunEvent::StepSkipped {
                    job: job.name.clone(),
                    step: job.steps[index].name.clone(),
                    reason,
                });
                continue;
            }

            if !self.execute_step(job, index, workdir, events).await {
                failed_step = Some(job.steps[index].name.clone());
            }
        }

        match failed_step {
            None => {
                job.state = JobState::Passed {
                    started_at,
                    completed_at: chrono::Utc::now(),
                };
                info!("Job {} passed", job.name);
                events.emit(RunEvent::JobPassed {
                    job: job.name.clone(),
                });
            }
            Some(step) => {
                let error = format!("step {} failed", step);
                job.state = JobState::Failed {
                    error: error.clone(),
                    started_at,
                    failed_at: chrono::Utc::now(),
                };
                warn!("Job {} failed: {}", job.name, error);
                events.emit(RunEvent::JobFailed {
                    job: job.name.clone(),
                    error,
                    allowed: job.allow_failure,
                });
            }
        }
    }

    /// Run one step with retries. Returns true when the step completed.
    async fn execute_step(
        &self,
        job: &mut Job,
        index: usize,
        workdir: Option<&str>,
        events: &EventSink,
    ) -> bool {
        let step_name = job.steps[index].name.clone();
        let command = job.steps[index].command.clone();
        let retries = job.steps[index].retries;
        let timeout_secs = job.steps[index].timeout_secs;

        let mut attempt = 1;
        loop {
            let started_at = chrono::Utc::now();
            job.steps[index].state = StepState::Running {
                started_at,
                attempt,
            };
            events.emit(RunEvent::StepStarted {
                job: job.name.clone(),
                step: step_name.clone(),
                attempt,
            });

            debug!("Running step {} of {}: {}", step_name, job.name, command);

            let outcome = self.run_attempt(&command, job, workdir, timeout_secs).await;

            match outcome {
                AttemptOutcome::Success {
                    exit_code,
                    output,
                    duration_ms,
                } => {
                    job.steps[index].state = StepState::Completed {
                        exit_code,
                        output: output.clone(),
                        attempts: attempt,
                        started_at,
                        completed_at: chrono::Utc::now(),
                    };
                    events.emit(RunEvent::StepOutput {
                        job: job.name.clone(),
                        step: step_name.clone(),
                        output,
                    });
                    events.emit(RunEvent::StepCompleted {
                        job: job.name.clone(),
                        step: step_name.clone(),
                        exit_code,
                        duration_ms,
                    });
                    return true;
                }
                AttemptOutcome::Failure {
                    error,
                    exit_code,
                    output,
                } => {
                    if attempt <= retries {
                        warn!(
                            "Step {} of {} failed ({}), retrying",
                            step_name, job.name, error
                        );
                        events.emit(RunEvent::StepRetrying {
                            job: job.name.clone(),
                            step: step_name.clone(),
                            attempt,
                            retries,
                        });
                        attempt += 1;
                        continue;
                    }

                    if !output.is_empty() {
                        events.emit(RunEvent::StepOutput {
                            job: job.name.clone(),
                            step: step_name.clone(),
                            output,
                        });
                    }
                    job.steps[index].state = StepState::Failed {
                        error: error.clone(),
                        exit_code,
                        attempts: attempt,
                        last_started_at: started_at,
                        failed_at: chrono::Utc::now(),
                    };
                    events.emit(RunEvent::StepFailed {
                        job: job.name.clone(),
                        step: step_name.clone(),
                        error,
                    });
                    return false;
                }
            }
        }
    }

    async fn run_attempt(
        &self,
        command: &str,
        job: &Job,
        workdir: Option<&str>,
        timeout_secs: u64,
    ) -> AttemptOutcome {
        let timeout_duration = Duration::from_secs(timeout_secs);
        let result = timeout(
            timeout_duration,
            self.runner.run(command, &job.env, workdir),
        )
        .await;

        match result {
            Ok(Ok(output)) if output.success() => AttemptOutcome::Success {
                exit_code: output.exit_code,
                output: output.combined(),
                duration_ms: output.duration_ms,
            },
            Ok(Ok(output)) => AttemptOutcome::Failure {
                error: format!("exited with code {}", output.exit_code),
                exit_code: Some(output.exit_code),
                output: output.combined(),
            },
            Ok(Err(e)) => AttemptOutcome::Failure {
                error: e.to_string(),
                exit_code: None,
                output: String::new(),
            },
            Err(_) => AttemptOutcome::Failure {
                error: RunnerError::Timeout(timeout_secs).to_string(),
                exit_code: None,
                output: String::new(),
            },
        }
    }
}
