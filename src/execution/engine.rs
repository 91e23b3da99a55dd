//! Main execution engine - orchestrates an entire matrix run

use crate::{
    core::{Matrix, RunStatus},
    execution::{JobExecutor, JobScheduler, SchedulingStrategy},
    execution::runner::CommandRunner,
};
use std::sync::{Arc, Mutex};
use tracing::{error, info};
use uuid::Uuid;

/// Events that can occur during a matrix run
#[derive(Debug, Clone)]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        matrix_name: String,
    },
    JobStarted {
        job: String,
    },
    StepStarted {
        job: String,
        step: String,
        attempt: usize,
    },
    StepOutput {
        job: String,
        step: String,
        output: String,
    },
    StepSkipped {
        job: String,
        step: String,
        reason: String,
    },
    StepRetrying {
        job: String,
        step: String,
        attempt: usize,
        retries: usize,
    },
    StepCompleted {
        job: String,
        step: String,
        exit_code: i32,
        duration_ms: u64,
    },
    StepFailed {
        job: String,
        step: String,
        error: String,
    },
    JobPassed {
        job: String,
    },
    JobFailed {
        job: String,
        error: String,
        allowed: bool,
    },
    RunCompleted {
        run_id: Uuid,
        status: RunStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Shared sink delivering events to all registered handlers.
///
/// Cloned into job tasks so step events surface while jobs run in parallel.
#[derive(Clone)]
pub struct EventSink {
    handlers: Arc<Mutex<Vec<EventHandler>>>,
}

impl EventSink {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a handler
    pub fn add<F>(&self, handler: F)
    where
        F: Fn(RunEvent) + Send + Sync + 'static,
    {
        self.handlers.lock().unwrap().push(Arc::new(handler));
    }

    /// Emit an event to all handlers
    pub fn emit(&self, event: RunEvent) {
        let handlers = self.handlers.lock().unwrap();
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new()
    }
}

/// Main matrix execution engine
pub struct RunEngine<R> {
    scheduler: JobScheduler,
    executor: Arc<JobExecutor<R>>,
    events: EventSink,
}

impl<R: CommandRunner + Send + Sync + 'static> RunEngine<R> {
    pub fn new(runner: R, strategy: SchedulingStrategy) -> Self {
        Self {
            scheduler: JobScheduler::new(strategy),
            executor: Arc::new(JobExecutor::new(runner)),
            events: EventSink::new(),
        }
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(RunEvent) + Send + Sync + 'static,
    {
        self.events.add(handler);
    }

    /// Execute the entire matrix
    pub async fn execute(&self, matrix: &mut Matrix) -> Result<(), String> {
        let run_id = matrix.state.run_id;
        let matrix_name = matrix.name.clone();

        info!("Starting matrix run: {} ({})", matrix_name, run_id);
        self.events.emit(RunEvent::RunStarted {
            run_id,
            matrix_name: matrix_name.clone(),
        });

        matrix.state.start(matrix.jobs.len());

        while !matrix.is_complete() {
            let batch = self.scheduler.next_jobs(matrix);

            if batch.is_empty() {
                // Nothing pending and nothing running - jobs carry no
                // dependencies, so this can only mean a bookkeeping bug.
                error!("No runnable jobs but matrix incomplete");
                matrix.state.fail();
                self.events.emit(RunEvent::RunCompleted {
                    run_id,
                    status: RunStatus::Failed,
                });
                return Err("Run stuck - no runnable jobs".to_string());
            }

            self.execute_batch(matrix, batch).await?;
            self.update_state_counts(matrix);
        }

        let status = if matrix.has_required_failure() {
            matrix.state.fail();
            RunStatus::Failed
        } else {
            matrix.state.pass();
            RunStatus::Passed
        };

        info!("Matrix run finished: {} - {:?}", matrix_name, status);
        self.events.emit(RunEvent::RunCompleted { run_id, status });

        Ok(())
    }

    /// Run one batch of jobs concurrently and merge the results back.
    ///
    /// Jobs are moved into their tasks whole; nothing is shared between them
    /// beyond the executor and the event sink.
    async fn execute_batch(&self, matrix: &mut Matrix, batch: Vec<String>) -> Result<(), String> {
        let workdir = matrix.workdir.clone();

        let mut handles = Vec::new();
        for name in batch {
            let mut job = match matrix.job(&name).cloned() {
                Some(j) => j,
                None => return Err(format!("Job {} not found", name)),
            };

            let executor = self.executor.clone();
            let events = self.events.clone();
            let workdir = workdir.clone();

            handles.push(tokio::spawn(async move {
                executor
                    .execute_job(&mut job, workdir.as_deref(), &events)
                    .await;
                job
            }));
        }

        for handle in handles {
            let job = handle
                .await
                .map_err(|e| format!("Job task failed: {}", e))?;
            if let Some(slot) = matrix.job_mut(&job.name) {
                *slot = job;
            }
        }

        Ok(())
    }

    /// Update run state counts
    fn update_state_counts(&self, matrix: &mut Matrix) {
        let total = matrix.jobs.len();
        let passed = matrix.passed_jobs().len();
        let failed = matrix.failed_jobs().len();
        let running = matrix.running_jobs().len();

        matrix.state.update_counts(total, passed, failed, running);
    }
}
