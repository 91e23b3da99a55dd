//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall run status for a matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run has not started
    Pending,
    /// Run is currently executing jobs
    Running,
    /// Every required job passed
    Passed,
    /// At least one required job failed
    Failed,
    /// Run was cancelled
    Cancelled,
}

/// State of a single step within a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepState {
    /// Step has not run yet
    Pending,
    /// Step is currently running
    Running {
        started_at: DateTime<Utc>,
        attempt: usize,
    },
    /// Step finished with exit code zero
    Completed {
        exit_code: i32,
        output: String,
        attempts: usize,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// Step failed (non-zero exit, spawn error, or timeout; retries exhausted)
    Failed {
        error: String,
        exit_code: Option<i32>,
        attempts: usize,
        last_started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Step did not run (condition not met, or an earlier step failed)
    Skipped {
        reason: String,
    },
}

impl StepState {
    /// Check if step is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Completed { .. } | StepState::Failed { .. } | StepState::Skipped { .. }
        )
    }
}

/// State of a single job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum JobState {
    /// Job is waiting to be scheduled
    Pending,
    /// Job is currently executing its steps
    Running {
        started_at: DateTime<Utc>,
    },
    /// All steps completed or were skipped by their conditions
    Passed {
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    /// A step failed
    Failed {
        error: String,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
}

impl JobState {
    /// Check if job is in a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Passed { .. } | JobState::Failed { .. })
    }
}

/// Overall state of a matrix run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Unique run ID
    pub run_id: Uuid,

    /// Current run status
    pub status: RunStatus,

    /// When the run started
    pub started_at: Option<DateTime<Utc>>,

    /// When the run completed/failed
    pub completed_at: Option<DateTime<Utc>>,

    /// Total number of jobs
    pub total_jobs: usize,

    /// Number of passed jobs
    pub passed_jobs: usize,

    /// Number of failed jobs (including allowed failures)
    pub failed_jobs: usize,

    /// Number of currently running jobs
    pub running_jobs: usize,
}

impl RunState {
    /// Create a new run state
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: RunStatus::Pending,
            started_at: None,
            completed_at: None,
            total_jobs: 0,
            passed_jobs: 0,
            failed_jobs: 0,
            running_jobs: 0,
        }
    }

    /// Mark run as started
    pub fn start(&mut self, total_jobs: usize) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_jobs = total_jobs;
    }

    /// Mark run as passed
    pub fn pass(&mut self) {
        self.status = RunStatus::Passed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark run as failed
    pub fn fail(&mut self) {
        self.status = RunStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    /// Update job counts
    pub fn update_counts(&mut self, total: usize, passed: usize, failed: usize, running: usize) {
        self.total_jobs = total;
        self.passed_jobs = passed;
        self.failed_jobs = failed;
        self.running_jobs = running;
    }

    /// Calculate progress percentage (0.0 to 1.0)
    pub fn progress(&self) -> f64 {
        if self.total_jobs == 0 {
            return 0.0;
        }
        (self.passed_jobs + self.failed_jobs) as f64 / self.total_jobs as f64
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
