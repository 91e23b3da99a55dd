//! Job scheduler - determines which jobs to run next

use crate::core::{JobState, Matrix};

/// Strategy for scheduling job execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingStrategy {
    /// Execute jobs in declaration order, one at a time
    Sequential,

    /// Execute all pending jobs in parallel
    Parallel,

    /// Limited parallelism (max N concurrent jobs)
    LimitedParallel(usize),
}

impl Default for SchedulingStrategy {
    fn default() -> Self {
        SchedulingStrategy::Sequential
    }
}

/// Scheduler for determining which jobs to run
pub struct JobScheduler {
    strategy: SchedulingStrategy,
}

impl JobScheduler {
    pub fn new(strategy: SchedulingStrategy) -> Self {
        Self { strategy }
    }

    /// Get the next batch of jobs to execute
    pub fn next_jobs(&self, matrix: &Matrix) -> Vec<String> {
        let running = matrix.running_jobs().len();

        let pending = matrix
            .jobs
            .iter()
            .filter(|j| matches!(j.state, JobState::Pending))
            .map(|j| j.name.clone());

        match self.strategy {
            SchedulingStrategy::Sequential => {
                if running > 0 {
                    return vec![];
                }
                pending.take(1).collect()
            }
            SchedulingStrategy::Parallel => pending.collect(),
            SchedulingStrategy::LimitedParallel(max) => {
                pending.take(max.saturating_sub(running)).collect()
            }
        }
    }

    /// Check if there are more jobs to run
    pub fn has_more(&self, matrix: &Matrix) -> bool {
        !self.next_jobs(matrix).is_empty()
    }
}
