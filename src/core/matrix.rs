//! Matrix domain model

use crate::core::{
    config::MatrixConfig,
    job::Job,
    state::{JobState, RunState, RunStatus},
};
use anyhow::Result;

/// An expanded matrix: one job per entry, in declaration order
#[derive(Debug, Clone)]
pub struct Matrix {
    /// Matrix name
    pub name: String,

    /// Shell used to run step commands
    pub shell: String,

    /// Working directory for all jobs
    pub workdir: Option<String>,

    /// Jobs in declaration order
    pub jobs: Vec<Job>,

    /// Run state
    pub state: RunState,
}

impl Matrix {
    /// Expand a configuration into a matrix
    pub fn from_config(config: &MatrixConfig) -> Self {
        let jobs = config
            .matrix
            .iter()
            .map(|entry| Job::from_entry(config, entry))
            .collect();

        Matrix {
            name: config.name.clone(),
            shell: config.shell.clone(),
            workdir: config.workdir.clone(),
            jobs,
            state: RunState::new(),
        }
    }

    /// Get a job by name
    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.name == name)
    }

    /// Get a mutable job by name
    pub fn job_mut(&mut self, name: &str) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|j| j.name == name)
    }

    /// Restrict the matrix to the named jobs, preserving declaration order
    pub fn select_jobs(&mut self, names: &[String]) -> Result<()> {
        for name in names {
            if self.job(name).is_none() {
                anyhow::bail!("No such job in matrix: {}", name);
            }
        }
        self.jobs.retain(|j| names.contains(&j.name));
        Ok(())
    }

    /// Jobs that have not started yet
    pub fn pending_jobs(&self) -> Vec<&Job> {
        self.jobs
            .iter()
            .filter(|j| matches!(j.state, JobState::Pending))
            .collect()
    }

    /// Jobs currently running
    pub fn running_jobs(&self) -> Vec<&Job> {
        self.jobs
            .iter()
            .filter(|j| matches!(j.state, JobState::Running { .. }))
            .collect()
    }

    /// Jobs that passed
    pub fn passed_jobs(&self) -> Vec<&Job> {
        self.jobs
            .iter()
            .filter(|j| matches!(j.state, JobState::Passed { .. }))
            .collect()
    }

    /// Jobs that failed (including allowed failures)
    pub fn failed_jobs(&self) -> Vec<&Job> {
        self.jobs
            .iter()
            .filter(|j| matches!(j.state, JobState::Failed { .. }))
            .collect()
    }

    /// Check if every job is in a terminal state
    pub fn is_complete(&self) -> bool {
        self.jobs.iter().all(|j| j.state.is_terminal())
    }

    /// Check if any job whose failure is not allowed has failed
    pub fn has_required_failure(&self) -> bool {
        self.jobs
            .iter()
            .any(|j| !j.allow_failure && matches!(j.state, JobState::Failed { .. }))
    }

    /// Check if the run failed overall
    pub fn has_failed(&self) -> bool {
        self.state.status == RunStatus::Failed
    }
}
