//! Persistence layer for matrix run history

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteRunStore;

pub use crate::core::RunStatus;
use crate::core::Matrix;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Summary of a matrix run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run ID
    pub run_id: Uuid,

    /// Matrix name
    pub matrix_name: String,

    /// Run status
    pub status: RunStatus,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run completed (if complete)
    pub completed_at: Option<DateTime<Utc>>,

    /// Progress (0.0 to 1.0)
    pub progress: f64,

    /// Number of passed jobs
    pub passed_jobs: usize,

    /// Number of failed jobs
    pub failed_jobs: usize,

    /// Total number of jobs
    pub total_jobs: usize,
}

/// Trait for persistence backends
#[async_trait::async_trait]
pub trait PersistenceBackend: Send + Sync {
    /// Save a matrix run
    async fn save_run(&self, run: &RunSummary) -> Result<()>;

    /// Load a run by ID
    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>>;

    /// List all runs for a matrix
    async fn list_runs(&self, matrix_name: &str) -> Result<Vec<RunSummary>>;

    /// Get the most recent run for a matrix
    async fn get_latest_run(&self, matrix_name: &str) -> Result<Option<RunSummary>>;

    /// Delete a run by ID
    async fn delete_run(&self, run_id: Uuid) -> Result<()>;

    /// List all matrix names
    async fn list_matrices(&self) -> Result<Vec<String>>;
}

/// In-memory persistence (for --no-history or tests)
pub struct InMemoryStore {
    runs: tokio::sync::RwLock<std::collections::HashMap<Uuid, RunSummary>>,
    by_matrix: tokio::sync::RwLock<std::collections::HashMap<String, Vec<Uuid>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            runs: tokio::sync::RwLock::new(std::collections::HashMap::new()),
            by_matrix: tokio::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for InMemoryStore {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        let mut runs = self.runs.write().await;
        runs.insert(run.run_id, run.clone());

        let mut by_matrix = self.by_matrix.write().await;
        let ids = by_matrix.entry(run.matrix_name.clone()).or_default();
        if !ids.contains(&run.run_id) {
            ids.push(run.run_id);
        }

        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let runs = self.runs.read().await;
        Ok(runs.get(&run_id).cloned())
    }

    async fn list_runs(&self, matrix_name: &str) -> Result<Vec<RunSummary>> {
        let runs = self.runs.read().await;
        let by_matrix = self.by_matrix.read().await;

        let mut result = Vec::new();
        if let Some(ids) = by_matrix.get(matrix_name) {
            for id in ids {
                if let Some(run) = runs.get(id) {
                    result.push(run.clone());
                }
            }
        }
        result.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(result)
    }

    async fn get_latest_run(&self, matrix_name: &str) -> Result<Option<RunSummary>> {
        Ok(self.list_runs(matrix_name).await?.into_iter().next())
    }

    async fn delete_run(&self, run_id: Uuid) -> Result<()> {
        let mut runs = self.runs.write().await;
        if let Some(run) = runs.remove(&run_id) {
            let mut by_matrix = self.by_matrix.write().await;
            if let Some(ids) = by_matrix.get_mut(&run.matrix_name) {
                ids.retain(|id| *id != run_id);
            }
        }
        Ok(())
    }

    async fn list_matrices(&self) -> Result<Vec<String>> {
        let by_matrix = self.by_matrix.read().await;
        let mut names: Vec<String> = by_matrix.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Create a summary from a matrix
pub fn create_summary(matrix: &Matrix) -> RunSummary {
    RunSummary {
        run_id: matrix.state.run_id,
        matrix_name: matrix.name.clone(),
        status: matrix.state.status,
        started_at: matrix.state.started_at.unwrap_or_else(Utc::now),
        completed_at: matrix.state.completed_at,
        progress: matrix.state.progress(),
        passed_jobs: matrix.state.passed_jobs,
        failed_jobs: matrix.state.failed_jobs,
        total_jobs: matrix.state.total_jobs,
    }
}
