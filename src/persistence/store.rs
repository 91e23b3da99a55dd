//! SQLite-based run history store

use crate::persistence::{PersistenceBackend, RunSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// SQLite run store
pub struct SqliteRunStore {
    pool: SqlitePool,
}

impl SqliteRunStore {
    /// Create a new SQLite store
    pub async fn new(db_path: &str) -> Result<Self> {
        let pool = SqlitePool::connect(&format!("sqlite:{}", db_path))
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        let db_dir = data_dir.join("matrixci");
        std::fs::create_dir_all(&db_dir)?;

        let db_path = db_dir.join("runs.db");
        Self::new(db_path.to_str().unwrap()).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                matrix_name TEXT NOT NULL,
                status TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                progress REAL NOT NULL DEFAULT 0.0,
                passed_jobs INTEGER NOT NULL DEFAULT 0,
                failed_jobs INTEGER NOT NULL DEFAULT 0,
                total_jobs INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_matrix_name ON runs(matrix_name);
            CREATE INDEX IF NOT EXISTS idx_status ON runs(status);
            CREATE INDEX IF NOT EXISTS idx_started_at ON runs(started_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Convert DateTime<Utc> to NaiveDateTime for SQLite
    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    /// Convert NaiveDateTime to DateTime<Utc>
    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn status_from_str(status: &str) -> crate::core::RunStatus {
        match status {
            "Pending" => crate::core::RunStatus::Pending,
            "Running" => crate::core::RunStatus::Running,
            "Passed" => crate::core::RunStatus::Passed,
            "Failed" => crate::core::RunStatus::Failed,
            "Cancelled" => crate::core::RunStatus::Cancelled,
            _ => crate::core::RunStatus::Pending,
        }
    }

    fn summary_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<RunSummary> {
        Ok(RunSummary {
            run_id: Uuid::parse_str(&row.get::<String, _>("id"))?,
            matrix_name: row.get("matrix_name"),
            status: Self::status_from_str(&row.get::<String, _>("status")),
            started_at: Self::from_naive(row.get("started_at")),
            completed_at: row
                .get::<Option<NaiveDateTime>, _>("completed_at")
                .map(Self::from_naive),
            progress: row.get("progress"),
            passed_jobs: row.get::<i64, _>("passed_jobs") as usize,
            failed_jobs: row.get::<i64, _>("failed_jobs") as usize,
            total_jobs: row.get::<i64, _>("total_jobs") as usize,
        })
    }
}

#[async_trait::async_trait]
impl PersistenceBackend for SqliteRunStore {
    async fn save_run(&self, run: &RunSummary) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO runs
            (id, matrix_name, status, started_at, completed_at, progress, passed_jobs, failed_jobs, total_jobs)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(run.run_id.to_string())
        .bind(&run.matrix_name)
        .bind(format!("{:?}", run.status))
        .bind(Self::to_naive(run.started_at))
        .bind(run.completed_at.map(Self::to_naive))
        .bind(run.progress)
        .bind(run.passed_jobs as i64)
        .bind(run.failed_jobs as i64)
        .bind(run.total_jobs as i64)
        .execute(&self.pool)
        .await
        .context("Failed to save run")?;

        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunSummary>> {
        let row = sqlx::query(
            r#"
            SELECT id, matrix_name, status, started_at, completed_at, progress, passed_jobs, failed_jobs, total_jobs
            FROM runs
            WHERE id = ?1
            "#,
        )
        .bind(run_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load run")?;

        row.map(|row| Self::summary_from_row(&row)).transpose()
    }

    async fn list_runs(&self, matrix_name: &str) -> Result<Vec<RunSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, matrix_name, status, started_at, completed_at, progress, passed_jobs, failed_jobs, total_jobs
            FROM runs
            WHERE matrix_name = ?1
            ORDER BY started_at DESC
            "#,
        )
        .bind(matrix_name)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list runs")?;

        rows.iter().map(Self::summary_from_row).collect()
    }

    async fn get_latest_run(&self, matrix_name: &str) -> Result<Option<RunSummary>> {
        let row = sqlx::query(
            r#"
            SELECT id, matrix_name, status, started_at, completed_at, progress, passed_jobs, failed_jobs, total_jobs
            FROM runs
            WHERE matrix_name = ?1
            ORDER BY started_at DESC
            LIMIT 1
            "#,
        )
        .bind(matrix_name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get latest run")?;

        row.map(|row| Self::summary_from_row(&row)).transpose()
    }

    async fn delete_run(&self, run_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM runs WHERE id = ?1")
            .bind(run_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete run")?;

        Ok(())
    }

    async fn list_matrices(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT matrix_name
            FROM runs
            ORDER BY matrix_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list matrices")?;

        Ok(rows.iter().map(|row| row.get("matrix_name")).collect())
    }
}
