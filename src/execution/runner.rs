//! Shell command runner - spawns step commands as subprocesses

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Error types for command execution
///
/// A non-zero exit is not an error here: it comes back as a normal
/// [`CommandOutput`] and the executor decides what it means for the step.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Failed to spawn command: {0}")]
    Spawn(String),

    #[error("Timeout after {0} seconds")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Captured result of one command invocation
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code (-1 when terminated by a signal)
    pub exit_code: i32,

    /// Captured stdout
    pub stdout: String,

    /// Captured stderr
    pub stderr: String,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl CommandOutput {
    /// Whether the command exited zero
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stdout with stderr appended, for step output recording
    pub fn combined(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Trait for command execution - allows for different implementations
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a shell command with the given environment and working directory
    async fn run(
        &self,
        command: &str,
        env: &BTreeMap<String, String>,
        workdir: Option<&str>,
    ) -> Result<CommandOutput, RunnerError>;
}

/// Runner that executes commands through a shell (`<shell> -c <command>`)
#[derive(Debug, Clone)]
pub struct ShellRunner {
    /// Shell executable (e.g. "sh", "bash")
    shell: String,
}

impl ShellRunner {
    /// Create a new shell runner
    pub fn new(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Get the shell executable
    #[cfg(test)]
    pub fn shell(&self) -> &str {
        &self.shell
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("sh")
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(
        &self,
        command: &str,
        env: &BTreeMap<String, String>,
        workdir: Option<&str>,
    ) -> Result<CommandOutput, RunnerError> {
        debug!("Spawning `{} -c` for command: {}", self.shell, command);

        let start = Instant::now();

        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command).envs(env).kill_on_drop(true);
        if let Some(dir) = workdir {
            cmd.current_dir(dir);
        }

        // The job env is layered over the inherited environment so commands
        // still find PATH, HOME and friends.
        let output = cmd
            .output()
            .await
            .map_err(|e| RunnerError::Spawn(format!("{}: {}", self.shell, e)))?;

        let duration_ms = start.elapsed().as_millis() as u64;
        let exit_code = output.status.code().unwrap_or(-1);
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            warn!(
                "Command exited with code {}: {}",
                exit_code,
                stderr.trim()
            );
        }

        debug!(
            "Command finished in {}ms with exit code {}",
            duration_ms, exit_code
        );

        Ok(CommandOutput {
            exit_code,
            stdout,
            stderr,
            duration_ms,
        })
    }
}
