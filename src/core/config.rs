//! Matrix configuration from YAML

use crate::core::{condition::WhenCondition, Matrix};
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Top-level matrix configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixConfig {
    /// Matrix name (typically the project under test)
    pub name: String,

    /// Configuration version (optional)
    #[serde(default)]
    pub version: Option<String>,

    /// Global environment variables shared by all jobs
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Matrix entries, one per job
    pub matrix: Vec<EntryConfig>,

    /// Install phase steps (dependency setup)
    #[serde(default)]
    pub install: Vec<StepConfig>,

    /// Script phase steps (the test invocation itself)
    pub script: Vec<StepConfig>,

    /// Shell used to run commands
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Working directory for all jobs (defaults to the current directory)
    #[serde(default)]
    pub workdir: Option<String>,

    /// Default timeout for steps (in seconds)
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,

    /// Default number of retries per step
    #[serde(default)]
    pub max_step_retries: Option<usize>,
}

fn default_shell() -> String {
    "sh".to_string()
}

/// One matrix entry as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Unique job name (e.g. `py27_opj15`)
    pub name: String,

    /// Job tag, substituted into step templates (e.g. `27`)
    pub tag: String,

    /// Entry-specific environment variables (feature flags)
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Whether a failure of this job is tolerated by the run
    #[serde(default)]
    pub allow_failure: bool,
}

/// One step as defined in YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Human-readable step name
    #[serde(default)]
    pub name: Option<String>,

    /// Shell command template
    pub run: String,

    /// Condition expression gating this step per job
    #[serde(default)]
    pub when: Option<String>,

    /// Timeout for this step (overrides global)
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Retries for this step (overrides global)
    #[serde(default)]
    pub retries: Option<usize>,
}

/// Environment variables the runner injects itself
const RESERVED_ENV_KEYS: &[&str] = &[crate::core::env::JOB_NAME_VAR, crate::core::env::JOB_TAG_VAR];

impl MatrixConfig {
    /// Load matrix configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse matrix configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: MatrixConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the matrix configuration
    pub fn validate(&self) -> Result<()> {
        if self.matrix.is_empty() {
            anyhow::bail!("Matrix must define at least one entry");
        }

        if self.script.is_empty() {
            anyhow::bail!("Matrix must define at least one script step");
        }

        let key_re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();

        // Check that all entry names are unique and well-formed
        let mut seen_names = std::collections::HashSet::new();
        for entry in &self.matrix {
            if entry.name.trim().is_empty() {
                anyhow::bail!("Matrix entry has an empty name");
            }
            if entry.tag.trim().is_empty() {
                anyhow::bail!("Matrix entry '{}' has an empty tag", entry.name);
            }
            if !seen_names.insert(&entry.name) {
                anyhow::bail!("Duplicate matrix entry name: {}", entry.name);
            }

            for key in entry.env.keys() {
                if !key_re.is_match(key) {
                    anyhow::bail!(
                        "Entry '{}' has invalid env key '{}'",
                        entry.name,
                        key
                    );
                }
                if RESERVED_ENV_KEYS.contains(&key.as_str()) {
                    anyhow::bail!(
                        "Entry '{}' sets reserved env key '{}' (injected by the runner)",
                        entry.name,
                        key
                    );
                }
            }
        }

        for key in self.env.keys() {
            if !key_re.is_match(key) {
                anyhow::bail!("Invalid global env key '{}'", key);
            }
            if RESERVED_ENV_KEYS.contains(&key.as_str()) {
                anyhow::bail!(
                    "Global env sets reserved key '{}' (injected by the runner)",
                    key
                );
            }
        }

        // Check all steps across both phases
        for (phase, steps) in [("install", &self.install), ("script", &self.script)] {
            for (index, step) in steps.iter().enumerate() {
                if step.run.trim().is_empty() {
                    anyhow::bail!(
                        "Step {}[{}] has an empty run command",
                        phase,
                        index
                    );
                }
                if let Some(expr) = &step.when {
                    WhenCondition::parse(expr).map_err(|e| {
                        anyhow::anyhow!(
                            "Step {}[{}] has an invalid when expression: {}",
                            phase,
                            index,
                            e
                        )
                    })?;
                }
            }
        }

        Ok(())
    }

    /// Effective name of a step (explicit name, or phase + index)
    pub fn step_name(phase: &str, index: usize, step: &StepConfig) -> String {
        step.name
            .clone()
            .unwrap_or_else(|| format!("{}[{}]", phase, index))
    }

    /// Expand the config into a Matrix domain model
    pub fn to_matrix(&self) -> Matrix {
        Matrix::from_config(self)
    }
}
