//! Job domain model

use crate::core::{
    condition::WhenCondition,
    config::{EntryConfig, MatrixConfig, StepConfig},
    env::{render_command, resolve_env},
    state::{JobState, StepState},
};
use std::collections::BTreeMap;

/// Execution phase of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Dependency setup, runs first
    Install,
    /// The test invocation itself
    Script,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Install => "install",
            Phase::Script => "script",
        }
    }
}

/// A single step of a job, with its command already interpolated
#[derive(Debug, Clone)]
pub struct JobStep {
    /// Step name (explicit or phase + index)
    pub name: String,

    /// Phase this step belongs to
    pub phase: Phase,

    /// The shell command to run
    pub command: String,

    /// Condition gating this step, if any
    pub when: Option<WhenCondition>,

    /// Timeout in seconds
    pub timeout_secs: u64,

    /// Extra attempts allowed after a failure
    pub retries: usize,

    /// Runtime state
    pub state: StepState,
}

/// Defaults applied to steps that do not override them
#[derive(Debug, Clone)]
pub struct StepDefaults {
    pub timeout_secs: u64,
    pub retries: usize,
}

impl Default for StepDefaults {
    fn default() -> Self {
        Self {
            timeout_secs: 600,
            retries: 0,
        }
    }
}

/// One expanded job of the matrix
#[derive(Debug, Clone)]
pub struct Job {
    /// Unique job name from the matrix entry
    pub name: String,

    /// Job tag from the matrix entry
    pub tag: String,

    /// Fully resolved environment for this job
    pub env: BTreeMap<String, String>,

    /// Whether a failure of this job is tolerated by the run
    pub allow_failure: bool,

    /// Steps in execution order (install phase first, then script)
    pub steps: Vec<JobStep>,

    /// Runtime state
    pub state: JobState,
}

impl Job {
    /// Expand one matrix entry into a job
    pub fn from_entry(config: &MatrixConfig, entry: &EntryConfig) -> Self {
        let defaults = StepDefaults {
            timeout_secs: config.default_timeout_secs.unwrap_or(600),
            retries: config.max_step_retries.unwrap_or(0),
        };

        let env = resolve_env(&config.env, &entry.env, &entry.name, &entry.tag);

        let mut steps = Vec::new();
        for (phase, configs) in [
            (Phase::Install, &config.install),
            (Phase::Script, &config.script),
        ] {
            for (index, step) in configs.iter().enumerate() {
                steps.push(JobStep::from_config(
                    phase, index, step, entry, &env, &defaults,
                ));
            }
        }

        Job {
            name: entry.name.clone(),
            tag: entry.tag.clone(),
            env,
            allow_failure: entry.allow_failure,
            steps,
            state: JobState::Pending,
        }
    }

    /// Check if every step is in a terminal state
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_terminal())
    }

    /// Check if any step failed
    pub fn has_failed_step(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s.state, StepState::Failed { .. }))
    }

    /// Get a step by name
    pub fn step(&self, name: &str) -> Option<&JobStep> {
        self.steps.iter().find(|s| s.name == name)
    }
}

impl JobStep {
    /// Build a step from config, interpolating the command for this entry.
    ///
    /// Conditions were validated at config load time, so a parse failure here
    /// means the step never runs rather than panicking mid-run.
    fn from_config(
        phase: Phase,
        index: usize,
        config: &StepConfig,
        entry: &EntryConfig,
        env: &BTreeMap<String, String>,
        defaults: &StepDefaults,
    ) -> Self {
        let when = config
            .when
            .as_deref()
            .and_then(|expr| WhenCondition::parse(expr).ok());

        JobStep {
            name: MatrixConfig::step_name(phase.as_str(), index, config),
            phase,
            command: render_command(&config.run, &entry.name, &entry.tag, env),
            when,
            timeout_secs: config.timeout_secs.unwrap_or(defaults.timeout_secs),
            retries: config.retries.unwrap_or(defaults.retries),
            state: StepState::Pending,
        }
    }

    /// Whether this step should run for its job's environment
    pub fn should_run(&self, env: &BTreeMap<String, String>) -> bool {
        self.when.as_ref().map_or(true, |cond| cond.evaluate(env))
    }
}
