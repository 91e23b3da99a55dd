//! CLI command definitions

use crate::execution::SchedulingStrategy;
use clap::Args;

/// Run a matrix
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to matrix YAML file
    #[arg(short, long)]
    pub file: String,

    /// Environment overrides (KEY=VALUE), applied to every job
    #[arg(long, value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Run only the named jobs (repeatable)
    #[arg(long)]
    pub job: Vec<String>,

    /// Scheduling strategy
    #[arg(long, value_enum, default_value_t = SchedulingStrategyArg::Sequential)]
    pub strategy: SchedulingStrategyArg,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate a matrix configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to matrix YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show the expanded job list for a matrix
#[derive(Debug, Args, Clone)]
pub struct JobsCommand {
    /// Path to matrix YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// List matrices with run history
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Show run counts
    #[arg(long)]
    pub with_counts: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Matrix name to filter by
    #[arg(short, long)]
    pub matrix: Option<String>,

    /// Number of recent runs to show
    #[arg(short = 'n', long, default_value_t = 10)]
    pub limit: usize,

    /// Show full details
    #[arg(long)]
    pub verbose: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show a specific run by ID
    #[arg(long)]
    pub run_id: Option<String>,
}

/// Scheduling strategy argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SchedulingStrategyArg {
    Sequential,
    Parallel,
    #[clap(name = "parallel-limited")]
    ParallelLimited,
}

impl From<SchedulingStrategyArg> for SchedulingStrategy {
    fn from(arg: SchedulingStrategyArg) -> Self {
        match arg {
            SchedulingStrategyArg::Sequential => SchedulingStrategy::Sequential,
            SchedulingStrategyArg::Parallel => SchedulingStrategy::Parallel,
            SchedulingStrategyArg::ParallelLimited => SchedulingStrategy::LimitedParallel(4),
        }
    }
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
