//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{HistoryCommand, JobsCommand, ListCommand, RunCommand, ValidateCommand};

/// CI matrix job runner
#[derive(Debug, Parser, Clone)]
#[command(name = "matrixci")]
#[command(version = "0.1.0")]
#[command(about = "A CI matrix job runner", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print step output as steps finish
    #[arg(short, long, global = true)]
    pub stream: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run a matrix
    Run(RunCommand),

    /// Validate a matrix configuration
    Validate(ValidateCommand),

    /// Show the expanded job list for a matrix
    Jobs(JobsCommand),

    /// List matrices with run history
    List(ListCommand),

    /// Show run history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}

use std::ffi::OsString;
