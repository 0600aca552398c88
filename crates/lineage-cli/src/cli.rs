//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

/// sqllineage - table, column and join lineage from SQL
#[derive(Parser, Debug)]
#[command(name = "sqllineage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a YAML config file
    #[arg(short, long, global = true, env = "SQLLINEAGE_CONFIG")]
    pub config: Option<String>,

    /// SQL dialect (overrides the config file)
    #[arg(short, long, global = true)]
    pub dialect: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show involved, source and target tables
    Tables(InputArgs),

    /// Show column lineage pairs
    Columns(InputArgs),

    /// Show the join graph
    Joins(InputArgs),

    /// Show everything derived for each statement
    Summary(InputArgs),

    /// Show the cleaned query, or that it was filtered
    Clean(CleanArgs),
}

/// Arguments shared by the lineage commands
#[derive(Args, Debug)]
pub struct InputArgs {
    /// SQL file to read (`-` for stdin)
    #[arg(default_value = "-")]
    pub input: String,

    /// Output format (overrides the config file)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

/// Arguments for the clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// SQL file to read (`-` for stdin)
    #[arg(default_value = "-")]
    pub input: String,
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
