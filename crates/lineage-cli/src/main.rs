//! sqllineage CLI - table, column and join lineage for SQL files

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;

use cli::Cli;
use commands::{clean, columns, joins, summary, tables};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match &cli.command {
        cli::Commands::Tables(args) => tables::execute(args, &cli.global),
        cli::Commands::Columns(args) => columns::execute(args, &cli.global),
        cli::Commands::Joins(args) => joins::execute(args, &cli.global),
        cli::Commands::Summary(args) => summary::execute(args, &cli.global),
        cli::Commands::Clean(args) => clean::execute(args, &cli.global),
    }
}
