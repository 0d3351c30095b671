//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand};

/// Tidemark - apply versioned SQL migrations exactly once
#[derive(Parser, Debug)]
#[command(name = "tm")]
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

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override database path from config (":memory:" for in-memory)
    #[arg(short, long, global = true, env = "TIDEMARK_DATABASE")]
    pub database: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply every pending migration
    Migrate,

    /// Show applied, pending, and drifted migrations
    Status(StatusArgs),

    /// Check migration file names and versions without touching the database
    Validate,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Only list migrations that are not applied cleanly
    #[arg(long)]
    pub pending: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
