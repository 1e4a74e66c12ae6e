//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// visitlog - visitor telemetry collector
#[derive(Parser, Debug)]
#[command(name = "visitlog")]
#[command(version)]
#[command(about = "Collect visitor events over HTTP into an append-only JSON Lines log", long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Generate a sample configuration file
    GenerateConfig {
        /// Output file path (default: stdout)
        output: Option<String>,
    },
}
