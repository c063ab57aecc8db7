//! CLI command definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// clusterd - control-plane coordinator for cluster resources
#[derive(Parser)]
#[command(
    name = "cld",
    about = "Control-plane coordinator for cluster resources",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Run the coordinator in the foreground
    Run {
        /// Listen uri override (e.g. tcp://localhost:9998)
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Print the effective configuration as YAML
    ShowConfig,
}
