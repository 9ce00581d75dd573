//! CLI argument definitions using clap
//!
//! Commands:
//! - jobmgr inspect --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// jobmgr - job manager restart tooling
#[derive(Parser, Debug)]
#[command(name = "jobmgr")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List persisted jobs and the checkpoint watermark
    Inspect {
        /// Path to configuration file
        #[arg(long, default_value = "./jobmgr.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
