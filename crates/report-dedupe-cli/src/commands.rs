use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "report-dedupe")]
#[command(about = "Find and clean up duplicate reports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load reports from a JSON array file into the store for the configured owner
    Import {
        /// Path to the JSON file
        path: PathBuf,
    },
    /// List duplicate groups without changing anything
    Scan,
    /// Scan, then delete every duplicate except the newest copy in each group
    Cleanup {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Print configuration values
    PrintConfig,
}
