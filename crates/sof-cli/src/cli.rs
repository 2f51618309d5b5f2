//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Statement of Facts laytime calculator.
///
/// Reconciles extracted Statement of Facts events into a timeline and
/// computes laytime allowed, laytime consumed, demurrage and dispatch.
#[derive(Debug, Parser)]
#[command(name = "sof", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Calculate laytime, demurrage and dispatch for request files.
    Calculate {
        /// Request files (JSON with `summary` and `events`).
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Year for dates that carry only a day and month.
        #[arg(long)]
        year: Option<i32>,
    },

    /// Show the finalized event timeline of a request file.
    Events {
        /// Request file.
        file: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Year for dates that carry only a day and month.
        #[arg(long)]
        year: Option<i32>,
    },
}
