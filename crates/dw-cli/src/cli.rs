//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

/// Dwell-time tracker.
///
/// Attributes browsing time to domains, classifies it, and accumulates it
/// into daily per-domain buckets.
#[derive(Debug, Parser)]
#[command(name = "dw", version, about, long_about = None)]
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
    /// Track focus events from a JSONL stream.
    ///
    /// Each line is a timestamped event, e.g.
    /// `{"ts":"2025-06-02T09:00:00Z","event":"focus_gained","url":"https://github.com"}`.
    Track {
        /// Read events from a file instead of stdin.
        #[arg(long)]
        input: Option<PathBuf>,

        /// Skip forwarding closed sessions to the remote aggregator.
        #[arg(long)]
        no_forward: bool,
    },

    /// Show one day's accumulated dwell time per domain.
    Report {
        /// Day to report (YYYY-MM-DD, UTC). Defaults to today.
        #[arg(long)]
        day: Option<NaiveDate>,

        /// Output JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Delete one day's buckets. Irreversible.
    Clear {
        /// Day to clear (YYYY-MM-DD, UTC). Defaults to today.
        #[arg(long)]
        day: Option<NaiveDate>,
    },
}
