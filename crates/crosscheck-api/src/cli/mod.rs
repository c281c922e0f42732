//! CLI command definitions and dispatch for the `xcheck` binary.
//!
//! Uses clap derive macros for argument parsing. Session numbers on the
//! command line are 1-based, matching what `xcheck sessions list` prints.

pub mod access;
pub mod ask;
pub mod chat;
pub mod doctor;
pub mod models;
pub mod progress;
pub mod session;
pub mod turn_view;

use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Ask two models, let them critique each other, and get one verdict.
#[derive(Parser)]
#[command(name = "xcheck", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through the OpenTelemetry stdout exporter.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one question through the answer, critique and synthesis stages.
    Ask {
        /// The question to ask both models.
        question: String,

        /// Role instruction applied to every model call (e.g. "You are a tax advisor").
        #[arg(long)]
        role: Option<String>,

        /// Plain-text reference document placed ahead of the question.
        /// For a PDF, run `pdftotext file.pdf file.txt` and pass the .txt file.
        #[arg(long)]
        doc: Option<PathBuf>,

        /// Session number to append to (default: the most recent).
        #[arg(long, short)]
        session: Option<usize>,
    },

    /// Start an interactive session.
    Chat {
        /// Role instruction applied to every model call.
        #[arg(long)]
        role: Option<String>,

        /// Plain-text reference document placed ahead of each question.
        /// For a PDF, run `pdftotext file.pdf file.txt` and pass the .txt file.
        #[arg(long)]
        doc: Option<PathBuf>,
    },

    /// Manage saved sessions.
    #[command(alias = "session")]
    Sessions {
        #[command(subcommand)]
        action: SessionCommand,
    },

    /// Show which backend A model discovery selects.
    Models,

    /// Check data directory, credentials and both backends.
    Doctor,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// List all sessions.
    #[command(alias = "ls")]
    List,

    /// Print every turn of a session.
    Show {
        /// Session number.
        number: usize,
    },

    /// Start a new empty session.
    New,

    /// Change a session's title.
    Rename {
        /// Session number.
        number: usize,
        /// New title.
        title: String,
    },

    /// Delete one session.
    #[command(alias = "rm")]
    Delete {
        /// Session number.
        number: usize,
        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Delete every session.
    Clear {
        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}

/// Convert a 1-based session number into an index.
pub fn session_index(number: usize) -> anyhow::Result<usize> {
    if number == 0 {
        bail!("session numbers start at 1");
    }
    Ok(number - 1)
}
