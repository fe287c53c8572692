//! CLI module for LitScout
//!
//! Provides command-line interface parsing and handling for the litscout binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// LitScout - parallel literature research
///
/// Fans the subtopics of a research goal out to a deep-research backend and
/// writes one markdown report per subtopic.
#[derive(Parser, Debug)]
#[command(
    name = "litscout",
    version,
    about = "LitScout - parallel literature research",
    long_about = "Researches every subtopic of a goal concurrently with OpenAI Deep Research,\n\
                  Perplexity or a GPT-Researcher service, and writes one report per subtopic.\n\n\
                  Progress is appended to <output_dir>/progress.json and the session state\n\
                  is kept in <output_dir>/status.json.",
    after_help = "EXAMPLES:\n    \
                  litscout run --goal \"Biofilm tolerance\" -s \"Persister cells\" -s \"Quorum sensing\"\n    \
                  litscout run --goal \"Biofilm tolerance\" --subtopics-file subtopics.txt\n    \
                  litscout progress --last 20\n    \
                  litscout status\n    \
                  litscout config --validate"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "litscout.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research every subtopic of a goal in parallel
    Run {
        /// Overall research goal, sent as context with every subtopic
        #[arg(short, long)]
        goal: String,

        /// Subtopic to research (repeatable)
        #[arg(short, long = "subtopic")]
        subtopics: Vec<String>,

        /// File with one subtopic per line ('#' starts a comment)
        #[arg(long)]
        subtopics_file: Option<PathBuf>,

        /// Override the configured backend (`backend` or `backend:model`)
        #[arg(short, long)]
        backend: Option<String>,

        /// Override the configured output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show the latest progress events of a session
    Progress {
        /// Number of events to show
        #[arg(short, long, default_value = "20")]
        last: usize,

        /// Override the configured output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show the session status
    Status {
        /// Override the configured output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show configuration information
    Config {
        /// Validate the configuration file, including backend and credentials
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
