use std::path::PathBuf;

use clap::{Parser, Subcommand};

use pixdiff::config::{DEFAULT_OUTPUT_DIR, DiffConfig, HistoryConfig};

#[derive(Parser)]
#[command(
    name = "pixdiff",
    about = "Pixel diffs between an image and its previous git revision"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create .pixdiff/config.toml with commented defaults
    Init {
        /// Overwrite existing config and gitignore
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Compare a file with its content at an earlier revision (exit 0/1)
    History {
        /// Image in the working tree
        file: PathBuf,
        /// Repository root (discovered from FILE when omitted)
        #[arg(long)]
        repo: Option<PathBuf>,
        /// Write current, previous and diff images into DIR (default .pixdiff/out)
        #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = DEFAULT_OUTPUT_DIR)]
        out: Option<PathBuf>,
        /// Print a JSON report instead of a status line
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        history: HistoryConfig,
        #[command(flatten)]
        diff: DiffConfig,
    },

    /// Compare two image files directly (exit 0/1)
    Files {
        /// The newer image
        current: PathBuf,
        /// The older image
        previous: PathBuf,
        /// Write current, previous and diff images into DIR (default .pixdiff/out)
        #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = DEFAULT_OUTPUT_DIR)]
        out: Option<PathBuf>,
        /// Print a JSON report instead of a status line
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        diff: DiffConfig,
    },

    /// Compare every file matching the glob patterns with its earlier revision
    Batch {
        /// Glob patterns, e.g. 'assets/**/*.png'
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Repository root (discovered per file when omitted)
        #[arg(long)]
        repo: Option<PathBuf>,
        /// Write per-file artifacts under DIR (default .pixdiff/out), mirroring relative paths
        #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = DEFAULT_OUTPUT_DIR)]
        out: Option<PathBuf>,
        #[command(flatten)]
        history: HistoryConfig,
        #[command(flatten)]
        diff: DiffConfig,
    },
}
