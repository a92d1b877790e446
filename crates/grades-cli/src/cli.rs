//! CLI argument definitions for the gradebook tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "gradebook",
    version,
    about = "Gradebook tables - validate scores and derive totals and statistics",
    long_about = "Load student rows for a built-in course, validate them against the \
                  course schema, and print the raw table or the full table with \
                  calculated columns and statistic rows."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow student identifiers and scores in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the built-in courses.
    Courses,

    /// Load a CSV of student rows and print the resulting table.
    Show(ShowArgs),
}

#[derive(Parser)]
pub struct ShowArgs {
    /// Course id from the built-in catalog.
    #[arg(value_name = "COURSE")]
    pub course: String,

    /// CSV file with one header row of column ids and one row per student.
    #[arg(value_name = "DATA.csv")]
    pub data: PathBuf,

    /// Add an empty column before patching (repeatable).
    #[arg(long = "add-column", value_name = "COL")]
    pub add_columns: Vec<String>,

    /// JSON object of row id to partial row, applied after loading.
    #[arg(long = "patch", value_name = "FILE.json")]
    pub patch: Option<PathBuf>,

    /// Print stored rows only, without calculated columns or statistic rows.
    #[arg(long = "raw")]
    pub raw: bool,

    /// Output format.
    #[arg(long = "output", value_enum, default_value = "table")]
    pub output: OutputArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputArg {
    Table,
    Json,
    Csv,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
