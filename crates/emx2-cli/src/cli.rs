//! CLI argument definitions for odm2emx2.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tracing::level_filters::LevelFilter;

use emx2_cli::logging::LogFormat;

#[derive(Parser)]
#[command(
    name = "odm2emx2",
    version,
    about = "Convert REDCap CDISC ODM exports to Molgenis EMX2 CSV files",
    long_about = "Convert a REDCap CDISC ODM XML export into Molgenis EMX2 tables.\n\n\
                  Writes molgenis.csv (table definitions), SubjectData.csv and one\n\
                  CSV per instrument into the output folder."
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

    /// Allow clinical values in trace-level logs.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,

    /// TOML configuration file (default: $ODM2EMX2_CONFIG).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert an ODM export and write the EMX2 CSV files.
    Convert(ConvertArgs),

    /// List the instruments of an ODM export without converting it.
    Inspect(InspectArgs),

    /// Write Variables.csv and VariableValues.csv from the export's code lists.
    Codelist(ConvertArgs),
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// ODM XML export to convert.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// EDC system that produced the export (REDCap or Castor).
    #[arg(long = "edc", value_name = "EDC")]
    pub edc: Option<String>,

    /// Output directory (default: data/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Keep existing files in the output directory and append to them.
    #[arg(long = "keep-output")]
    pub keep_output: bool,

    /// Convert and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Print the run summary as JSON.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// ODM XML export to inspect.
    #[arg(value_name = "FILE")]
    pub input: PathBuf,

    /// EDC system that produced the export (REDCap or Castor).
    #[arg(long = "edc", value_name = "EDC")]
    pub edc: Option<String>,

    /// Print the instrument list as JSON.
    #[arg(long = "json")]
    pub json: bool,
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

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => Self::ERROR,
            LogLevelArg::Warn => Self::WARN,
            LogLevelArg::Info => Self::INFO,
            LogLevelArg::Debug => Self::DEBUG,
            LogLevelArg::Trace => Self::TRACE,
        }
    }
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => Self::Pretty,
            LogFormatArg::Compact => Self::Compact,
            LogFormatArg::Json => Self::Json,
        }
    }
}
