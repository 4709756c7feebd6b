//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "xbrl-diag",
    version,
    about = "Turn XBRL validation logs into actionable diagnostics",
    long_about = "Classify, explain and locate the findings of an XBRL validation run.\n\n\
                  Reads the engine's event log with its rule metadata and fact values,\n\
                  composes Rule / Found / Gap / Fix text per finding and reports rule\n\
                  coverage against a per-entry-point baseline."
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

    /// Configuration file (default: $XBRL_DIAG_CONFIG, then ./xbrl-diag.toml).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Process one validation run and print its diagnostics summary.
    Run(RunArgs),

    /// Build the rule baseline for an entry point and taxonomy version.
    Baseline(BaselineArgs),

    /// Show ranked location candidates for one finding.
    Route(RouteArgs),

    /// List the diagnostic categories.
    Categories,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Engine event log (JSON array, engine log object, or JSON Lines).
    #[arg(long = "events", value_name = "PATH")]
    pub events: PathBuf,

    /// Resolved rule metadata (JSON).
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Observed fact values (CSV or JSON).
    #[arg(long = "facts", value_name = "PATH")]
    pub facts: Option<PathBuf>,

    /// Directory of `<table_id>.mapping.json` sidecars.
    #[arg(long = "mappings", value_name = "DIR")]
    pub mappings: Option<PathBuf>,

    /// Entry point id for coverage reporting.
    #[arg(long = "entrypoint", value_name = "ID", requires = "taxonomy_version")]
    pub entrypoint: Option<String>,

    /// Taxonomy version for coverage reporting.
    #[arg(long = "taxonomy-version", value_name = "VERSION", requires = "entrypoint")]
    pub taxonomy_version: Option<String>,

    /// Taxonomy directory used for staleness checks and rebuilds.
    #[arg(long = "taxonomy-dir", value_name = "DIR")]
    pub taxonomy_dir: Option<PathBuf>,

    /// Directory holding baseline files.
    #[arg(long = "baseline-dir", value_name = "DIR")]
    pub baseline_dir: Option<PathBuf>,

    /// Keep non-actionable records, tagged, instead of dropping them.
    #[arg(long = "audit")]
    pub audit: bool,

    /// Which record families to keep.
    #[arg(long = "profile", value_enum)]
    pub profile: Option<ProfileArg>,

    /// Write the diagnostic records as JSON.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Run identifier (default: the events file stem).
    #[arg(long = "run-id", value_name = "ID")]
    pub run_id: Option<String>,
}

#[derive(Parser)]
pub struct BaselineArgs {
    #[arg(long = "entrypoint", value_name = "ID")]
    pub entrypoint: String,

    #[arg(long = "taxonomy-version", value_name = "VERSION")]
    pub taxonomy_version: String,

    /// Taxonomy directory to scan for assertions.
    #[arg(long = "taxonomy-dir", value_name = "DIR")]
    pub taxonomy_dir: Option<PathBuf>,

    /// Directory holding baseline files.
    #[arg(long = "baseline-dir", value_name = "DIR")]
    pub baseline_dir: Option<PathBuf>,

    /// Seconds to wait for the build.
    #[arg(long = "timeout", value_name = "SECS", default_value_t = 600)]
    pub timeout_secs: u64,
}

#[derive(Parser)]
pub struct RouteArgs {
    /// Records written by `run --output`.
    #[arg(long = "records", value_name = "PATH")]
    pub records: PathBuf,

    /// Directory of `<table_id>.mapping.json` sidecars.
    #[arg(long = "mappings", value_name = "DIR")]
    pub mappings: PathBuf,

    /// Finding id (or a unique prefix of it).
    #[arg(long = "id", value_name = "ID")]
    pub id: String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ProfileArg {
    Fast,
    Full,
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
