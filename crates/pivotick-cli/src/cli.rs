//! CLI argument definitions for pivotick.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Resolve a stock code and print next-session pivot bands |
//! | `pivots` | Compute bands from a given high/low/close (no network) |
//! | `classify` | Show the market board and adapter order for a code |
//! | `sources` | List adapter priority per market board |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `text` | Output format (text, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--config` | `$PIVOTICK_CONFIG` | JSON configuration file |
//! | `--timeout-ms` | from config | Per-adapter deadline in ms |
//! | `--offline` | `false` | Never touch the network |
//!
//! # Examples
//!
//! ```bash
//! pivotick quote 2330
//! pivotick quote 6488 --variant typical-half-distance --precision 2
//! pivotick pivots --high 582 --low 574 --close 576 --format json --pretty
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pivotick_core::PivotVariant;

/// Taiwan stock CDP pivot calculator.
#[derive(Debug, Parser)]
#[command(
    name = "pivotick",
    author,
    version,
    about = "Taiwan stock quote resolution and CDP pivot bands",
    long_about = "Resolves a Taiwan stock code against TWSE, TPEx, Goodinfo and Yahoo Taiwan \
in a configured fallback order, then derives next-session support and resistance \
bands from the day's high, low and close.\n\
\n\
Use 'pivotick <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// JSON configuration file (defaults to $PIVOTICK_CONFIG).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Per-adapter deadline in milliseconds.
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Use an offline transport; every upstream call fails as a network error.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Chat-bot style reply text.
    Text,
    /// Single JSON object.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve a stock code and print next-session pivot bands.
    Quote(QuoteArgs),
    /// Compute pivot bands from explicit prices.
    Pivots(PivotsArgs),
    /// Show the market board a code maps to.
    Classify(ClassifyArgs),
    /// List adapter priority per market board.
    Sources,
}

/// Formula selection shared by `quote` and `pivots`.
#[derive(Debug, Clone, Args)]
pub struct PivotArgs {
    /// Pivot formula (classic, typical-full-range, typical-half-distance).
    #[arg(long)]
    pub variant: Option<PivotVariant>,

    /// Decimal digits kept in the bands (0-4).
    #[arg(long)]
    pub precision: Option<u8>,
}

#[derive(Debug, Clone, Args)]
pub struct QuoteArgs {
    /// Stock code, e.g. 2330.
    pub id: String,

    #[command(flatten)]
    pub pivot: PivotArgs,

    /// Reject records older than today's Taipei session.
    #[arg(long, default_value_t = false)]
    pub require_session_date: bool,
}

#[derive(Debug, Clone, Args)]
pub struct PivotsArgs {
    #[arg(long)]
    pub high: f64,

    #[arg(long)]
    pub low: f64,

    #[arg(long)]
    pub close: f64,

    #[command(flatten)]
    pub pivot: PivotArgs,
}

#[derive(Debug, Clone, Args)]
pub struct ClassifyArgs {
    /// Stock code to classify.
    pub id: String,
}
