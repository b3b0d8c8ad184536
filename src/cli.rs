//! Command-line interface argument parsing.

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::Level;

/// Transaction Flagger - rule-based suspicious-activity detection
///
/// Examples:
///   transaction-flagger scan transactions.csv --amount-threshold 1000
///   transaction-flagger scan tx.csv --date-col posted --rapid-threshold 3 -o flagged.csv
///   transaction-flagger view tx.csv --config flagger.json
///   transaction-flagger init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Flag a CSV file and print the summary
    Scan {
        #[command(flatten)]
        input: InputArgs,

        /// Write the export CSV here
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Export every row instead of only flagged ones
        #[arg(long)]
        all_rows: bool,

        /// Summary format on stdout
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Open the terminal viewer on a CSV file
    View {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Write a default configuration file
    InitConfig {
        #[arg(default_value = "flagger.json", value_name = "FILE")]
        path: PathBuf,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct InputArgs {
    /// Transaction CSV file
    #[arg(value_name = "CSV")]
    pub file: PathBuf,

    /// Detection config (JSON). CLI flags below override its values.
    #[arg(short, long, value_name = "FILE", env = "FLAGGER_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, default_value = "amount", value_name = "COLUMN")]
    pub amount_col: String,

    #[arg(long, default_value = "account_id", value_name = "COLUMN")]
    pub account_col: String,

    #[arg(long, default_value = "type", value_name = "COLUMN")]
    pub type_col: String,

    /// Merchant column (optional; "unknown" when absent)
    #[arg(long, value_name = "COLUMN")]
    pub merchant_col: Option<String>,

    /// Date column (optional; time-based detectors stay off without it)
    #[arg(long, value_name = "COLUMN")]
    pub date_col: Option<String>,

    /// High transaction amount threshold (0 disables)
    #[arg(long, value_name = "AMOUNT")]
    pub amount_threshold: Option<f64>,

    /// Rapid transactions per hour threshold (0 disables)
    #[arg(long, value_name = "COUNT")]
    pub rapid_threshold: Option<u32>,

    /// High-risk merchant (repeatable)
    #[arg(long = "risky-merchant", value_name = "NAME")]
    pub risky_merchants: Vec<String>,

    /// Start of the date window (date or date-time)
    #[arg(long, value_name = "DATE")]
    pub start: Option<String>,

    /// End of the date window (date or date-time)
    #[arg(long, value_name = "DATE")]
    pub end: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("--verbose and --quiet cannot be used together".to_string());
        }
        Ok(())
    }

    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::ERROR
        } else {
            Level::INFO
        }
    }
}
