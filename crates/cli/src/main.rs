// StockGrid CLI - reconcile purchase batches into a CSV stock table

mod exit_codes;
mod stock;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{EXIT_CONFIG, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_TABLE, EXIT_USAGE};
use stockgrid_recon::ReconError;

#[derive(Parser)]
#[command(name = "stockgrid")]
#[command(about = "Reconcile purchase batches against a stock table")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Increase log detail (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply a purchase batch to a stock table CSV
    #[command(after_help = "\
Examples:
  stockgrid reconcile --stock stock.csv --purchases compras.json
  stockgrid reconcile --stock stock.csv --purchases compras.json --dry-run --json
  stockgrid reconcile --stock stock.csv --purchases compras.json -o out.csv --values
  stockgrid reconcile --stock stock.csv --purchases compras.json --config recon.toml --date 2024-06-01")]
    Reconcile {
        /// Stock table CSV (header row + body rows)
        #[arg(long, short = 's')]
        stock: PathBuf,

        /// Purchase batch JSON: [[code, product, quantity, arrival], ...]
        #[arg(long, short = 'p')]
        purchases: PathBuf,

        /// Reconcile config TOML (table name, column layout, order marker)
        #[arg(long, short = 'c', env = "STOCKGRID_CONFIG")]
        config: Option<PathBuf>,

        /// Order date to stamp (YYYY-MM-DD); defaults to today (UTC)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Write the result here instead of back to --stock
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Write evaluated values instead of formula text
        #[arg(long)]
        values: bool,

        /// CSV delimiter (detected from the stock file when omitted)
        #[arg(long)]
        delimiter: Option<char>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Reconcile in memory only; do not write any file
        #[arg(long)]
        dry_run: bool,
    },

    /// Parse and validate a reconcile config
    Validate {
        /// Reconcile config TOML
        config: PathBuf,
    },

    /// Print a stock table with formulas evaluated
    Show {
        /// Stock table CSV
        #[arg(long, short = 's')]
        stock: PathBuf,

        /// Print rows as JSON objects keyed by header
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  stockgrid-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  stockgrid-engine ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
        )
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Reconcile {
            stock,
            purchases,
            config,
            date,
            output,
            values,
            delimiter,
            json,
            dry_run,
        } => stock::cmd_reconcile(stock::ReconcileArgs {
            stock,
            purchases,
            config,
            date,
            output,
            values,
            delimiter,
            json,
            dry_run,
        }),
        Commands::Validate { config } => stock::cmd_validate(config),
        Commands::Show { stock, json } => stock::cmd_show(stock, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let code = match &err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_CONFIG,
            ReconError::Io(_) => EXIT_IO,
            ReconError::TableNotFound(_)
            | ReconError::TableTooNarrow { .. }
            | ReconError::Store(_) => EXIT_TABLE,
        };
        let hint = match &err {
            ReconError::TableTooNarrow { .. } => {
                Some("check the stock CSV header row against [columns] in the config".to_string())
            }
            _ => None,
        };
        Self { code, message: err.to_string(), hint }
    }
}
