use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "fxview")]
#[command(
    version,
    about = "Multi-currency portfolio tracker that separates market return from currency return"
)]
#[command(
    long_about = "Track holdings across accounts in several currencies, keep a daily price and FX history, and see how much of each move came from the market and how much from the exchange rate."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Config file (default: ~/.fxview/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Portfolio file, overriding the config
    #[arg(long, global = true)]
    pub portfolio: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the database and a default config file
    Init,

    /// Import price snapshots or FX rates from files
    Import {
        #[command(subcommand)]
        action: ImportCommands,
    },

    /// Record price snapshots by hand
    Snapshot {
        #[command(subcommand)]
        action: SnapshotCommands,
    },

    /// Exchange rate management
    Fx {
        #[command(subcommand)]
        action: FxCommands,
    },

    /// Split recent performance into market and currency effects
    Impact {
        /// Trailing window in calendar days (default from config)
        #[arg(short, long)]
        days: Option<u32>,

        /// Window end date (YYYY-MM-DD, YYYY-MM or YYYY); defaults to the latest snapshot
        #[arg(long)]
        at: Option<String>,
    },

    /// Portfolio viewing
    Portfolio {
        #[command(subcommand)]
        action: PortfolioCommands,
    },

    /// Show what the store holds
    Status,
}

#[derive(Subcommand)]
pub enum ImportCommands {
    /// Snapshot log CSV (date,ticker,price[,currency,...])
    Snapshots {
        file: PathBuf,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Directory of Yahoo Finance history downloads, one TICKER.csv per holding
    Yahoo {
        dir: PathBuf,

        /// Only keep the last N calendar days
        #[arg(long)]
        days: Option<u32>,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,
    },

    /// FX rate history (date,rate or a Yahoo download of the pair)
    Fx {
        file: PathBuf,

        /// Preview only, don't save to database
        #[arg(short, long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum SnapshotCommands {
    /// Record TICKER=PRICE pairs for one day
    Record {
        /// e.g. VFV.TO=132.45 VOO=512.10
        #[arg(required = true)]
        prices: Vec<String>,

        /// Snapshot date (default: today)
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum FxCommands {
    /// Fetch today's rate and store it
    Update,

    /// Show the most recent stored rates
    Show {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Subcommand)]
pub enum PortfolioCommands {
    /// Current value of every holding in the home currency
    Show,
}
