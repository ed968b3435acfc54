//! Command dispatcher that routes clap commands to their handlers.
//!
//! Handlers wire configuration, the store and the report calculators together
//! and pick between table and JSON output.

mod fx;
mod fx_impact;
mod imports;
mod portfolio;

use anyhow::{Context as _, Result};
use colored::Colorize;
use fxview::config::Config;
use fxview::db::{self, Portfolio};
use fxview::importers;
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::cli::{formatters, Commands};

/// Everything a handler needs from the command line and config file
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    pub portfolio_path: PathBuf,
    pub db_path: PathBuf,
    pub json: bool,
}

impl Context {
    pub fn load(
        config_path: Option<&Path>,
        portfolio: Option<PathBuf>,
        json: bool,
    ) -> Result<Self> {
        let config_path = match config_path {
            Some(p) => p.to_path_buf(),
            None => Config::default_path()?,
        };
        let config = Config::load(Some(&config_path))?;
        let portfolio_path = match portfolio {
            Some(p) => p,
            None => config.portfolio_path()?,
        };
        let db_path = config.database_path()?;

        Ok(Self {
            config,
            config_path,
            portfolio_path,
            db_path,
            json,
        })
    }

    /// Open the store, creating the schema on first use
    pub fn open_store(&self) -> Result<Connection> {
        db::init_database(Some(self.db_path.clone()))?;
        db::open_db(Some(self.db_path.clone()))
    }

    pub fn load_portfolio(&self) -> Result<Portfolio> {
        importers::load_portfolio(&self.portfolio_path, self.config.home_currency).context(
            format!(
                "Could not load portfolio. Create {:?} or pass --portfolio <file>",
                self.portfolio_path
            ),
        )
    }

    /// Portfolio when one is available; imports only use it for currencies
    pub fn try_load_portfolio(&self) -> Option<Portfolio> {
        if !self.portfolio_path.exists() {
            return None;
        }
        match self.load_portfolio() {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!("{:#}", e);
                None
            }
        }
    }
}

/// Route a parsed command to its handler
pub async fn dispatch_command(command: Commands, ctx: &Context) -> Result<()> {
    match command {
        Commands::Init => dispatch_init(ctx),
        Commands::Import { action } => imports::dispatch_import(action, ctx),
        Commands::Snapshot { action } => imports::dispatch_snapshot(action, ctx),
        Commands::Fx { action } => fx::dispatch_fx(action, ctx).await,
        Commands::Impact { days, at } => fx_impact::dispatch_impact(days, at.as_deref(), ctx),
        Commands::Portfolio { action } => portfolio::dispatch_portfolio(action, ctx),
        Commands::Status => dispatch_status(ctx),
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn dispatch_init(ctx: &Context) -> Result<()> {
    db::init_database(Some(ctx.db_path.clone()))?;

    let wrote_config = if ctx.config_path.exists() {
        false
    } else {
        ctx.config.save(&ctx.config_path)?;
        true
    };
    info!("Initialized store at {:?}", ctx.db_path);

    if ctx.json {
        #[derive(Serialize)]
        struct InitOutput<'a> {
            db_path: &'a Path,
            config_path: &'a Path,
            config_created: bool,
        }
        return print_json(&InitOutput {
            db_path: &ctx.db_path,
            config_path: &ctx.config_path,
            config_created: wrote_config,
        });
    }

    println!("{} Database ready at {}", "✓".green().bold(), ctx.db_path.display());
    if wrote_config {
        println!(
            "{} Wrote default config to {}",
            "✓".green().bold(),
            ctx.config_path.display()
        );
    }
    Ok(())
}

fn dispatch_status(ctx: &Context) -> Result<()> {
    let conn = ctx.open_store()?;
    let summary = db::store_summary(&conn)?;

    if ctx.json {
        #[derive(Serialize)]
        struct StatusOutput<'a> {
            db_path: &'a Path,
            portfolio_path: &'a Path,
            #[serde(flatten)]
            summary: &'a db::StoreSummary,
        }
        return print_json(&StatusOutput {
            db_path: &ctx.db_path,
            portfolio_path: &ctx.portfolio_path,
            summary: &summary,
        });
    }

    println!("{:<18} {}", "Database:".bold(), ctx.db_path.display());
    println!("{:<18} {}", "Portfolio:".bold(), ctx.portfolio_path.display());
    print!("{}", formatters::format_status(&summary));
    Ok(())
}
