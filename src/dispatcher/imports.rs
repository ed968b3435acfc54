use anyhow::{anyhow, Result};
use chrono::{Days, Local};
use colored::Colorize;
use fxview::db::{FxRateRow, ObservationSource, SnapshotRow};
use fxview::importers::{self, ImportStats, ParsedRows};
use fxview::utils::{format_amount, parse_flexible_date};
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

use super::{print_json, Context};
use crate::cli::{ImportCommands, SnapshotCommands};

#[derive(Serialize)]
struct ImportOutput {
    kind: &'static str,
    parsed: usize,
    skipped: usize,
    duplicates: usize,
    missing_tickers: Vec<String>,
    dry_run: bool,
    stored: Option<ImportStats>,
}

pub fn dispatch_import(action: ImportCommands, ctx: &Context) -> Result<()> {
    match action {
        ImportCommands::Snapshots { file, dry_run } => import_snapshots(&file, dry_run, ctx),
        ImportCommands::Yahoo { dir, days, dry_run } => import_yahoo(&dir, days, dry_run, ctx),
        ImportCommands::Fx { file, dry_run } => import_fx(&file, dry_run, ctx),
    }
}

fn import_snapshots(file: &Path, dry_run: bool, ctx: &Context) -> Result<()> {
    tracing::info!("Importing snapshots from: {:?}", file);

    let portfolio = ctx.try_load_portfolio();
    let parsed = importers::parse_snapshot_csv(
        file,
        |ticker| portfolio.as_ref().and_then(|p| p.currency_of(ticker)),
        ctx.config.home_currency,
    )
    .map_err(|e| anyhow!("Error reading import file {:?}: {}", file, e))?;

    finish_snapshot_import(
        "snapshots",
        parsed,
        Vec::new(),
        ObservationSource::Csv,
        dry_run,
        ctx,
    )
}

fn import_yahoo(dir: &Path, days: Option<u32>, dry_run: bool, ctx: &Context) -> Result<()> {
    tracing::info!("Importing Yahoo downloads from: {:?}", dir);

    let portfolio = ctx.load_portfolio()?;
    let since = match days {
        Some(d) => Some(
            Local::now()
                .date_naive()
                .checked_sub_days(Days::new(u64::from(d)))
                .ok_or_else(|| anyhow!("--days {} is out of range", d))?,
        ),
        None => None,
    };

    let pair = ctx.config.pair();
    let import = importers::import_yahoo_dir(dir, &portfolio, pair, since)?;

    if !import.fx_rates.is_empty() {
        if !ctx.json {
            println!(
                "\n{} Found {} {} rates in {}",
                "✓".green().bold(),
                import.fx_rates.len(),
                pair,
                pair.symbol()
            );
        }
        if !dry_run {
            let mut conn = ctx.open_store()?;
            let stats = importers::store_fx_rates(
                &mut conn,
                pair,
                &import.fx_rates,
                ObservationSource::YahooCsv,
            )?;
            tracing::info!("Stored {} rates: {:?}", pair, stats);
        }
    }

    let parsed = ParsedRows {
        rows: import.rows,
        skipped: import.skipped,
        duplicates: import.duplicates,
    };

    finish_snapshot_import(
        "yahoo",
        parsed,
        import.missing,
        ObservationSource::YahooCsv,
        dry_run,
        ctx,
    )
}

fn finish_snapshot_import(
    kind: &'static str,
    parsed: ParsedRows<SnapshotRow>,
    missing_tickers: Vec<String>,
    source: ObservationSource,
    dry_run: bool,
    ctx: &Context,
) -> Result<()> {
    if !ctx.json {
        println!(
            "\n{} Found {} price snapshots ({} skipped)\n",
            "✓".green().bold(),
            parsed.rows.len(),
            parsed.skipped
        );
        print_snapshot_preview(&parsed.rows);
        if !missing_tickers.is_empty() {
            println!(
                "{} No data for: {}",
                "⚠".yellow().bold(),
                missing_tickers.join(", ")
            );
        }
    }

    let stored = if dry_run || parsed.rows.is_empty() {
        None
    } else {
        let mut conn = ctx.open_store()?;
        Some(importers::store_snapshots(&mut conn, &parsed.rows, source)?)
    };

    report_outcome(
        ImportOutput {
            kind,
            parsed: parsed.rows.len(),
            skipped: parsed.skipped,
            duplicates: parsed.duplicates,
            missing_tickers,
            dry_run,
            stored,
        },
        ctx,
    )
}

fn import_fx(file: &Path, dry_run: bool, ctx: &Context) -> Result<()> {
    tracing::info!("Importing FX rates from: {:?}", file);

    let pair = ctx.config.pair();
    let parsed = importers::parse_fx_csv(file)
        .map_err(|e| anyhow!("Error reading import file {:?}: {}", file, e))?;

    if !ctx.json {
        println!(
            "\n{} Found {} {} rates ({} skipped)\n",
            "✓".green().bold(),
            parsed.rows.len(),
            pair,
            parsed.skipped
        );
        print_rate_preview(&parsed.rows);
    }

    let stored = if dry_run || parsed.rows.is_empty() {
        None
    } else {
        let mut conn = ctx.open_store()?;
        Some(importers::store_fx_rates(
            &mut conn,
            pair,
            &parsed.rows,
            ObservationSource::Csv,
        )?)
    };

    report_outcome(
        ImportOutput {
            kind: "fx",
            parsed: parsed.rows.len(),
            skipped: parsed.skipped,
            duplicates: parsed.duplicates,
            missing_tickers: Vec::new(),
            dry_run,
            stored,
        },
        ctx,
    )
}

fn report_outcome(output: ImportOutput, ctx: &Context) -> Result<()> {
    if ctx.json {
        return print_json(&output);
    }

    match output.stored {
        _ if output.dry_run => println!("\n{} Dry run - no changes saved", "ℹ".blue().bold()),
        Some(stats) => println!(
            "\n{} Imported {} new, {} updated, {} unchanged",
            "✓".green().bold(),
            stats.inserted,
            stats.updated,
            stats.unchanged
        ),
        None => println!("\n{} Nothing to import", "ℹ".blue().bold()),
    }
    Ok(())
}

fn print_snapshot_preview(rows: &[SnapshotRow]) {
    #[derive(Tabled)]
    struct SnapshotPreview {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Ticker")]
        ticker: String,
        #[tabled(rename = "Ccy")]
        currency: String,
        #[tabled(rename = "Price")]
        price: String,
    }

    let preview: Vec<SnapshotPreview> = rows
        .iter()
        .take(10)
        .map(|r| SnapshotPreview {
            date: r.date.to_string(),
            ticker: r.ticker.clone(),
            currency: r.currency.to_string(),
            price: format_amount(r.price),
        })
        .collect();

    if !preview.is_empty() {
        let table = Table::new(preview)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }
}

fn print_rate_preview(rows: &[FxRateRow]) {
    #[derive(Tabled)]
    struct RatePreview {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Rate")]
        rate: String,
    }

    let preview: Vec<RatePreview> = rows
        .iter()
        .take(10)
        .map(|r| RatePreview {
            date: r.date.to_string(),
            rate: r.rate.to_string(),
        })
        .collect();

    if !preview.is_empty() {
        let table = Table::new(preview)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
    }
}

pub fn dispatch_snapshot(action: SnapshotCommands, ctx: &Context) -> Result<()> {
    match action {
        SnapshotCommands::Record { prices, date } => {
            let date = match date.as_deref() {
                Some(d) => parse_flexible_date(d)?,
                None => Local::now().date_naive(),
            };
            let portfolio = ctx.try_load_portfolio();
            let rows = prices
                .iter()
                .map(|arg| {
                    let (ticker, price) = parse_price_arg(arg)?;
                    let currency = portfolio
                        .as_ref()
                        .and_then(|p| p.currency_of(&ticker))
                        .unwrap_or(ctx.config.home_currency);
                    Ok(SnapshotRow {
                        date,
                        ticker,
                        price,
                        currency,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let mut conn = ctx.open_store()?;
            let stats = importers::store_snapshots(&mut conn, &rows, ObservationSource::Manual)?;

            if ctx.json {
                return print_json(&stats);
            }
            println!(
                "{} Recorded {} prices for {} ({} new, {} updated)",
                "✓".green().bold(),
                stats.total(),
                date,
                stats.inserted,
                stats.updated
            );
            Ok(())
        }
    }
}

/// `VFV.TO=132.45` into ("VFV.TO", 132.45)
fn parse_price_arg(arg: &str) -> Result<(String, Decimal)> {
    let (ticker, price) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected TICKER=PRICE, got '{}'", arg))?;
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(anyhow!("Missing ticker in '{}'", arg));
    }
    let price =
        Decimal::from_str(price.trim()).map_err(|_| anyhow!("Invalid price in '{}'", arg))?;
    if price <= Decimal::ZERO {
        return Err(anyhow!("Price must be positive in '{}'", arg));
    }
    Ok((ticker, price))
}
