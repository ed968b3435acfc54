use anyhow::Result;
use colored::Colorize;
use fxview::db::{self, ObservationSource, UpsertOutcome};
use fxview::pricing::{self, RateFetcher};
use fxview::utils::format_rate;
use serde::Serialize;

use super::{print_json, Context};
use crate::cli::{formatters, FxCommands};

pub async fn dispatch_fx(action: FxCommands, ctx: &Context) -> Result<()> {
    match action {
        FxCommands::Update => dispatch_fx_update(ctx).await,
        FxCommands::Show { limit } => dispatch_fx_show(limit, ctx),
    }
}

async fn dispatch_fx_update(ctx: &Context) -> Result<()> {
    let pair = ctx.config.pair();
    let fetcher = RateFetcher::new(
        pricing::default_cache_path()?,
        ctx.config.fx_cache_max_age_hours,
    );

    let (row, rates) = pricing::fetch_pair_rate(&fetcher, pair).await?;

    let conn = ctx.open_store()?;
    let outcome = db::upsert_fx_rate(&conn, pair, &row, ObservationSource::ErApi)?;

    if ctx.json {
        #[derive(Serialize)]
        struct UpdateOutput {
            pair: String,
            date: chrono::NaiveDate,
            rate: rust_decimal::Decimal,
            from_cache: bool,
            stale: bool,
            stored: bool,
        }
        return print_json(&UpdateOutput {
            pair: pair.to_string(),
            date: row.date,
            rate: row.rate,
            from_cache: rates.from_cache,
            stale: rates.stale,
            stored: outcome != UpsertOutcome::Unchanged,
        });
    }

    let source = match (rates.from_cache, rates.stale) {
        (_, true) => " (stale cache)".yellow().to_string(),
        (true, false) => " (cached)".bright_black().to_string(),
        _ => String::new(),
    };
    println!(
        "{} {} on {}: {}{}",
        "✓".green().bold(),
        pair,
        row.date,
        format_rate(row.rate),
        source
    );
    Ok(())
}

fn dispatch_fx_show(limit: usize, ctx: &Context) -> Result<()> {
    let pair = ctx.config.pair();
    let conn = ctx.open_store()?;
    let rates = db::load_fx_rates(&conn, pair, None)?;
    let recent = &rates[rates.len().saturating_sub(limit)..];

    if ctx.json {
        return print_json(&recent);
    }
    print!("{}", formatters::format_fx_rates_table(pair, recent));
    Ok(())
}
