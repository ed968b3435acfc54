use anyhow::{Context as _, Result};
use fxview::db;
use fxview::reports::{calculate_fx_impact, Window};
use fxview::utils::parse_flexible_date;
use tracing::info;

use super::{print_json, Context};
use crate::cli::formatters;

pub fn dispatch_impact(days: Option<u32>, at: Option<&str>, ctx: &Context) -> Result<()> {
    let days = days.unwrap_or(ctx.config.default_window_days);
    let window = match at {
        Some(s) => Window::ending_on(days, parse_flexible_date(s)?),
        None => Window::trailing(days),
    };
    let pair = ctx.config.pair();
    info!("FX impact for {} over {:?}", pair, window);

    let portfolio = ctx.load_portfolio()?;
    let conn = ctx.open_store()?;
    let snapshots = db::load_snapshots(&conn, None)?;
    let rates = db::load_fx_rates(&conn, pair, None)?;

    let report = calculate_fx_impact(&portfolio.holdings(), &snapshots, &rates, pair, window)
        .context("Stored price history is inconsistent")?;

    if ctx.json {
        return print_json(&report);
    }

    if report.is_empty() {
        print!("{}", formatters::format_empty_impact(&report));
    } else {
        print!("{}", formatters::format_impact_table(&report));
    }
    Ok(())
}
