use anyhow::Result;
use chrono::Local;
use fxview::db;
use fxview::reports::value_portfolio;

use super::{print_json, Context};
use crate::cli::{formatters, PortfolioCommands};

pub fn dispatch_portfolio(action: PortfolioCommands, ctx: &Context) -> Result<()> {
    match action {
        PortfolioCommands::Show => dispatch_portfolio_show(ctx),
    }
}

fn dispatch_portfolio_show(ctx: &Context) -> Result<()> {
    tracing::info!("Generating portfolio valuation");

    let portfolio = ctx.load_portfolio()?;
    let pair = ctx.config.pair();
    let conn = ctx.open_store()?;

    let today = Local::now().date_naive();
    let prices = db::latest_prices(
        &conn,
        &portfolio.tickers(),
        today,
        ctx.config.price_max_age_days(),
    )?;
    let fx_rate = db::latest_fx_rate(&conn, pair)?.map(|r| r.rate);

    let valuation = value_portfolio(&portfolio.holdings(), &prices, pair, fx_rate);

    if ctx.json {
        return print_json(&valuation);
    }

    if valuation.is_empty() {
        print!("{}", formatters::format_empty_portfolio());
    } else {
        print!("{}", formatters::format_valuation_table(&valuation));
    }
    Ok(())
}
