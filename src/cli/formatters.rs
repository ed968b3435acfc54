//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use chrono::NaiveDate;
use colored::{ColoredString, Colorize};
use fxview::db::{FxPair, FxRateRow, StoreSummary};
use fxview::reports::{FxImpactReport, PortfolioValuation, SeriesMode};
use fxview::utils::{format_amount, format_money, format_percent, format_rate, format_signed};
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

const NA: &str = "N/A";

fn colored_signed(value: Decimal, text: String) -> ColoredString {
    if value >= Decimal::ZERO {
        text.green()
    } else {
        text.red()
    }
}

/// Format an FX impact report for terminal table output
pub fn format_impact_table(report: &FxImpactReport) -> String {
    let mut output = String::new();
    let home = report.home_currency;

    output.push_str(&format!(
        "\n{} FX impact in {} ({})\n",
        "💱".cyan().bold(),
        home,
        report.pair
    ));
    if let (Some(start), Some(end)) = (report.window_start, report.window_end) {
        output.push_str(&format!("Window: {} to {}\n", start, end));
    }
    match (report.day_zero, report.day_zero_rate) {
        (Some(day), Some(rate)) => output.push_str(&format!(
            "Day 0:  {} at {} {} per {}\n\n",
            day,
            format_rate(rate),
            home,
            report.pair.base
        )),
        (Some(day), None) => output.push_str(&format!("Day 0:  {}\n\n", day)),
        _ => output.push('\n'),
    }

    #[derive(Tabled)]
    struct PointRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "FX Rate")]
        rate: String,
        #[tabled(rename = "Fixed FX")]
        fixed: String,
        #[tabled(rename = "Actual FX")]
        actual: String,
        #[tabled(rename = "Currency Effect")]
        effect: String,
    }

    let rows: Vec<PointRow> = report
        .points
        .iter()
        .map(|p| PointRow {
            date: p.date.to_string(),
            rate: p.fx_rate.map(format_rate).unwrap_or_else(|| NA.to_string()),
            fixed: p
                .fixed_fx_total
                .map(format_amount)
                .unwrap_or_else(|| NA.to_string()),
            actual: p
                .actual_fx_total
                .map(format_amount)
                .unwrap_or_else(|| NA.to_string()),
            effect: p
                .currency_effect()
                .map(|e| colored_signed(e, format_signed(e)).to_string())
                .unwrap_or_else(|| NA.to_string()),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());

    output.push_str(&format!("\n\n{} Summary", "━".repeat(60).bright_black()));
    if let Some(latest) = report.latest() {
        if let Some(actual) = latest.actual_fx_total {
            output.push_str(&format!(
                "\n{:<24} {}",
                "Value (actual FX):".bold(),
                format_money(actual, home)
            ));
        }
        if let Some(fixed) = latest.fixed_fx_total {
            output.push_str(&format!(
                "\n{:<24} {}",
                "Value (day-0 FX):".bold(),
                format_money(fixed, home)
            ));
        }
    }
    if let Some(pct) = report.market_return_pct() {
        output.push_str(&format!(
            "\n{:<24} {}",
            "Market return:".bold(),
            colored_signed(pct, format_percent(pct))
        ));
    }
    if let Some(pct) = report.actual_return_pct() {
        output.push_str(&format!(
            "\n{:<24} {}",
            "Return incl. FX:".bold(),
            colored_signed(pct, format_percent(pct))
        ));
    }
    if let Some(effect) = report.currency_effect() {
        output.push_str(&format!(
            "\n{:<24} {} {}",
            "Currency effect:".bold(),
            home,
            colored_signed(effect, format_signed(effect))
        ));
    }
    if report.mode == SeriesMode::ActualOnly {
        output.push_str(&format!(
            "\n{} No FX rates in window: values shown without conversion",
            "⚠".yellow().bold()
        ));
    }
    output.push('\n');

    output.push_str(&format_notices(report));
    output
}

/// Format the message shown when a report has no points
pub fn format_empty_impact(report: &FxImpactReport) -> String {
    let mut output = format!(
        "{} No data to chart\nImport snapshots first using: {} import snapshots <file>\n",
        "ℹ".blue().bold(),
        "fxview".bold()
    );
    output.push_str(&format_notices(report));
    output
}

fn format_notices(report: &FxImpactReport) -> String {
    let mut output = String::new();
    for notice in &report.notices {
        output.push_str(&format!("{} {}\n", "⚠".yellow(), notice));
    }
    output
}

/// Format a portfolio valuation for terminal table output
pub fn format_valuation_table(valuation: &PortfolioValuation) -> String {
    let home = valuation.home_currency;
    let mut output = format!("\n{} Portfolio in {}\n\n", "📊".cyan().bold(), home);

    #[derive(Tabled)]
    struct PositionRow {
        #[tabled(rename = "Ticker")]
        ticker: String,
        #[tabled(rename = "Ccy")]
        currency: String,
        #[tabled(rename = "Shares")]
        shares: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Cost")]
        cost: String,
        #[tabled(rename = "Gain")]
        gain: String,
        #[tabled(rename = "Gain %")]
        gain_pct: String,
        #[tabled(rename = "Alloc %")]
        allocation: String,
    }

    let rows: Vec<PositionRow> = valuation
        .positions
        .iter()
        .map(|p| PositionRow {
            ticker: p.ticker.clone(),
            currency: p.currency.to_string(),
            shares: p.shares.normalize().to_string(),
            price: format_amount(p.price),
            value: format_amount(p.market_value),
            cost: format_amount(p.cost_total),
            gain: colored_signed(p.gain, format_signed(p.gain)).to_string(),
            gain_pct: p
                .gain_pct
                .map(|pct| colored_signed(pct, format_percent(pct)).to_string())
                .unwrap_or_else(|| NA.to_string()),
            allocation: format!("{:.2}%", p.allocation_pct.round_dp(2)),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(2..), Alignment::right());
    output.push_str(&table.to_string());

    output.push_str(&format!("\n\n{} Summary", "━".repeat(60).bright_black()));
    output.push_str(&format!(
        "\n{:<20} {}",
        "Total Cost:".bold(),
        format_money(valuation.total_cost, home)
    ));
    output.push_str(&format!(
        "\n{:<20} {}",
        "Total Value:".bold(),
        format_money(valuation.total_value, home)
    ));
    output.push_str(&format!(
        "\n{:<20} {}",
        "Total Gain:".bold(),
        colored_signed(valuation.total_gain, format_signed(valuation.total_gain))
    ));
    if let Some(pct) = valuation.total_gain_pct {
        output.push_str(&format!(
            "\n{:<20} {}",
            "Total Return:".bold(),
            colored_signed(pct, format_percent(pct))
        ));
    }
    if let Some(rate) = valuation.fx_rate {
        output.push_str(&format!("\n{:<20} {}", "FX Rate:".bold(), format_rate(rate)));
    }
    output.push('\n');

    if !valuation.excluded.is_empty() {
        output.push_str(&format!(
            "{} Not valued (no recent price or FX rate): {}\n",
            "⚠".yellow(),
            valuation.excluded.join(", ")
        ));
    }
    output
}

/// Format empty portfolio message
pub fn format_empty_portfolio() -> String {
    format!(
        "{} No priced positions found\nRecord prices first using: {} {}\n",
        "ℹ".blue().bold(),
        "fxview".bold(),
        "snapshot record TICKER=PRICE"
    )
}

/// Format stored rates, newest first
pub fn format_fx_rates_table(pair: FxPair, rates: &[FxRateRow]) -> String {
    if rates.is_empty() {
        return format!(
            "{} No {} rates stored\nFetch one using: {} fx update\n",
            "ℹ".blue().bold(),
            pair,
            "fxview".bold()
        );
    }

    #[derive(Tabled)]
    struct RateRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Rate")]
        rate: String,
    }

    let rows: Vec<RateRow> = rates
        .iter()
        .rev()
        .map(|r| RateRow {
            date: r.date.to_string(),
            rate: r.rate.to_string(),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    format!("\n{} {}\n\n{}\n", "💱".cyan().bold(), pair, table)
}

fn date_range(first: Option<NaiveDate>, last: Option<NaiveDate>) -> String {
    match (first, last) {
        (Some(f), Some(l)) => format!("{} to {}", f, l),
        _ => "-".to_string(),
    }
}

/// Format row counts and date ranges of the store
pub fn format_status(summary: &StoreSummary) -> String {
    format!(
        "{:<18} {} rows, {} tickers, {}\n{:<18} {} rows, {}\n",
        "Price snapshots:".bold(),
        summary.snapshot_rows,
        summary.snapshot_tickers,
        date_range(summary.first_snapshot, summary.last_snapshot),
        "FX rates:".bold(),
        summary.fx_rows,
        date_range(summary.first_fx, summary.last_fx),
    )
}
