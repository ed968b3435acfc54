//! Utility functions for formatting and date parsing
//!
//! Money is displayed with `,` as thousands separator and `.` as decimal
//! separator, rounded to two places.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::db::Currency;
use crate::error::PortfolioError;

/// Format a plain amount with thousands separators: "1,234.56"
///
/// # Examples
/// ```
/// use fxview::utils::format_amount;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_amount(dec!(1234.567)), "1,234.57");
/// assert_eq!(format_amount(dec!(-500)), "-500.00");
/// ```
pub fn format_amount(value: Decimal) -> String {
    let is_negative = value < Decimal::ZERO;
    let formatted = format!("{:.2}", value.abs().round_dp(2));
    let (integer_part, decimal_part) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "00"));

    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    format!("{}{}.{}", sign, with_separators, decimal_part)
}

/// Format an amount with its currency code: "CAD 1,234.56"
pub fn format_money(value: Decimal, currency: Currency) -> String {
    format!("{} {}", currency, format_amount(value))
}

/// Signed amount, for gains and currency effects: "+1,234.56"
pub fn format_signed(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("+{}", format_amount(value))
    } else {
        format_amount(value)
    }
}

/// Signed percentage with two decimals: "+3.25%"
pub fn format_percent(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    if rounded > Decimal::ZERO {
        format!("+{:.2}%", rounded)
    } else {
        format!("{:.2}%", rounded)
    }
}

/// Exchange rates keep four decimals: "1.3725"
pub fn format_rate(value: Decimal) -> String {
    format!("{:.4}", value.round_dp(4))
}

/// Parse a user-supplied date.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM` (last day of month) and `YYYY`
/// (December 31).
pub fn parse_flexible_date(s: &str) -> Result<NaiveDate, PortfolioError> {
    let s = s.trim();

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(first) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
        let next_month = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
        };
        if let Some(last) = next_month.and_then(|d| d.pred_opt()) {
            return Ok(last);
        }
    }

    if let Ok(year) = s.parse::<i32>() {
        if (1900..=2100).contains(&year) {
            if let Some(date) = NaiveDate::from_ymd_opt(year, 12, 31) {
                return Ok(date);
            }
        }
    }

    Err(PortfolioError::ParseError(format!(
        "invalid date '{}'. Use YYYY-MM-DD, YYYY-MM, or YYYY",
        s
    )))
}

/// Calendar date of a stored observation.
///
/// Snapshot logs carry either a plain date or a full ISO-8601 timestamp such
/// as `2024-06-03T20:00:00+00:00`; only the date part matters.
pub fn parse_observation_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }

    let (date_part, rest) = (s.get(..10)?, s.get(10..)?);
    if !rest.starts_with('T') && !rest.starts_with(' ') {
        return None;
    }
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}
