//! FX impact report
//!
//! Splits the movement of a multi-currency portfolio into a market part and a
//! currency part. Two totals are produced for every calendar day of a trailing
//! window, both using that day's prices:
//!
//! - `fixed_fx_total`: foreign legs converted at the day-0 rate
//! - `actual_fx_total`: foreign legs converted at that day's rate
//!
//! Because both totals share the same prices, any gap between them on day `t`
//! comes only from the rate moving between day 0 and day `t`.
//!
//! The calculation is a pure function of its inputs. Callers load snapshots and
//! rates from the store once and hand them in; nothing here touches I/O.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

use crate::db::{Currency, FxPair, FxRateRow, Holding, SnapshotRow};
use crate::error::CalculationError;

/// Trailing window of calendar days.
///
/// Without an anchor the window ends on the latest snapshot date, not on
/// today, so stale data still produces a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub days: u32,
    pub anchor: Option<NaiveDate>,
}

impl Window {
    pub fn trailing(days: u32) -> Self {
        Self { days, anchor: None }
    }

    pub fn ending_on(days: u32, anchor: NaiveDate) -> Self {
        Self {
            days,
            anchor: Some(anchor),
        }
    }
}

/// Whether the report carries both series or only the actual one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMode {
    Dual,
    /// No usable FX rate in the window: every leg converted at 1
    ActualOnly,
}

/// Recoverable conditions met while building the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    NoDataAvailable,
    NoFxDataAvailable,
    IncompleteHolding {
        ticker: String,
    },
    InvalidObservation {
        date: NaiveDate,
        /// None for FX rate rows
        ticker: Option<String>,
        value: Decimal,
    },
    WindowOutOfRange {
        days: u32,
        anchor: Option<NaiveDate>,
        earliest: NaiveDate,
    },
    UnsupportedCurrency {
        ticker: String,
        currency: Currency,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoDataAvailable => write!(f, "no price snapshots available"),
            Notice::NoFxDataAvailable => {
                write!(f, "no FX rates in window; showing actual values only")
            }
            Notice::IncompleteHolding { ticker } => {
                write!(f, "{} has no price data and is excluded", ticker)
            }
            Notice::InvalidObservation {
                date,
                ticker: Some(ticker),
                value,
            } => write!(f, "dropped invalid price {} for {} on {}", value, ticker, date),
            Notice::InvalidObservation {
                date,
                ticker: None,
                value,
            } => write!(f, "dropped invalid FX rate {} on {}", value, date),
            Notice::WindowOutOfRange {
                days,
                anchor,
                earliest,
            } => match anchor {
                Some(a) => write!(
                    f,
                    "{}-day window ending {} is outside data starting {}",
                    days, a, earliest
                ),
                None => write!(f, "{}-day window is empty", days),
            },
            Notice::UnsupportedCurrency { ticker, currency } => write!(
                f,
                "{} is quoted in {} which this report cannot convert",
                ticker, currency
            ),
        }
    }
}

/// One ticker's contribution on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegValue {
    pub ticker: String,
    pub currency: Currency,
    pub shares: Decimal,
    pub price: Decimal,
    pub fixed_fx_value: Option<Decimal>,
    pub actual_fx_value: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FxImpactPoint {
    pub date: NaiveDate,
    /// Forward-filled rate used for the actual series (Dual mode only)
    pub fx_rate: Option<Decimal>,
    pub fixed_fx_total: Option<Decimal>,
    pub actual_fx_total: Option<Decimal>,
    pub legs: Vec<LegValue>,
}

impl FxImpactPoint {
    /// Value gained or lost purely from the rate moving since day 0
    pub fn currency_effect(&self) -> Option<Decimal> {
        Some(self.actual_fx_total? - self.fixed_fx_total?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FxImpactReport {
    pub home_currency: Currency,
    pub pair: FxPair,
    pub mode: SeriesMode,
    pub window_start: Option<NaiveDate>,
    pub window_end: Option<NaiveDate>,
    pub day_zero: Option<NaiveDate>,
    pub day_zero_rate: Option<Decimal>,
    pub points: Vec<FxImpactPoint>,
    /// Held tickers with no price on any day of the window
    pub missing_tickers: Vec<String>,
    pub notices: Vec<Notice>,
}

impl FxImpactReport {
    fn empty(pair: FxPair, missing_tickers: Vec<String>, notices: Vec<Notice>) -> Self {
        Self {
            home_currency: pair.quote,
            pair,
            mode: SeriesMode::ActualOnly,
            window_start: None,
            window_end: None,
            day_zero: None,
            day_zero_rate: None,
            points: Vec::new(),
            missing_tickers,
            notices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&FxImpactPoint> {
        self.points.last()
    }

    pub fn day_zero_point(&self) -> Option<&FxImpactPoint> {
        let day_zero = self.day_zero?;
        self.points.iter().find(|p| p.date == day_zero)
    }

    /// Currency effect on the last day of the window
    pub fn currency_effect(&self) -> Option<Decimal> {
        self.latest()?.currency_effect()
    }

    /// Return from day 0 to the last day with the rate held fixed (percent)
    pub fn market_return_pct(&self) -> Option<Decimal> {
        pct_change(
            self.day_zero_point()?.fixed_fx_total?,
            self.latest()?.fixed_fx_total?,
        )
    }

    /// Return from day 0 to the last day at actual rates (percent)
    pub fn actual_return_pct(&self) -> Option<Decimal> {
        pct_change(
            self.day_zero_point()?.actual_fx_total?,
            self.latest()?.actual_fx_total?,
        )
    }
}

fn pct_change(from: Decimal, to: Decimal) -> Option<Decimal> {
    if from <= Decimal::ZERO {
        return None;
    }
    Some((to - from) / from * Decimal::from(100))
}

#[derive(Debug, Clone, Copy)]
struct Leg {
    shares: Decimal,
    currency: Currency,
}

/// Compute the fixed-FX and actual-FX series for a trailing window.
///
/// `fx_rates` must all belong to `pair`; `pair.quote` is the home currency.
/// Exact duplicate observations collapse into one; two different values for
/// the same key are a provider bug and fail the call.
pub fn calculate_fx_impact(
    holdings: &[Holding],
    snapshots: &[SnapshotRow],
    fx_rates: &[FxRateRow],
    pair: FxPair,
    window: Window,
) -> Result<FxImpactReport, CalculationError> {
    let home = pair.quote;
    let mut notices = Vec::new();

    let legs = aggregate_legs(holdings, pair, &mut notices);
    let prices = collect_prices(snapshots, &legs, &mut notices)?;
    let rates = collect_rates(fx_rates, &mut notices)?;

    let all_tickers: Vec<String> = legs.keys().cloned().collect();

    let (earliest, latest) = match (
        prices.values().filter_map(|s| s.keys().next()).min(),
        prices.values().filter_map(|s| s.keys().next_back()).max(),
    ) {
        (Some(e), Some(l)) => (*e, *l),
        _ => {
            debug!("No snapshot rows for any held ticker");
            notices.push(Notice::NoDataAvailable);
            return Ok(FxImpactReport::empty(pair, all_tickers, notices));
        }
    };

    let out_of_range = Notice::WindowOutOfRange {
        days: window.days,
        anchor: window.anchor,
        earliest,
    };
    let anchor = match window.anchor {
        _ if window.days == 0 => None,
        Some(a) if a < earliest => None,
        Some(a) => Some(a.min(latest)),
        None => Some(latest),
    };
    let Some(end) = anchor else {
        notices.push(out_of_range);
        return Ok(FxImpactReport::empty(pair, Vec::new(), notices));
    };
    // Days before the first snapshot can never be priced
    let start = end
        .checked_sub_days(Days::new(u64::from(window.days) - 1))
        .map_or(earliest, |start| start.max(earliest));

    let calendar: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();
    debug!("FX impact window {} to {} ({} days)", start, end, calendar.len());

    let mut filled: BTreeMap<&str, (Leg, Vec<Option<Decimal>>)> = BTreeMap::new();
    let mut missing_tickers = Vec::new();
    for (ticker, leg) in &legs {
        let series = prices
            .get(ticker.as_str())
            .map(|s| forward_fill(s, start, end))
            .unwrap_or_default();
        if series.iter().any(Option::is_some) {
            filled.insert(ticker.as_str(), (*leg, series));
        } else {
            missing_tickers.push(ticker.clone());
            notices.push(Notice::IncompleteHolding {
                ticker: ticker.clone(),
            });
        }
    }

    // Home-only portfolios need no rate, so both series stay available
    let needs_fx = filled.values().any(|(leg, _)| leg.currency != home);
    let fx_filled = forward_fill(&rates, start, end);
    let mode = if !needs_fx || fx_filled.iter().any(Option::is_some) {
        SeriesMode::Dual
    } else {
        notices.push(Notice::NoFxDataAvailable);
        SeriesMode::ActualOnly
    };
    let rate_ready =
        |i: usize| !needs_fx || mode == SeriesMode::ActualOnly || fx_filled[i].is_some();

    let day_zero_idx = (0..calendar.len())
        .find(|&i| filled.values().all(|(_, series)| series[i].is_some()) && rate_ready(i));
    let day_zero_rate = match mode {
        SeriesMode::Dual => day_zero_idx.and_then(|i| fx_filled[i]),
        SeriesMode::ActualOnly => None,
    };

    let mut points = Vec::with_capacity(calendar.len());
    for (i, date) in calendar.iter().enumerate() {
        let fx_today = match mode {
            SeriesMode::Dual => fx_filled[i],
            SeriesMode::ActualOnly => None,
        };

        let mut day_legs = Vec::new();
        for (ticker, (leg, series)) in &filled {
            let Some(price) = series[i] else { continue };
            let value = leg.shares * price;
            let (fixed, actual) = match mode {
                _ if leg.currency == home => (
                    (mode == SeriesMode::Dual).then_some(value),
                    Some(value),
                ),
                SeriesMode::Dual => (
                    day_zero_rate.map(|r| value * r),
                    fx_today.map(|r| value * r),
                ),
                SeriesMode::ActualOnly => (None, Some(value)),
            };
            day_legs.push(LegValue {
                ticker: ticker.to_string(),
                currency: leg.currency,
                shares: leg.shares,
                price,
                fixed_fx_value: fixed,
                actual_fx_value: actual,
            });
        }

        // Every held ticker is still unfilled on this day
        if day_legs.is_empty() {
            continue;
        }

        let fixed_fx_total = match mode {
            SeriesMode::Dual => day_legs.iter().map(|l| l.fixed_fx_value).sum(),
            SeriesMode::ActualOnly => None,
        };
        let actual_fx_total = day_legs.iter().map(|l| l.actual_fx_value).sum();

        points.push(FxImpactPoint {
            date: *date,
            fx_rate: fx_today,
            fixed_fx_total,
            actual_fx_total,
            legs: day_legs,
        });
    }

    Ok(FxImpactReport {
        home_currency: home,
        pair,
        mode,
        window_start: Some(start),
        window_end: Some(end),
        day_zero: day_zero_idx.map(|i| calendar[i]),
        day_zero_rate,
        points,
        missing_tickers,
        notices,
    })
}

/// Sum shares per ticker across accounts, dropping legs we cannot convert
fn aggregate_legs(
    holdings: &[Holding],
    pair: FxPair,
    notices: &mut Vec<Notice>,
) -> BTreeMap<String, Leg> {
    let mut legs: BTreeMap<String, Leg> = BTreeMap::new();

    for holding in holdings {
        if holding.currency != pair.quote && holding.currency != pair.base {
            let notice = Notice::UnsupportedCurrency {
                ticker: holding.ticker.clone(),
                currency: holding.currency,
            };
            if !notices.contains(&notice) {
                warn!("{}", notice);
                notices.push(notice);
            }
            continue;
        }

        match legs.entry(holding.ticker.clone()) {
            Entry::Vacant(e) => {
                e.insert(Leg {
                    shares: holding.shares,
                    currency: holding.currency,
                });
            }
            Entry::Occupied(mut e) => {
                let leg = e.get_mut();
                if leg.currency != holding.currency {
                    warn!(
                        "{} held in both {} and {}; using {}",
                        holding.ticker, leg.currency, holding.currency, leg.currency
                    );
                }
                leg.shares += holding.shares;
            }
        }
    }

    legs
}

fn collect_prices<'a>(
    snapshots: &'a [SnapshotRow],
    legs: &BTreeMap<String, Leg>,
    notices: &mut Vec<Notice>,
) -> Result<BTreeMap<&'a str, BTreeMap<NaiveDate, Decimal>>, CalculationError> {
    let mut prices: BTreeMap<&str, BTreeMap<NaiveDate, Decimal>> = BTreeMap::new();

    for row in snapshots {
        if !legs.contains_key(&row.ticker) {
            continue;
        }
        if row.price <= Decimal::ZERO {
            warn!("Dropping price {} for {} on {}", row.price, row.ticker, row.date);
            notices.push(Notice::InvalidObservation {
                date: row.date,
                ticker: Some(row.ticker.clone()),
                value: row.price,
            });
            continue;
        }

        let series = prices.entry(row.ticker.as_str()).or_default();
        match series.entry(row.date) {
            Entry::Vacant(e) => {
                e.insert(row.price);
            }
            Entry::Occupied(e) if *e.get() == row.price => {}
            Entry::Occupied(e) => {
                return Err(CalculationError::ConflictingSnapshot {
                    date: row.date,
                    ticker: row.ticker.clone(),
                    first: *e.get(),
                    second: row.price,
                });
            }
        }
    }

    Ok(prices)
}

fn collect_rates(
    fx_rates: &[FxRateRow],
    notices: &mut Vec<Notice>,
) -> Result<BTreeMap<NaiveDate, Decimal>, CalculationError> {
    let mut rates = BTreeMap::new();

    for row in fx_rates {
        if row.rate <= Decimal::ZERO {
            warn!("Dropping FX rate {} on {}", row.rate, row.date);
            notices.push(Notice::InvalidObservation {
                date: row.date,
                ticker: None,
                value: row.rate,
            });
            continue;
        }

        match rates.entry(row.date) {
            Entry::Vacant(e) => {
                e.insert(row.rate);
            }
            Entry::Occupied(e) if *e.get() == row.rate => {}
            Entry::Occupied(e) => {
                return Err(CalculationError::ConflictingFxRate {
                    date: row.date,
                    first: *e.get(),
                    second: row.rate,
                });
            }
        }
    }

    Ok(rates)
}

/// One value per calendar day in `start..=end`, carrying the last observation
/// forward. The last observation before `start` seeds the first day; days
/// before any observation stay `None`.
pub(crate) fn forward_fill(
    series: &BTreeMap<NaiveDate, Decimal>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<Option<Decimal>> {
    let mut last = series.range(..start).next_back().map(|(_, v)| *v);
    let mut observed = series.range(start..=end).peekable();

    start
        .iter_days()
        .take_while(|d| *d <= end)
        .map(|day| {
            while let Some((d, v)) = observed.peek() {
                if **d > day {
                    break;
                }
                last = Some(**v);
                observed.next();
            }
            last
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn usd_cad() -> FxPair {
        FxPair::new(Currency::Usd, Currency::Cad)
    }

    fn holding(ticker: &str, shares: Decimal, currency: Currency) -> Holding {
        Holding {
            ticker: ticker.to_string(),
            shares,
            cost_basis: dec!(1),
            currency,
            account: "main".to_string(),
        }
    }

    fn price(day: u32, ticker: &str, price: Decimal) -> SnapshotRow {
        SnapshotRow {
            date: d(day),
            ticker: ticker.to_string(),
            price,
            currency: Currency::Usd,
        }
    }

    fn rate(day: u32, rate: Decimal) -> FxRateRow {
        FxRateRow { date: d(day), rate }
    }

    #[test]
    fn test_forward_fill_seeds_from_before_window() {
        let series: BTreeMap<NaiveDate, Decimal> =
            [(d(1), dec!(1)), (d(4), dec!(4))].into_iter().collect();

        let filled = forward_fill(&series, d(3), d(6));
        assert_eq!(
            filled,
            vec![Some(dec!(1)), Some(dec!(4)), Some(dec!(4)), Some(dec!(4))]
        );
    }

    #[test]
    fn test_forward_fill_leaves_prefix_empty() {
        let series: BTreeMap<NaiveDate, Decimal> = [(d(3), dec!(3))].into_iter().collect();
        let filled = forward_fill(&series, d(1), d(4));
        assert_eq!(filled, vec![None, None, Some(dec!(3)), Some(dec!(3))]);
    }

    #[test]
    fn test_window_anchors_on_latest_snapshot() {
        let holdings = vec![holding("VOO", dec!(1), Currency::Usd)];
        let snapshots = vec![price(1, "VOO", dec!(100)), price(10, "VOO", dec!(110))];
        let rates = vec![rate(1, dec!(1.35))];

        let report =
            calculate_fx_impact(&holdings, &snapshots, &rates, usd_cad(), Window::trailing(3))
                .unwrap();

        assert_eq!(report.window_start, Some(d(8)));
        assert_eq!(report.window_end, Some(d(10)));
        let dates: Vec<_> = report.points.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d(8), d(9), d(10)]);
        // Day 8 and 9 carry the day-1 price forward
        assert_eq!(report.points[0].legs[0].price, dec!(100));
    }

    #[test]
    fn test_explicit_anchor_before_data_is_out_of_range() {
        let holdings = vec![holding("VOO", dec!(1), Currency::Usd)];
        let snapshots = vec![price(5, "VOO", dec!(100))];

        let report = calculate_fx_impact(
            &holdings,
            &snapshots,
            &[],
            usd_cad(),
            Window::ending_on(30, d(2)),
        )
        .unwrap();

        assert!(report.is_empty());
        assert_eq!(
            report.notices,
            vec![Notice::WindowOutOfRange {
                days: 30,
                anchor: Some(d(2)),
                earliest: d(5),
            }]
        );
    }

    #[test]
    fn test_oversized_window_starts_at_first_snapshot() {
        let holdings = vec![holding("VOO", dec!(1), Currency::Usd)];
        let snapshots = vec![price(5, "VOO", dec!(100)), price(7, "VOO", dec!(104))];
        let rates = vec![rate(1, dec!(1.30))];

        let report = calculate_fx_impact(
            &holdings,
            &snapshots,
            &rates,
            usd_cad(),
            Window::trailing(u32::MAX),
        )
        .unwrap();

        assert!(report.notices.is_empty());
        assert_eq!(report.window_start, Some(d(5)));
        assert_eq!(report.window_end, Some(d(7)));
        assert_eq!(report.points.len(), 3);
    }

    #[test]
    fn test_home_only_portfolio_keeps_both_series_without_rates() {
        let holdings = vec![holding("XEQT.TO", dec!(2), Currency::Cad)];
        let snapshots = vec![
            SnapshotRow {
                currency: Currency::Cad,
                ..price(1, "XEQT.TO", dec!(30))
            },
            SnapshotRow {
                currency: Currency::Cad,
                ..price(2, "XEQT.TO", dec!(31))
            },
        ];

        let report =
            calculate_fx_impact(&holdings, &snapshots, &[], usd_cad(), Window::trailing(2))
                .unwrap();

        assert_eq!(report.mode, SeriesMode::Dual);
        assert!(!report.notices.contains(&Notice::NoFxDataAvailable));
        assert_eq!(report.day_zero, Some(d(1)));
        for point in &report.points {
            assert!(point.fixed_fx_total.is_some());
            assert_eq!(point.fixed_fx_total, point.actual_fx_total);
        }
        assert_eq!(report.points[1].actual_fx_total, Some(dec!(62)));
    }

    #[test]
    fn test_zero_day_window_is_out_of_range() {
        let holdings = vec![holding("VOO", dec!(1), Currency::Usd)];
        let snapshots = vec![price(5, "VOO", dec!(100))];

        let report =
            calculate_fx_impact(&holdings, &snapshots, &[], usd_cad(), Window::trailing(0))
                .unwrap();
        assert!(report.is_empty());
        assert!(report
            .notices
            .iter()
            .any(|n| matches!(n, Notice::WindowOutOfRange { days: 0, .. })));
    }

    #[test]
    fn test_non_positive_observations_are_dropped() {
        let holdings = vec![holding("VOO", dec!(2), Currency::Usd)];
        let snapshots = vec![price(1, "VOO", dec!(100)), price(2, "VOO", dec!(0))];
        let rates = vec![rate(1, dec!(1.30)), rate(2, dec!(-1))];

        let report =
            calculate_fx_impact(&holdings, &snapshots, &rates, usd_cad(), Window::trailing(2))
                .unwrap();

        // Day 2 is dropped from the data so the window ends on day 1
        assert_eq!(report.window_end, Some(d(1)));
        let invalid = report
            .notices
            .iter()
            .filter(|n| matches!(n, Notice::InvalidObservation { .. }))
            .count();
        assert_eq!(invalid, 2);
    }

    #[test]
    fn test_same_ticker_in_two_accounts_sums_shares() {
        let holdings = vec![
            holding("XEQT.TO", dec!(10), Currency::Cad),
            holding("XEQT.TO", dec!(5), Currency::Cad),
        ];
        let snapshots = vec![SnapshotRow {
            currency: Currency::Cad,
            ..price(1, "XEQT.TO", dec!(30))
        }];

        let report =
            calculate_fx_impact(&holdings, &snapshots, &[], usd_cad(), Window::trailing(1))
                .unwrap();
        assert_eq!(report.points[0].actual_fx_total, Some(dec!(450)));
    }

    #[test]
    fn test_third_currency_is_reported_not_converted() {
        let holdings = vec![
            holding("VOO", dec!(1), Currency::Usd),
            holding("SAP", dec!(1), Currency::Eur),
        ];
        let snapshots = vec![price(1, "VOO", dec!(100)), price(1, "SAP", dec!(200))];
        let rates = vec![rate(1, dec!(1.25))];

        let report =
            calculate_fx_impact(&holdings, &snapshots, &rates, usd_cad(), Window::trailing(1))
                .unwrap();

        assert_eq!(report.points[0].actual_fx_total, Some(dec!(125.00)));
        assert!(report.notices.contains(&Notice::UnsupportedCurrency {
            ticker: "SAP".to_string(),
            currency: Currency::Eur,
        }));
    }

    #[test]
    fn test_conflicting_fx_rate_is_rejected() {
        let holdings = vec![holding("VOO", dec!(1), Currency::Usd)];
        let snapshots = vec![price(1, "VOO", dec!(100))];
        let rates = vec![rate(1, dec!(1.30)), rate(1, dec!(1.31))];

        let err =
            calculate_fx_impact(&holdings, &snapshots, &rates, usd_cad(), Window::trailing(1))
                .unwrap_err();
        assert!(matches!(err, CalculationError::ConflictingFxRate { .. }));
    }

    #[test]
    fn test_actual_is_unknown_before_fx_series_starts() {
        let holdings = vec![holding("VOO", dec!(1), Currency::Usd)];
        let snapshots = vec![price(1, "VOO", dec!(100)), price(3, "VOO", dec!(100))];
        let rates = vec![rate(3, dec!(1.40))];

        let report =
            calculate_fx_impact(&holdings, &snapshots, &rates, usd_cad(), Window::trailing(3))
                .unwrap();

        assert_eq!(report.mode, SeriesMode::Dual);
        assert_eq!(report.day_zero, Some(d(3)));
        assert_eq!(report.points.len(), 3);
        assert_eq!(report.points[0].actual_fx_total, None);
        assert_eq!(report.points[0].fixed_fx_total, Some(dec!(140.00)));
        assert_eq!(report.points[2].currency_effect(), Some(dec!(0)));
    }
}
