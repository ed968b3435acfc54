// FX impact scenarios driven through the public report API with literal fixtures

use chrono::NaiveDate;
use fxview::db::{Currency, FxPair, FxRateRow, Holding, SnapshotRow};
use fxview::reports::{calculate_fx_impact, FxImpactReport, Notice, SeriesMode, Window};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const USD_CAD: FxPair = FxPair {
    base: Currency::Usd,
    quote: Currency::Cad,
};

fn day(n: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 2 + n).unwrap()
}

fn holding(ticker: &str, shares: Decimal, currency: Currency) -> Holding {
    Holding {
        ticker: ticker.to_string(),
        shares,
        cost_basis: dec!(1),
        currency,
        account: "tfsa".to_string(),
    }
}

fn prices(ticker: &str, currency: Currency, series: &[Decimal]) -> Vec<SnapshotRow> {
    series
        .iter()
        .enumerate()
        .map(|(i, price)| SnapshotRow {
            date: day(i as u32 + 1),
            ticker: ticker.to_string(),
            price: *price,
            currency,
        })
        .collect()
}

fn rates(series: &[(u32, Decimal)]) -> Vec<FxRateRow> {
    series
        .iter()
        .map(|(d, rate)| FxRateRow {
            date: day(*d),
            rate: *rate,
        })
        .collect()
}

fn run(holdings: &[Holding], snapshots: &[SnapshotRow], fx: &[FxRateRow]) -> FxImpactReport {
    calculate_fx_impact(holdings, snapshots, fx, USD_CAD, Window::trailing(5))
        .expect("calculation failed")
}

#[test]
fn test_rising_rate_moves_only_the_actual_series() {
    let holdings = vec![
        holding("XEQT.TO", dec!(10), Currency::Cad),
        holding("VOO", dec!(2), Currency::Usd),
    ];
    let mut snapshots = prices("XEQT.TO", Currency::Cad, &[dec!(30); 5]);
    snapshots.extend(prices("VOO", Currency::Usd, &[dec!(100); 5]));
    let fx = rates(&[
        (1, dec!(1.30)),
        (2, dec!(1.3125)),
        (3, dec!(1.325)),
        (4, dec!(1.3375)),
        (5, dec!(1.35)),
    ]);

    let report = run(&holdings, &snapshots, &fx);

    assert_eq!(report.mode, SeriesMode::Dual);
    assert_eq!(report.day_zero, Some(day(1)));
    assert_eq!(report.day_zero_rate, Some(dec!(1.30)));
    assert_eq!(report.points.len(), 5);

    for point in &report.points {
        assert_eq!(point.fixed_fx_total, Some(dec!(560)));
        let rate = point.fx_rate.unwrap();
        assert_eq!(point.actual_fx_total, Some(dec!(300) + dec!(200) * rate));
    }

    let last = report.latest().unwrap();
    assert_eq!(last.actual_fx_total, Some(dec!(570)));
    assert_eq!(report.currency_effect(), Some(dec!(10)));
    assert_eq!(report.market_return_pct(), Some(dec!(0)));

    // The home leg is identical in both series
    let cad_leg = last.legs.iter().find(|l| l.ticker == "XEQT.TO").unwrap();
    assert_eq!(cad_leg.fixed_fx_value, cad_leg.actual_fx_value);
}

#[test]
fn test_flat_rate_keeps_series_together() {
    let holdings = vec![holding("VOO", dec!(1), Currency::Usd)];
    let snapshots = prices(
        "VOO",
        Currency::Usd,
        &[dec!(100), dec!(102.5), dec!(105), dec!(107.5), dec!(110)],
    );
    let fx = rates(&(1..=5).map(|d| (d, dec!(1.30))).collect::<Vec<_>>());

    let report = run(&holdings, &snapshots, &fx);

    for point in &report.points {
        assert_eq!(point.fixed_fx_total, point.actual_fx_total);
    }
    assert_eq!(report.market_return_pct(), Some(dec!(10)));
    assert_eq!(report.actual_return_pct(), Some(dec!(10)));
    assert_eq!(report.currency_effect(), Some(dec!(0)));
}

#[test]
fn test_home_currency_holdings_ignore_the_rate() {
    let holdings = vec![holding("XEQT.TO", dec!(4), Currency::Cad)];
    let snapshots = prices(
        "XEQT.TO",
        Currency::Cad,
        &[dec!(30), dec!(31), dec!(29), dec!(32), dec!(33)],
    );
    let fx = rates(&[(1, dec!(1.25)), (3, dec!(1.40)), (5, dec!(1.10))]);

    let report = run(&holdings, &snapshots, &fx);

    assert_eq!(report.points.len(), 5);
    for point in &report.points {
        assert_eq!(point.fixed_fx_total, point.actual_fx_total);
    }
}

#[test]
fn test_sparse_rates_are_carried_forward() {
    let holdings = vec![holding("VOO", dec!(1), Currency::Usd)];
    let snapshots = prices("VOO", Currency::Usd, &[dec!(100); 5]);
    let fx = rates(&[(1, dec!(1.30)), (3, dec!(1.34))]);

    let report = run(&holdings, &snapshots, &fx);

    let used: Vec<Option<Decimal>> = report.points.iter().map(|p| p.fx_rate).collect();
    assert_eq!(
        used,
        vec![
            Some(dec!(1.30)),
            Some(dec!(1.30)),
            Some(dec!(1.34)),
            Some(dec!(1.34)),
            Some(dec!(1.34)),
        ]
    );
    assert_eq!(report.points[4].actual_fx_total, Some(dec!(134)));
}

#[test]
fn test_no_rates_falls_back_to_actual_only() {
    let holdings = vec![
        holding("XEQT.TO", dec!(10), Currency::Cad),
        holding("VOO", dec!(2), Currency::Usd),
    ];
    let mut snapshots = prices("XEQT.TO", Currency::Cad, &[dec!(30); 5]);
    snapshots.extend(prices("VOO", Currency::Usd, &[dec!(100); 5]));

    let report = run(&holdings, &snapshots, &[]);

    assert_eq!(report.mode, SeriesMode::ActualOnly);
    assert!(report.notices.contains(&Notice::NoFxDataAvailable));
    assert_eq!(report.points.len(), 5);
    for point in &report.points {
        assert_eq!(point.fixed_fx_total, None);
        assert_eq!(point.actual_fx_total, Some(dec!(500)));
    }
}

#[test]
fn test_ticker_without_snapshots_is_reported_missing() {
    let holdings = vec![
        holding("VOO", dec!(1), Currency::Usd),
        holding("ZZZ", dec!(50), Currency::Usd),
    ];
    let snapshots = prices("VOO", Currency::Usd, &[dec!(100); 5]);
    let fx = rates(&[(1, dec!(1.30))]);

    let report = run(&holdings, &snapshots, &fx);

    assert_eq!(report.missing_tickers, vec!["ZZZ".to_string()]);
    assert!(report.notices.contains(&Notice::IncompleteHolding {
        ticker: "ZZZ".to_string()
    }));
    for point in &report.points {
        assert_eq!(point.actual_fx_total, Some(dec!(130)));
        assert!(point.legs.iter().all(|l| l.ticker == "VOO"));
    }
}

#[test]
fn test_conflicting_snapshot_rows_are_rejected() {
    let holdings = vec![holding("VOO", dec!(1), Currency::Usd)];
    let mut snapshots = prices("VOO", Currency::Usd, &[dec!(100); 5]);
    snapshots.push(SnapshotRow {
        date: day(3),
        ticker: "VOO".to_string(),
        price: dec!(101),
        currency: Currency::Usd,
    });

    let result = calculate_fx_impact(
        &holdings,
        &snapshots,
        &rates(&[(1, dec!(1.30))]),
        USD_CAD,
        Window::trailing(5),
    );
    assert!(result.is_err());
}

#[test]
fn test_exact_duplicate_rows_change_nothing() {
    let holdings = vec![holding("VOO", dec!(3), Currency::Usd)];
    let snapshots = prices(
        "VOO",
        Currency::Usd,
        &[dec!(100), dec!(101), dec!(99), dec!(104), dec!(103)],
    );
    let fx = rates(&[(1, dec!(1.30)), (4, dec!(1.32))]);

    let mut doubled = snapshots.clone();
    doubled.push(snapshots[2].clone());
    let mut doubled_fx = fx.clone();
    doubled_fx.push(fx[1]);

    assert_eq!(
        run(&holdings, &snapshots, &fx),
        run(&holdings, &doubled, &doubled_fx)
    );
}

#[test]
fn test_report_invariants_hold() {
    let holdings = vec![
        holding("XEQT.TO", dec!(7), Currency::Cad),
        holding("VOO", dec!(2), Currency::Usd),
        holding("VOO", dec!(1), Currency::Usd),
    ];
    let mut snapshots = prices(
        "XEQT.TO",
        Currency::Cad,
        &[dec!(30), dec!(30.5), dec!(31), dec!(30.75), dec!(31.25)],
    );
    // VOO has no price until day 2
    snapshots.extend(
        [dec!(500), dec!(505), dec!(498), dec!(510)]
            .into_iter()
            .zip(2..)
            .map(|(price, d)| SnapshotRow {
                date: day(d),
                ticker: "VOO".to_string(),
                price,
                currency: Currency::Usd,
            }),
    );
    let fx = rates(&[(1, dec!(1.36)), (2, dec!(1.37)), (4, dec!(1.35))]);

    let report = run(&holdings, &snapshots, &fx);

    // Day 0 is the first day every held ticker has a price
    assert_eq!(report.day_zero, Some(day(2)));
    let day_zero = report.day_zero_point().unwrap();
    assert_eq!(day_zero.fixed_fx_total, day_zero.actual_fx_total);

    assert!(report.points.windows(2).all(|w| w[0].date < w[1].date));

    for point in &report.points {
        let fixed: Option<Decimal> = point.legs.iter().map(|l| l.fixed_fx_value).sum();
        let actual: Option<Decimal> = point.legs.iter().map(|l| l.actual_fx_value).sum();
        assert_eq!(fixed, point.fixed_fx_total);
        assert_eq!(actual, point.actual_fx_total);
    }

    // Shares across accounts are combined into one leg
    let last = report.latest().unwrap();
    let voo = last.legs.iter().find(|l| l.ticker == "VOO").unwrap();
    assert_eq!(voo.shares, dec!(3));

    let first = serde_json::to_string(&report).unwrap();
    let second = serde_json::to_string(&run(&holdings, &snapshots, &fx)).unwrap();
    assert_eq!(first, second);
}
