use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::db::{Currency, FxPair, Holding, SnapshotRow};

/// Current value of one ticker, summed across accounts, in the home currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionValue {
    pub ticker: String,
    pub currency: Currency,
    pub shares: Decimal,
    /// Native-currency price from the latest snapshot
    pub price: Decimal,
    pub market_value: Decimal,
    pub cost_total: Decimal,
    pub gain: Decimal,
    pub gain_pct: Option<Decimal>,
    pub allocation_pct: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioValuation {
    pub home_currency: Currency,
    pub fx_rate: Option<Decimal>,
    pub positions: Vec<PositionValue>,
    /// Tickers left out because no price or no conversion rate was available
    pub excluded: Vec<String>,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_gain: Decimal,
    pub total_gain_pct: Option<Decimal>,
}

impl PortfolioValuation {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

struct Aggregate {
    currency: Currency,
    shares: Decimal,
    cost_total: Decimal,
}

/// Value holdings at their latest cached prices.
///
/// Foreign positions are converted with `fx_rate` (home per unit of
/// `pair.base`); both market value and cost use the current rate.
pub fn value_portfolio(
    holdings: &[Holding],
    prices: &BTreeMap<String, SnapshotRow>,
    pair: FxPair,
    fx_rate: Option<Decimal>,
) -> PortfolioValuation {
    let home = pair.quote;

    let mut aggregates: BTreeMap<&str, Aggregate> = BTreeMap::new();
    for holding in holdings {
        let entry = aggregates
            .entry(holding.ticker.as_str())
            .or_insert(Aggregate {
                currency: holding.currency,
                shares: Decimal::ZERO,
                cost_total: Decimal::ZERO,
            });
        entry.shares += holding.shares;
        entry.cost_total += holding.cost_total();
    }

    let mut positions = Vec::new();
    let mut excluded = Vec::new();

    for (ticker, agg) in aggregates {
        let factor = if agg.currency == home {
            Some(Decimal::ONE)
        } else if agg.currency == pair.base {
            fx_rate
        } else {
            None
        };

        let (Some(snapshot), Some(factor)) = (prices.get(ticker), factor) else {
            debug!("Excluding {} from valuation", ticker);
            excluded.push(ticker.to_string());
            continue;
        };

        let market_value = agg.shares * snapshot.price * factor;
        let cost_total = agg.cost_total * factor;
        let gain = market_value - cost_total;

        positions.push(PositionValue {
            ticker: ticker.to_string(),
            currency: agg.currency,
            shares: agg.shares,
            price: snapshot.price,
            market_value,
            cost_total,
            gain,
            gain_pct: pct_of(gain, cost_total),
            allocation_pct: Decimal::ZERO,
        });
    }

    let total_value: Decimal = positions.iter().map(|p| p.market_value).sum();
    let total_cost: Decimal = positions.iter().map(|p| p.cost_total).sum();
    let total_gain = total_value - total_cost;

    for position in &mut positions {
        position.allocation_pct = pct_of(position.market_value, total_value).unwrap_or_default();
    }
    positions.sort_by(|a, b| {
        b.market_value
            .cmp(&a.market_value)
            .then_with(|| a.ticker.cmp(&b.ticker))
    });

    PortfolioValuation {
        home_currency: home,
        fx_rate,
        positions,
        excluded,
        total_value,
        total_cost,
        total_gain,
        total_gain_pct: pct_of(total_gain, total_cost),
    }
}

fn pct_of(part: Decimal, whole: Decimal) -> Option<Decimal> {
    if whole.is_zero() {
        None
    } else {
        Some(part / whole * Decimal::from(100))
    }
}
