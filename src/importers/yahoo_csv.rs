//! Yahoo Finance history downloads
//!
//! One CSV per ticker with the `Date,Open,High,Low,Close,Adj Close,Volume`
//! layout. `Adj Close` is preferred and `Close` used when the adjusted column is
//! absent; Yahoo writes `null` for days without a quote. A download of the
//! pair symbol (`USDCAD=X.csv`) in the same directory supplies FX rates.

use anyhow::{anyhow, Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use csv::ReaderBuilder;
use itertools::Itertools;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::db::{FxPair, FxRateRow, Portfolio, SnapshotRow};

use super::ParsedRows;

/// A single dated close from a Yahoo download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: Decimal,
}

/// Rows from every per-ticker file found in a download directory
#[derive(Debug, Default)]
pub struct YahooImport {
    pub rows: Vec<SnapshotRow>,
    /// Held tickers with no readable file in the directory
    pub missing: Vec<String>,
    /// Rates from the pair download, when present
    pub fx_rates: Vec<FxRateRow>,
    pub skipped: usize,
    pub duplicates: usize,
}

/// Parse one Yahoo history download into (date, close) pairs.
///
/// Weekend rows, `null` cells and non-positive closes are skipped. Rows before
/// `since` are dropped when a cutoff is given. A date repeated later in the
/// file replaces the earlier close.
pub fn parse_yahoo_history<R: Read>(
    reader: R,
    since: Option<NaiveDate>,
) -> Result<ParsedRows<DailyClose>> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();

    let date_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("date"))
        .ok_or_else(|| anyhow!("Date column not found"))?;
    let close_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("adj close"))
        .or_else(|| headers.iter().position(|h| h.eq_ignore_ascii_case("close")))
        .ok_or_else(|| anyhow!("Neither Adj Close nor Close column found"))?;

    let mut closes: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let mut skipped = 0;
    let mut duplicates = 0;

    for (idx, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping row {}: {}", idx + 2, e);
                skipped += 1;
                continue;
            }
        };

        let (Some(date_str), Some(close_str)) = (record.get(date_idx), record.get(close_idx))
        else {
            skipped += 1;
            continue;
        };

        let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
            warn!("Skipping row {}: invalid date '{}'", idx + 2, date_str);
            skipped += 1;
            continue;
        };

        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            debug!("Skipping weekend row {}", date);
            continue;
        }
        if since.is_some_and(|cutoff| date < cutoff) {
            continue;
        }

        if close_str.is_empty() || close_str.eq_ignore_ascii_case("null") {
            skipped += 1;
            continue;
        }
        match Decimal::from_str(close_str).or_else(|_| Decimal::from_scientific(close_str)) {
            Ok(close) if close > Decimal::ZERO => {
                if closes.insert(date, close).is_some() {
                    duplicates += 1;
                }
            }
            _ => {
                warn!("Skipping row {}: invalid close '{}'", idx + 2, close_str);
                skipped += 1;
            }
        }
    }

    Ok(ParsedRows {
        rows: closes
            .into_iter()
            .map(|(date, close)| DailyClose { date, close })
            .collect(),
        skipped,
        duplicates,
    })
}

/// Locate the download for `ticker`: `XEQT.TO.csv` or `XEQT_TO.csv`
pub fn find_ticker_file(dir: &Path, ticker: &str) -> Option<PathBuf> {
    [format!("{}.csv", ticker), format!("{}.csv", ticker.replace('.', "_"))]
        .into_iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Load every held ticker's download from `dir` as snapshot rows, plus the
/// `pair` download as rates when one is there.
///
/// Closes are quoted in the currency of the ticker's first holding.
pub fn import_yahoo_dir(
    dir: &Path,
    portfolio: &Portfolio,
    pair: FxPair,
    since: Option<NaiveDate>,
) -> Result<YahooImport> {
    if !dir.is_dir() {
        return Err(anyhow!("{:?} is not a directory", dir));
    }

    let mut import = YahooImport::default();

    let held = portfolio
        .holdings()
        .into_iter()
        .map(|h| (h.ticker, h.currency))
        .unique_by(|(ticker, _)| ticker.clone());

    for (ticker, currency) in held {
        let Some(path) = find_ticker_file(dir, &ticker) else {
            warn!("No Yahoo CSV found for {} in {:?}", ticker, dir);
            import.missing.push(ticker);
            continue;
        };

        let file = std::fs::File::open(&path).context(format!("Failed to open {:?}", path))?;
        let parsed = match parse_yahoo_history(file, since) {
            Ok(p) => p,
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                import.missing.push(ticker);
                continue;
            }
        };

        info!("Loaded {} closes for {} from {:?}", parsed.rows.len(), ticker, path);
        import.skipped += parsed.skipped;
        import.duplicates += parsed.duplicates;
        import
            .rows
            .extend(parsed.rows.into_iter().map(|c| SnapshotRow {
                date: c.date,
                ticker: ticker.clone(),
                price: c.close,
                currency,
            }));
    }

    let symbol = pair.symbol();
    if let Some(path) = find_ticker_file(dir, &symbol) {
        let file = std::fs::File::open(&path).context(format!("Failed to open {:?}", path))?;
        match parse_yahoo_history(file, since) {
            Ok(parsed) => {
                info!("Loaded {} {} rates from {:?}", parsed.rows.len(), pair, path);
                import.skipped += parsed.skipped;
                import.duplicates += parsed.duplicates;
                import.fx_rates = parsed
                    .rows
                    .into_iter()
                    .map(|c| FxRateRow {
                        date: c.date,
                        rate: c.close,
                    })
                    .collect();
            }
            Err(e) => warn!("Skipping {:?}: {}", path, e),
        }
    } else {
        debug!("No {} download in {:?}", symbol, dir);
    }

    Ok(import)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Account, AccountType, Currency, Holding};
    use rust_decimal_macros::dec;

    const HISTORY: &str = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-06-07,10,11,9,10.5,10.4,100
2024-06-08,10,11,9,10.6,10.5,100
2024-06-10,null,null,null,null,null,null
2024-06-11,10,11,9,10.8,10.7,100
";

    #[test]
    fn test_prefers_adjusted_close_and_skips_weekends() {
        let parsed = parse_yahoo_history(HISTORY.as_bytes(), None).unwrap();
        let dates: Vec<_> = parsed.rows.iter().map(|r| r.date.to_string()).collect();

        assert_eq!(dates, vec!["2024-06-07", "2024-06-11"]);
        assert_eq!(parsed.rows[0].close, dec!(10.4));
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_falls_back_to_close() {
        let data = "Date,Close\n2024-06-07,12.5\n";
        let parsed = parse_yahoo_history(data.as_bytes(), None).unwrap();
        assert_eq!(parsed.rows[0].close, dec!(12.5));
    }

    #[test]
    fn test_cutoff_drops_older_rows() {
        let since = NaiveDate::from_ymd_opt(2024, 6, 10);
        let parsed = parse_yahoo_history(HISTORY.as_bytes(), since).unwrap();
        assert_eq!(parsed.rows.len(), 1);
    }

    fn usd_cad() -> FxPair {
        FxPair::new(Currency::Usd, Currency::Cad)
    }

    #[test]
    fn test_repeated_date_keeps_later_close() {
        let data = "Date,Close\n2024-06-07,10\n2024-06-06,9\n2024-06-07,11\n";
        let parsed = parse_yahoo_history(data.as_bytes(), None).unwrap();

        assert_eq!(parsed.duplicates, 1);
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].close, dec!(9));
        assert_eq!(parsed.rows[1].close, dec!(11));
    }

    #[test]
    fn test_import_dir_reads_pair_download() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("USDCAD=X.csv"),
            "Date,Close\n2024-06-06,1.37\n2024-06-07,1.36\n2024-06-07,1.365\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("SHOP.csv"), "Date,Close\n2024-06-07,60\n").unwrap();

        let portfolio = Portfolio {
            accounts: vec![Account {
                nickname: "cash".to_string(),
                holder: "Alex".to_string(),
                account_type: AccountType::NonRegistered,
                base_currency: Currency::Cad,
                holdings: vec![Holding {
                    ticker: "SHOP".to_string(),
                    shares: dec!(3),
                    cost_basis: dec!(50),
                    currency: Currency::Cad,
                    account: "cash".to_string(),
                }],
            }],
        };

        let import = import_yahoo_dir(dir.path(), &portfolio, usd_cad(), None).unwrap();
        assert_eq!(import.rows.len(), 1);
        assert_eq!(import.fx_rates.len(), 2);
        assert_eq!(import.fx_rates[1].rate, dec!(1.365));
        assert_eq!(import.duplicates, 1);
    }

    #[test]
    fn test_closes_take_the_holding_currency() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("VOO.csv"), "Date,Close\n2024-06-07,520\n").unwrap();

        let portfolio = Portfolio {
            accounts: vec![Account {
                nickname: "rrsp".to_string(),
                holder: "Sam".to_string(),
                account_type: AccountType::Rrsp,
                base_currency: Currency::Eur,
                holdings: vec![Holding {
                    ticker: "VOO".to_string(),
                    shares: dec!(2),
                    cost_basis: dec!(400),
                    currency: Currency::Usd,
                    account: "rrsp".to_string(),
                }],
            }],
        };

        let pair = FxPair::new(Currency::Gbp, Currency::Eur);
        let import = import_yahoo_dir(dir.path(), &portfolio, pair, None).unwrap();
        assert_eq!(import.rows.len(), 1);
        assert_eq!(import.rows[0].currency, Currency::Usd);
    }

    #[test]
    fn test_import_dir_matches_underscored_names() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("XEQT_TO.csv"), HISTORY).unwrap();

        let portfolio = Portfolio {
            accounts: vec![Account {
                nickname: "tfsa".to_string(),
                holder: "Alex".to_string(),
                account_type: AccountType::Tfsa,
                base_currency: Currency::Cad,
                holdings: vec![
                    Holding {
                        ticker: "XEQT.TO".to_string(),
                        shares: dec!(10),
                        cost_basis: dec!(25),
                        currency: Currency::Cad,
                        account: "tfsa".to_string(),
                    },
                    Holding {
                        ticker: "VOO".to_string(),
                        shares: dec!(1),
                        cost_basis: dec!(400),
                        currency: Currency::Usd,
                        account: "tfsa".to_string(),
                    },
                ],
            }],
        };

        let import = import_yahoo_dir(dir.path(), &portfolio, usd_cad(), None).unwrap();
        assert_eq!(import.rows.len(), 2);
        assert!(import.fx_rates.is_empty());
        assert!(import.rows.iter().all(|r| r.ticker == "XEQT.TO"));
        assert_eq!(import.missing, vec!["VOO"]);
    }
}
