use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::db::{Currency, SnapshotRow};
use crate::utils::parse_observation_date;

use super::ParsedRows;

/// Parse a snapshot log (`date,ticker,price[,currency,...]`).
///
/// `currency_of` supplies the native currency when the log has no currency
/// column (or an empty cell); `home` is the last resort.
pub fn parse_snapshot_csv<P, F>(
    file_path: P,
    currency_of: F,
    home: Currency,
) -> Result<ParsedRows<SnapshotRow>>
where
    P: AsRef<Path>,
    F: Fn(&str) -> Option<Currency>,
{
    let path = file_path.as_ref();
    info!("Parsing snapshot CSV: {:?}", path);

    let file = std::fs::File::open(path).context(format!("Failed to open {:?}", path))?;
    parse_snapshots(file, currency_of, home)
}

pub fn parse_snapshots<R, F>(
    reader: R,
    currency_of: F,
    home: Currency,
) -> Result<ParsedRows<SnapshotRow>>
where
    R: Read,
    F: Fn(&str) -> Option<Currency>,
{
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    debug!("CSV headers: {:?}", headers);

    let mapping = find_columns(&headers)?;

    let mut latest: BTreeMap<(chrono::NaiveDate, String), SnapshotRow> = BTreeMap::new();
    let mut skipped = 0;
    let mut duplicates = 0;

    for (idx, result) in reader.records().enumerate() {
        let row_num = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping row {}: {}", row_num, e);
                skipped += 1;
                continue;
            }
        };

        match parse_row(&record, &mapping, &currency_of, home) {
            Ok(row) => {
                // Later rows for the same key win
                if latest.insert((row.date, row.ticker.clone()), row).is_some() {
                    duplicates += 1;
                }
            }
            Err(e) => {
                warn!("Skipping row {}: {}", row_num, e);
                skipped += 1;
            }
        }
    }

    let rows: Vec<SnapshotRow> = latest.into_values().collect();
    info!(
        "Parsed {} snapshot rows ({} skipped, {} duplicates resolved)",
        rows.len(),
        skipped,
        duplicates
    );

    Ok(ParsedRows {
        rows,
        skipped,
        duplicates,
    })
}

#[derive(Debug)]
struct ColumnMapping {
    date: usize,
    ticker: usize,
    price: usize,
    currency: Option<usize>,
}

fn find_columns(headers: &csv::StringRecord) -> Result<ColumnMapping> {
    let mut date_idx = None;
    let mut ticker_idx = None;
    let mut price_idx = None;
    let mut currency_idx = None;

    for (idx, header) in headers.iter().enumerate() {
        let text = header.to_lowercase();

        if text.contains("date") && date_idx.is_none() {
            date_idx = Some(idx);
        }
        if text == "ticker" || text == "symbol" {
            ticker_idx = Some(idx);
        }
        // `price`, not `current_value` or `cost_basis`
        if text == "price" || text == "close" {
            price_idx = Some(idx);
        }
        if text == "currency" {
            currency_idx = Some(idx);
        }
    }

    Ok(ColumnMapping {
        date: date_idx.ok_or_else(|| anyhow!("Date column not found"))?,
        ticker: ticker_idx.ok_or_else(|| anyhow!("Ticker column not found"))?,
        price: price_idx.ok_or_else(|| anyhow!("Price column not found"))?,
        currency: currency_idx,
    })
}

fn parse_row<F>(
    record: &csv::StringRecord,
    mapping: &ColumnMapping,
    currency_of: &F,
    home: Currency,
) -> Result<SnapshotRow>
where
    F: Fn(&str) -> Option<Currency>,
{
    let ticker = record
        .get(mapping.ticker)
        .map(|s| s.to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("missing ticker"))?;

    let date_str = record
        .get(mapping.date)
        .ok_or_else(|| anyhow!("missing date"))?;
    let date = parse_observation_date(date_str)
        .ok_or_else(|| anyhow!("invalid date '{}'", date_str))?;

    let price_str = record
        .get(mapping.price)
        .ok_or_else(|| anyhow!("missing price"))?;
    let price = Decimal::from_str(price_str)
        .or_else(|_| Decimal::from_scientific(price_str))
        .map_err(|_| anyhow!("invalid price '{}'", price_str))?;
    if price <= Decimal::ZERO {
        return Err(anyhow!("non-positive price {}", price));
    }

    let explicit = mapping
        .currency
        .and_then(|i| record.get(i))
        .filter(|s| !s.is_empty());
    let currency = match explicit {
        Some(code) => {
            Currency::from_str(code).map_err(|_| anyhow!("unknown currency '{}'", code))?
        }
        None => currency_of(&ticker).unwrap_or(home),
    };

    Ok(SnapshotRow {
        date,
        ticker,
        price,
        currency,
    })
}
