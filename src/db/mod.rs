// Database module - SQLite connection, snapshot and FX rate store

pub mod models;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

pub use models::{
    Account, AccountType, Currency, FxPair, FxRateRow, Holding, ObservationSource, Portfolio,
    SnapshotRow, UpsertOutcome,
};

/// Directory holding the database and config file (`$HOME/.fxview`)
pub fn get_data_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let dir = PathBuf::from(home).join(".fxview");

    // Create directory if it doesn't exist
    std::fs::create_dir_all(&dir).context("Failed to create .fxview directory")?;

    Ok(dir)
}

/// Get default database path
pub fn get_default_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join("data.db"))
}

/// Open database connection
pub fn open_db(db_path: Option<PathBuf>) -> Result<Connection> {
    let path = match db_path {
        Some(p) => p,
        None => get_default_db_path()?,
    };
    Connection::open(&path).context(format!("Failed to open database at {:?}", path))
}

/// Initialize the database with schema
///
/// Safe to call repeatedly; every statement is `IF NOT EXISTS`.
pub fn init_database(db_path: Option<PathBuf>) -> Result<()> {
    let path = match db_path {
        Some(p) => p,
        None => get_default_db_path()?,
    };

    info!("Initializing database at: {:?}", path);

    let conn = open_db(Some(path))?;
    apply_schema(&conn)?;

    info!("Database initialized successfully");
    Ok(())
}

/// Run the schema against an already-open connection (used by in-memory tests)
pub fn apply_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(include_str!("schema.sql"))
        .context("Failed to execute schema")
}

/// Insert a snapshot row, or overwrite the existing row for the same (date, ticker).
///
/// A second write on the same calendar day never creates a second row.
pub fn upsert_snapshot(
    conn: &Connection,
    row: &SnapshotRow,
    source: ObservationSource,
) -> Result<UpsertOutcome> {
    let existing: Option<(Decimal, String)> = conn
        .query_row(
            "SELECT price, currency FROM price_snapshots
             WHERE snapshot_date = ?1 AND ticker = ?2",
            params![row.date, row.ticker],
            |r| Ok((get_decimal_value(r, 0)?, r.get::<_, String>(1)?)),
        )
        .optional()?;

    let outcome = match existing {
        Some((price, currency)) if price == row.price && currency == row.currency.as_str() => {
            return Ok(UpsertOutcome::Unchanged);
        }
        Some(_) => UpsertOutcome::Updated,
        None => UpsertOutcome::Inserted,
    };

    conn.execute(
        "INSERT INTO price_snapshots (snapshot_date, ticker, price, currency, source)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(snapshot_date, ticker) DO UPDATE SET
            price = excluded.price,
            currency = excluded.currency,
            source = excluded.source,
            recorded_at = CURRENT_TIMESTAMP",
        params![
            row.date,
            row.ticker,
            row.price.to_string(),
            row.currency.as_str(),
            source.as_str(),
        ],
    )?;

    debug!("{:?} snapshot {} {} = {}", outcome, row.date, row.ticker, row.price);
    Ok(outcome)
}

/// Insert or overwrite the single rate for (date, pair)
pub fn upsert_fx_rate(
    conn: &Connection,
    pair: FxPair,
    row: &FxRateRow,
    source: ObservationSource,
) -> Result<UpsertOutcome> {
    let existing: Option<Decimal> = conn
        .query_row(
            "SELECT rate FROM fx_rates
             WHERE rate_date = ?1 AND base_currency = ?2 AND quote_currency = ?3",
            params![row.date, pair.base.as_str(), pair.quote.as_str()],
            |r| get_decimal_value(r, 0),
        )
        .optional()?;

    let outcome = match existing {
        Some(rate) if rate == row.rate => return Ok(UpsertOutcome::Unchanged),
        Some(_) => UpsertOutcome::Updated,
        None => UpsertOutcome::Inserted,
    };

    conn.execute(
        "INSERT INTO fx_rates (rate_date, base_currency, quote_currency, rate, source)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(rate_date, base_currency, quote_currency) DO UPDATE SET
            rate = excluded.rate,
            source = excluded.source,
            recorded_at = CURRENT_TIMESTAMP",
        params![
            row.date,
            pair.base.as_str(),
            pair.quote.as_str(),
            row.rate.to_string(),
            source.as_str(),
        ],
    )?;

    debug!("{:?} {} rate {} = {}", outcome, pair, row.date, row.rate);
    Ok(outcome)
}

/// Load every snapshot row on or before `up_to` (all rows when None), ordered by date then ticker
pub fn load_snapshots(conn: &Connection, up_to: Option<NaiveDate>) -> Result<Vec<SnapshotRow>> {
    let mut stmt = conn.prepare(
        "SELECT snapshot_date, ticker, price, currency
         FROM price_snapshots
         WHERE ?1 IS NULL OR snapshot_date <= ?1
         ORDER BY snapshot_date, ticker",
    )?;

    let rows = stmt.query_map([up_to], map_snapshot_row)?;
    let mut snapshots = Vec::new();
    for row in rows {
        snapshots.push(row?);
    }
    Ok(snapshots)
}

/// Load the rate history of one pair on or before `up_to`, ordered by date
pub fn load_fx_rates(
    conn: &Connection,
    pair: FxPair,
    up_to: Option<NaiveDate>,
) -> Result<Vec<FxRateRow>> {
    let mut stmt = conn.prepare(
        "SELECT rate_date, rate
         FROM fx_rates
         WHERE base_currency = ?1 AND quote_currency = ?2
           AND (?3 IS NULL OR rate_date <= ?3)
         ORDER BY rate_date",
    )?;

    let rows = stmt.query_map(
        params![pair.base.as_str(), pair.quote.as_str(), up_to],
        |r| {
            Ok(FxRateRow {
                date: r.get(0)?,
                rate: get_decimal_value(r, 1)?,
            })
        },
    )?;

    let mut rates = Vec::new();
    for row in rows {
        rates.push(row?);
    }
    Ok(rates)
}

/// Most recent stored rate for a pair
pub fn latest_fx_rate(conn: &Connection, pair: FxPair) -> Result<Option<FxRateRow>> {
    let result = conn
        .query_row(
            "SELECT rate_date, rate FROM fx_rates
             WHERE base_currency = ?1 AND quote_currency = ?2
             ORDER BY rate_date DESC
             LIMIT 1",
            params![pair.base.as_str(), pair.quote.as_str()],
            |r| {
                Ok(FxRateRow {
                    date: r.get(0)?,
                    rate: get_decimal_value(r, 1)?,
                })
            },
        )
        .optional()?;
    Ok(result)
}

/// Most recent price per ticker, no older than `max_age_days` before `as_of`.
///
/// Tickers without a recent enough row are simply absent from the map.
pub fn latest_prices(
    conn: &Connection,
    tickers: &[String],
    as_of: NaiveDate,
    max_age_days: u64,
) -> Result<BTreeMap<String, SnapshotRow>> {
    let cutoff = as_of
        .checked_sub_days(chrono::Days::new(max_age_days))
        .ok_or_else(|| anyhow!("Failed to compute price cutoff date"))?;

    let mut stmt = conn.prepare(
        "SELECT snapshot_date, ticker, price, currency
         FROM price_snapshots
         WHERE ticker = ?1 AND snapshot_date >= ?2 AND snapshot_date <= ?3
         ORDER BY snapshot_date DESC
         LIMIT 1",
    )?;

    let mut prices = BTreeMap::new();
    for ticker in tickers {
        if let Some(row) = stmt
            .query_row(params![ticker, cutoff, as_of], map_snapshot_row)
            .optional()?
        {
            prices.insert(ticker.clone(), row);
        }
    }

    debug!(
        "Found cached prices for {}/{} tickers since {}",
        prices.len(),
        tickers.len(),
        cutoff
    );
    Ok(prices)
}

/// Row counts and covered date ranges of the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    pub snapshot_rows: i64,
    pub snapshot_tickers: i64,
    pub first_snapshot: Option<NaiveDate>,
    pub last_snapshot: Option<NaiveDate>,
    pub fx_rows: i64,
    pub first_fx: Option<NaiveDate>,
    pub last_fx: Option<NaiveDate>,
}

pub fn store_summary(conn: &Connection) -> Result<StoreSummary> {
    let (snapshot_rows, snapshot_tickers, first_snapshot, last_snapshot): (
        i64,
        i64,
        Option<NaiveDate>,
        Option<NaiveDate>,
    ) = conn.query_row(
        "SELECT COUNT(*), COUNT(DISTINCT ticker), MIN(snapshot_date), MAX(snapshot_date)
         FROM price_snapshots",
        [],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
    )?;
    let (fx_rows, first_fx, last_fx): (i64, Option<NaiveDate>, Option<NaiveDate>) = conn.query_row(
        "SELECT COUNT(*), MIN(rate_date), MAX(rate_date) FROM fx_rates",
        [],
        |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )?;

    Ok(StoreSummary {
        snapshot_rows,
        snapshot_tickers,
        first_snapshot,
        last_snapshot,
        fx_rows,
        first_fx,
        last_fx,
    })
}

fn map_snapshot_row(r: &rusqlite::Row) -> Result<SnapshotRow, rusqlite::Error> {
    let currency: String = r.get(3)?;
    Ok(SnapshotRow {
        date: r.get(0)?,
        ticker: r.get(1)?,
        price: get_decimal_value(r, 2)?,
        currency: Currency::from_str(&currency).map_err(|_| {
            rusqlite::Error::InvalidColumnType(3, currency, rusqlite::types::Type::Text)
        })?,
    })
}

/// Helper to read Decimal from SQLite (handles both INTEGER, REAL and TEXT)
pub fn get_decimal_value(row: &rusqlite::Row, idx: usize) -> Result<Decimal, rusqlite::Error> {
    use rusqlite::types::ValueRef;

    match row.get_ref(idx)? {
        ValueRef::Text(bytes) => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
            Decimal::from_str(s).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        }
        ValueRef::Integer(i) => Ok(Decimal::from(i)),
        ValueRef::Real(f) => {
            Decimal::try_from(f).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
        }
        _ => Err(rusqlite::Error::InvalidColumnType(
            idx,
            "decimal".to_string(),
            rusqlite::types::Type::Null,
        )),
    }
}
