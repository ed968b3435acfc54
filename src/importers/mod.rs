// Import module - snapshot logs, Yahoo downloads, FX rate files and the portfolio file

pub mod fx_csv;
pub mod portfolio_json;
pub mod snapshot_csv;
pub mod yahoo_csv;

use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use tracing::info;

use crate::db::{self, FxPair, FxRateRow, ObservationSource, SnapshotRow, UpsertOutcome};

pub use fx_csv::parse_fx_csv;
pub use portfolio_json::{load_portfolio, parse_portfolio};
pub use snapshot_csv::parse_snapshot_csv;
pub use yahoo_csv::{import_yahoo_dir, YahooImport};

/// Rows accepted from a file plus what was thrown away on the way
#[derive(Debug, Clone, Default)]
pub struct ParsedRows<T> {
    pub rows: Vec<T>,
    /// Malformed rows, skipped with a warning
    pub skipped: usize,
    /// Same-key rows collapsed within the file
    pub duplicates: usize,
}

/// What writing a batch did to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl ImportStats {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }
}

/// Write snapshot rows in one transaction
pub fn store_snapshots(
    conn: &mut Connection,
    rows: &[SnapshotRow],
    source: ObservationSource,
) -> Result<ImportStats> {
    let tx = conn.transaction()?;
    let mut stats = ImportStats::default();
    for row in rows {
        stats.record(db::upsert_snapshot(&tx, row, source)?);
    }
    tx.commit()?;

    info!(
        "Stored snapshots: {} inserted, {} updated, {} unchanged",
        stats.inserted, stats.updated, stats.unchanged
    );
    Ok(stats)
}

/// Write rate rows for one pair in one transaction
pub fn store_fx_rates(
    conn: &mut Connection,
    pair: FxPair,
    rows: &[FxRateRow],
    source: ObservationSource,
) -> Result<ImportStats> {
    let tx = conn.transaction()?;
    let mut stats = ImportStats::default();
    for row in rows {
        stats.record(db::upsert_fx_rate(&tx, pair, row, source)?);
    }
    tx.commit()?;

    info!(
        "Stored {} rates: {} inserted, {} updated, {} unchanged",
        pair, stats.inserted, stats.updated, stats.unchanged
    );
    Ok(stats)
}
