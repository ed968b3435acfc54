use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::db::FxRateRow;
use crate::utils::parse_observation_date;

use super::yahoo_csv::parse_yahoo_history;
use super::ParsedRows;

/// Parse a rate history for one pair.
///
/// Accepts a plain `date,rate` file or a Yahoo download of the pair symbol
/// (e.g. `USDCAD=X`), which carries `Adj Close`/`Close` columns instead.
pub fn parse_fx_csv<P: AsRef<Path>>(file_path: P) -> Result<ParsedRows<FxRateRow>> {
    let path = file_path.as_ref();
    info!("Parsing FX CSV: {:?}", path);

    let content = std::fs::read_to_string(path).context(format!("Failed to read {:?}", path))?;
    parse_fx_rates(&content)
}

pub fn parse_fx_rates(content: &str) -> Result<ParsedRows<FxRateRow>> {
    let header = content.lines().next().unwrap_or_default().to_lowercase();
    let has_rate_column = header.split(',').any(|h| h.trim() == "rate");

    if !has_rate_column {
        let parsed = parse_yahoo_history(content.as_bytes(), None)?;
        return Ok(ParsedRows {
            rows: parsed
                .rows
                .into_iter()
                .map(|c| FxRateRow {
                    date: c.date,
                    rate: c.close,
                })
                .collect(),
            skipped: parsed.skipped,
            duplicates: parsed.duplicates,
        });
    }

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers = reader.headers().context("Failed to read CSV headers")?.clone();

    let date_idx = headers
        .iter()
        .position(|h| h.to_lowercase().contains("date"))
        .ok_or_else(|| anyhow!("Date column not found"))?;
    let rate_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case("rate"))
        .ok_or_else(|| anyhow!("Rate column not found"))?;

    let mut latest: BTreeMap<chrono::NaiveDate, FxRateRow> = BTreeMap::new();
    let mut skipped = 0;
    let mut duplicates = 0;

    for (idx, result) in reader.records().enumerate() {
        let parsed = result.map_err(anyhow::Error::from).and_then(|record| {
            let date_str = record.get(date_idx).unwrap_or_default();
            let rate_str = record.get(rate_idx).unwrap_or_default();
            let date = parse_observation_date(date_str)
                .ok_or_else(|| anyhow!("invalid date '{}'", date_str))?;
            let rate = Decimal::from_str(rate_str)
                .map_err(|_| anyhow!("invalid rate '{}'", rate_str))?;
            if rate <= Decimal::ZERO {
                return Err(anyhow!("non-positive rate {}", rate));
            }
            Ok(FxRateRow { date, rate })
        });

        match parsed {
            Ok(row) => {
                if latest.insert(row.date, row).is_some() {
                    duplicates += 1;
                }
            }
            Err(e) => {
                warn!("Skipping row {}: {}", idx + 2, e);
                skipped += 1;
            }
        }
    }

    Ok(ParsedRows {
        rows: latest.into_values().collect(),
        skipped,
        duplicates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_plain_rate_file() {
        let data = "date,rate\n2024-06-03,1.3650\n2024-06-04,1.3700\n2024-06-05,0\n";
        let parsed = parse_fx_rates(data).unwrap();

        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[1].rate, dec!(1.37));
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_yahoo_pair_download() {
        let data = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-06-03,1.36,1.37,1.36,1.3655,1.3655,0
2024-06-04,1.36,1.37,1.36,1.3712,1.3712,0
";
        let parsed = parse_fx_rates(data).unwrap();
        assert_eq!(parsed.rows.len(), 2);
        assert_eq!(parsed.rows[0].rate, dec!(1.3655));
    }
}
