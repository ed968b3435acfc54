// Pricing module - exchange-rate API client

pub mod exchange_rate;

use anyhow::{anyhow, Context, Result};
use once_cell::sync::OnceCell;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use crate::db::{FxPair, FxRateRow};

pub use exchange_rate::{default_cache_path, HomeRates, RateCache, RateFetcher};

/// Shared HTTP client, built on first use
static HTTP_CLIENT: OnceCell<Client> = OnceCell::new();

pub(crate) fn http_client() -> Result<&'static Client> {
    HTTP_CLIENT.get_or_try_init(|| {
        Client::builder()
            .user_agent(concat!("fxview/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")
    })
}

/// Today's rate for `pair`, as a row ready to store
pub async fn fetch_pair_rate(
    fetcher: &RateFetcher,
    pair: FxPair,
) -> Result<(FxRateRow, HomeRates)> {
    let rates = fetcher.rates_to_home(pair.quote, &[pair.base]).await?;
    let rate = rates
        .rate(pair.base)
        .ok_or_else(|| anyhow!("No {} rate available for {}", pair.base, pair))?;

    info!("{} = {} (fetched {})", pair, rate, rates.fetched_at);
    let row = FxRateRow {
        date: rates.fetched_at.date_naive(),
        rate,
    };
    Ok((row, rates))
}
