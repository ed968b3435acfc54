use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::db::Currency;
use crate::error::PortfolioError;

use super::http_client;

pub const DEFAULT_API_BASE: &str = "https://open.er-api.com/v6/latest";
const CACHE_FILENAME: &str = "fx_rates.json";

/// open.er-api.com `latest` response. Rates are "units of X per 1 base".
#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// On-disk cache of the last successful fetch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RateCache {
    pub fetched_at: DateTime<Utc>,
    pub home: Currency,
    /// Home-currency units per 1 unit of each foreign currency
    pub rates: BTreeMap<Currency, Decimal>,
}

/// Rates handed back to callers, with where they came from
#[derive(Debug, Clone, PartialEq)]
pub struct HomeRates {
    pub fetched_at: DateTime<Utc>,
    pub rates: BTreeMap<Currency, Decimal>,
    pub from_cache: bool,
    /// Served from an expired cache because the fetch failed
    pub stale: bool,
}

impl HomeRates {
    pub fn rate(&self, currency: Currency) -> Option<Decimal> {
        self.rates.get(&currency).copied()
    }
}

/// Cache directory: `$XDG_CACHE_HOME/fxview`, else the platform cache dir
pub fn get_cache_dir() -> Result<PathBuf> {
    let cache_dir = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(dir_spec::cache_home)
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?;
    Ok(cache_dir.join("fxview"))
}

pub fn default_cache_path() -> Result<PathBuf> {
    Ok(get_cache_dir()?.join(CACHE_FILENAME))
}

/// Fetches "home per foreign" rates with a time-limited file cache
pub struct RateFetcher {
    api_base: String,
    cache_path: PathBuf,
    max_age: Duration,
}

impl RateFetcher {
    pub fn new(cache_path: PathBuf, max_age_hours: u32) -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            cache_path,
            max_age: Duration::hours(i64::from(max_age_hours)),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Rates for `wanted` currencies expressed in `home`.
    ///
    /// A fresh cache covering every wanted currency is served without
    /// touching the network. When the fetch fails an expired cache is served
    /// instead; with no cache at all the error propagates.
    pub async fn rates_to_home(&self, home: Currency, wanted: &[Currency]) -> Result<HomeRates> {
        let wanted: Vec<Currency> = wanted.iter().copied().filter(|c| *c != home).collect();
        if wanted.is_empty() {
            return Ok(HomeRates {
                fetched_at: Utc::now(),
                rates: BTreeMap::new(),
                from_cache: false,
                stale: false,
            });
        }

        let cached = self.read_cache(home);
        if let Some(cache) = &cached {
            let age = Utc::now().signed_duration_since(cache.fetched_at);
            let covers = wanted.iter().all(|c| cache.rates.contains_key(c));
            if age < self.max_age && covers {
                debug!("Using cached FX rates (age: {}m)", age.num_minutes());
                return Ok(select(cache, &wanted, true, false));
            }
        }

        match self.fetch(home).await {
            Ok(cache) => {
                if let Err(e) = write_cache(&self.cache_path, &cache) {
                    warn!("Failed to write FX cache: {}", e);
                }
                Ok(select(&cache, &wanted, false, false))
            }
            Err(e) => match cached {
                Some(cache) => {
                    warn!(
                        "FX fetch failed ({}); using cached rates from {}",
                        e, cache.fetched_at
                    );
                    Ok(select(&cache, &wanted, true, true))
                }
                None => Err(e),
            },
        }
    }

    async fn fetch(&self, home: Currency) -> Result<RateCache> {
        let url = format!("{}/{}", self.api_base.trim_end_matches('/'), home);
        info!("Fetching FX rates from {}", url);

        let client: &Client = http_client()?;
        let response = client
            .get(&url)
            .send()
            .await
            .context("Failed to send request to exchange-rate API")?;

        if !response.status().is_success() {
            return Err(PortfolioError::PricingError(format!(
                "exchange-rate API returned status {}",
                response.status()
            ))
            .into());
        }

        let body: LatestResponse = response
            .json()
            .await
            .context("Failed to parse exchange-rate response")?;

        if body.result != "success" {
            return Err(PortfolioError::PricingError(format!(
                "exchange-rate API returned {}: {}",
                body.result,
                body.error_type.unwrap_or_default()
            ))
            .into());
        }

        Ok(RateCache {
            fetched_at: Utc::now(),
            home,
            rates: invert_rates(home, &body.rates),
        })
    }

    fn read_cache(&self, home: Currency) -> Option<RateCache> {
        let content = fs::read_to_string(&self.cache_path).ok()?;
        match serde_json::from_str::<RateCache>(&content) {
            Ok(cache) if cache.home == home => Some(cache),
            Ok(_) => {
                debug!("Ignoring FX cache for a different home currency");
                None
            }
            Err(e) => {
                warn!("Ignoring unreadable FX cache {:?}: {}", self.cache_path, e);
                None
            }
        }
    }
}

/// Turn "foreign per home" into "home per foreign", rounded to 8 places.
///
/// Unknown codes and zero rates are dropped.
pub fn invert_rates(home: Currency, raw: &HashMap<String, f64>) -> BTreeMap<Currency, Decimal> {
    raw.iter()
        .filter_map(|(code, value)| {
            let currency = Currency::from_str(code).ok()?;
            if currency == home {
                return None;
            }
            let per_home = Decimal::from_f64_retain(*value)?;
            if per_home <= Decimal::ZERO {
                return None;
            }
            Some((currency, (Decimal::ONE / per_home).round_dp(8)))
        })
        .collect()
}

pub fn write_cache(path: &Path, cache: &RateCache) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create FX cache directory")?;
    }
    let json = serde_json::to_string_pretty(cache)?;
    fs::write(path, json).context(format!("Failed to write {:?}", path))?;
    Ok(())
}

fn select(cache: &RateCache, wanted: &[Currency], from_cache: bool, stale: bool) -> HomeRates {
    HomeRates {
        fetched_at: cache.fetched_at,
        rates: cache
            .rates
            .iter()
            .filter(|(c, _)| wanted.contains(c))
            .map(|(c, r)| (*c, *r))
            .collect(),
        from_cache,
        stale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    // Nothing listens here, so any fetch fails fast
    const UNREACHABLE: &str = "http://127.0.0.1:9";

    fn cache_with_age(hours: i64) -> RateCache {
        RateCache {
            fetched_at: Utc::now() - Duration::hours(hours),
            home: Currency::Cad,
            rates: [(Currency::Usd, dec!(1.36)), (Currency::Eur, dec!(1.48))]
                .into_iter()
                .collect(),
        }
    }

    #[test]
    fn test_invert_rates() {
        let raw: HashMap<String, f64> = [
            ("CAD".to_string(), 1.0),
            ("USD".to_string(), 0.8),
            ("EUR".to_string(), 0.0),
            ("JPY".to_string(), 110.0),
        ]
        .into_iter()
        .collect();

        let rates = invert_rates(Currency::Cad, &raw);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[&Currency::Usd], dec!(1.25));
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_network() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILENAME);
        write_cache(&path, &cache_with_age(1)).unwrap();

        let fetcher = RateFetcher::new(path, 12).with_api_base(UNREACHABLE);
        let rates = fetcher
            .rates_to_home(Currency::Cad, &[Currency::Usd])
            .await
            .unwrap();

        assert!(rates.from_cache);
        assert!(!rates.stale);
        assert_eq!(rates.rate(Currency::Usd), Some(dec!(1.36)));
        assert_eq!(rates.rate(Currency::Eur), None);
    }

    #[tokio::test]
    async fn test_stale_cache_is_fallback_on_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CACHE_FILENAME);
        write_cache(&path, &cache_with_age(48)).unwrap();

        let fetcher = RateFetcher::new(path, 12).with_api_base(UNREACHABLE);
        let rates = fetcher
            .rates_to_home(Currency::Cad, &[Currency::Usd])
            .await
            .unwrap();

        assert!(rates.stale);
        assert_eq!(rates.rate(Currency::Usd), Some(dec!(1.36)));
    }

    #[tokio::test]
    async fn test_no_cache_and_no_network_is_an_error() {
        let dir = TempDir::new().unwrap();
        let fetcher =
            RateFetcher::new(dir.path().join(CACHE_FILENAME), 12).with_api_base(UNREACHABLE);

        assert!(fetcher
            .rates_to_home(Currency::Cad, &[Currency::Usd])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_home_only_request_needs_nothing() {
        let dir = TempDir::new().unwrap();
        let fetcher =
            RateFetcher::new(dir.path().join(CACHE_FILENAME), 12).with_api_base(UNREACHABLE);

        let rates = fetcher
            .rates_to_home(Currency::Cad, &[Currency::Cad])
            .await
            .unwrap();
        assert!(rates.rates.is_empty());
    }
}
