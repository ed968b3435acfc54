//! User configuration (`$HOME/.fxview/config.toml`)
//!
//! Every key is optional; a missing file means all defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::db::{self, Currency, FxPair};
use crate::error::PortfolioError;

const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub home_currency: Currency,
    pub foreign_currency: Currency,
    /// Defaults to `$HOME/.fxview/portfolio.json`
    pub portfolio_file: Option<PathBuf>,
    /// Defaults to `$HOME/.fxview/data.db`
    pub db_path: Option<PathBuf>,
    pub default_window_days: u32,
    /// How old a cached price may be for `portfolio show`
    pub price_max_age_hours: u32,
    pub fx_cache_max_age_hours: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_currency: Currency::Cad,
            foreign_currency: Currency::Usd,
            portfolio_file: None,
            db_path: None,
            default_window_days: 30,
            price_max_age_hours: 72,
            fx_cache_max_age_hours: 12,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        Ok(db::get_data_dir()?.join(CONFIG_FILENAME))
    }

    /// Load from `path`, or the default location when None
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        if !path.exists() {
            debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content =
            std::fs::read_to_string(&path).context(format!("Failed to read {:?}", path))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| PortfolioError::ConfigError(format!("{:?}: {}", path, e)))?;
        config.validate()?;

        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Write the config, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context(format!("Failed to write {:?}", path))?;
        info!("Wrote config to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<(), PortfolioError> {
        if self.home_currency == self.foreign_currency {
            return Err(PortfolioError::ConfigError(format!(
                "home_currency and foreign_currency are both {}",
                self.home_currency
            )));
        }
        if self.default_window_days == 0 {
            return Err(PortfolioError::ConfigError(
                "default_window_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The pair the FX impact report converts with
    pub fn pair(&self) -> FxPair {
        FxPair::new(self.foreign_currency, self.home_currency)
    }

    pub fn portfolio_path(&self) -> Result<PathBuf> {
        match &self.portfolio_file {
            Some(p) => Ok(p.clone()),
            None => Ok(db::get_data_dir()?.join("portfolio.json")),
        }
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(p) => Ok(p.clone()),
            None => db::get_default_db_path(),
        }
    }

    /// Price age limit rounded up to whole days
    pub fn price_max_age_days(&self) -> u64 {
        u64::from(self.price_max_age_hours).div_ceil(24)
    }
}
