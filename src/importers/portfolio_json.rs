//! Portfolio file loader
//!
//! ```json
//! { "accounts": [ { "nickname": "tfsa", "holder": "Alex", "type": "TFSA",
//!                   "base_currency": "CAD",
//!                   "holdings": [ { "ticker": "VFV.TO", "shares": 10, "cost_basis": 95.5 } ] } ] }
//! ```
//!
//! The older flat layout `{ "holdings": [...] }` is still accepted and loads
//! into a single implicit account.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

use crate::db::{Account, AccountType, Currency, Holding, Portfolio};
use crate::error::PortfolioError;

#[derive(Debug, Deserialize)]
struct PortfolioFile {
    #[serde(default)]
    accounts: Option<Vec<AccountEntry>>,
    #[serde(default)]
    holdings: Option<Vec<HoldingEntry>>,
}

#[derive(Debug, Deserialize)]
struct AccountEntry {
    nickname: String,
    #[serde(default)]
    holder: String,
    #[serde(rename = "type", default)]
    account_type: Option<String>,
    #[serde(default)]
    base_currency: Option<String>,
    #[serde(default)]
    holdings: Vec<HoldingEntry>,
}

#[derive(Debug, Deserialize)]
struct HoldingEntry {
    ticker: String,
    shares: Decimal,
    cost_basis: Decimal,
    #[serde(default)]
    currency: Option<String>,
}

pub fn load_portfolio<P: AsRef<Path>>(file_path: P, home: Currency) -> Result<Portfolio> {
    let path = file_path.as_ref();
    let content = std::fs::read_to_string(path)
        .context(format!("Failed to read portfolio file {:?}", path))?;

    let portfolio = parse_portfolio(&content, home)
        .context(format!("Invalid portfolio file {:?}", path))?;

    info!(
        "Loaded {} accounts, {} holdings from {:?}",
        portfolio.accounts.len(),
        portfolio.holdings().len(),
        path
    );
    Ok(portfolio)
}

pub fn parse_portfolio(content: &str, home: Currency) -> Result<Portfolio> {
    let file: PortfolioFile = serde_json::from_str(content).context("Failed to parse JSON")?;

    let entries = match (file.accounts, file.holdings) {
        (Some(accounts), _) => accounts,
        (None, Some(holdings)) => vec![AccountEntry {
            nickname: "default".to_string(),
            holder: String::new(),
            account_type: None,
            base_currency: None,
            holdings,
        }],
        (None, None) => {
            return Err(PortfolioError::ValidationError(
                "expected an \"accounts\" or \"holdings\" list".to_string(),
            )
            .into())
        }
    };

    let accounts = entries
        .into_iter()
        .map(|entry| build_account(entry, home))
        .collect::<Result<Vec<_>>>()?;

    Ok(Portfolio { accounts })
}

fn build_account(entry: AccountEntry, home: Currency) -> Result<Account> {
    if entry.nickname.trim().is_empty() {
        let msg = "account without nickname".to_string();
        return Err(PortfolioError::ValidationError(msg).into());
    }

    let base_currency = match entry.base_currency.as_deref() {
        Some(code) => parse_currency(code)?,
        None => home,
    };

    let account_type = match entry.account_type.as_deref() {
        Some(raw) => AccountType::from_str(raw).unwrap_or_else(|_| {
            warn!("Unknown account type '{}' for {}", raw, entry.nickname);
            AccountType::Other
        }),
        None => AccountType::Other,
    };

    let mut holdings = Vec::with_capacity(entry.holdings.len());
    for h in entry.holdings {
        let ticker = h.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(PortfolioError::ValidationError(format!(
                "holding without ticker in account {}",
                entry.nickname
            ))
            .into());
        }
        if h.shares < Decimal::ZERO || h.cost_basis < Decimal::ZERO {
            return Err(PortfolioError::ValidationError(format!(
                "{} in {} has negative shares or cost basis",
                ticker, entry.nickname
            ))
            .into());
        }

        let currency = match h.currency.as_deref() {
            Some(code) => parse_currency(code)?,
            None => base_currency,
        };

        holdings.push(Holding {
            ticker,
            shares: h.shares,
            cost_basis: h.cost_basis,
            currency,
            account: entry.nickname.clone(),
        });
    }

    Ok(Account {
        nickname: entry.nickname,
        holder: entry.holder,
        account_type,
        base_currency,
        holdings,
    })
}

fn parse_currency(code: &str) -> Result<Currency> {
    Currency::from_str(code).map_err(|_| {
        PortfolioError::ValidationError(format!("unsupported currency '{}'", code)).into()
    })
}
