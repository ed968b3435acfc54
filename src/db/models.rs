use chrono::NaiveDate;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currencies a holding can be quoted in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Cad,
    Usd,
    Eur,
    Gbp,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Cad => "CAD",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
        }
    }
}

impl FromStr for Currency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CAD" => Ok(Currency::Cad),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single currency pair: 1 unit of `base` buys `rate` units of `quote`.
///
/// For the FX impact report the quote side is always the home currency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FxPair {
    pub base: Currency,
    pub quote: Currency,
}

impl FxPair {
    pub fn new(base: Currency, quote: Currency) -> Self {
        Self { base, quote }
    }

    /// Yahoo-style symbol, e.g. `USDCAD=X`
    pub fn symbol(&self) -> String {
        format!("{}{}=X", self.base, self.quote)
    }
}

impl fmt::Display for FxPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Registered account categories (Canadian tax wrappers plus catch-alls)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccountType {
    Tfsa,
    Rrsp,
    Fhsa,
    Resp,
    NonRegistered,
    Other,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Tfsa => "TFSA",
            AccountType::Rrsp => "RRSP",
            AccountType::Fhsa => "FHSA",
            AccountType::Resp => "RESP",
            AccountType::NonRegistered => "NON_REGISTERED",
            AccountType::Other => "OTHER",
        }
    }
}

impl FromStr for AccountType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_uppercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        match normalized.as_str() {
            "TFSA" => Ok(AccountType::Tfsa),
            "RRSP" | "RSP" => Ok(AccountType::Rrsp),
            "FHSA" => Ok(AccountType::Fhsa),
            "RESP" => Ok(AccountType::Resp),
            "NON_REGISTERED" | "NONREGISTERED" | "TAXABLE" | "CASH" | "MARGIN" => {
                Ok(AccountType::NonRegistered)
            }
            "OTHER" => Ok(AccountType::Other),
            _ => Err(()),
        }
    }
}

/// A position held in one account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Holding {
    pub ticker: String,
    pub shares: Decimal,
    /// Cost per share, in the holding's native currency
    pub cost_basis: Decimal,
    pub currency: Currency,
    /// Nickname of the owning account
    pub account: String,
}

impl Holding {
    pub fn cost_total(&self) -> Decimal {
        self.shares * self.cost_basis
    }
}

/// A named group of holdings. Accounts are siblings, never nested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub nickname: String,
    pub holder: String,
    pub account_type: AccountType,
    pub base_currency: Currency,
    pub holdings: Vec<Holding>,
}

/// The full set of accounts loaded for a session
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Portfolio {
    pub accounts: Vec<Account>,
}

impl Portfolio {
    /// All holdings across accounts, in file order
    pub fn holdings(&self) -> Vec<Holding> {
        self.accounts
            .iter()
            .flat_map(|a| a.holdings.iter().cloned())
            .collect()
    }

    /// Distinct tickers, in first-seen order
    pub fn tickers(&self) -> Vec<String> {
        self.accounts
            .iter()
            .flat_map(|a| a.holdings.iter())
            .map(|h| h.ticker.clone())
            .unique()
            .collect()
    }

    /// Native currency of a ticker (first holding wins)
    pub fn currency_of(&self, ticker: &str) -> Option<Currency> {
        self.accounts
            .iter()
            .flat_map(|a| a.holdings.iter())
            .find(|h| h.ticker == ticker)
            .map(|h| h.currency)
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.iter().all(|a| a.holdings.is_empty())
    }
}

/// One persisted (date, ticker) price observation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SnapshotRow {
    pub date: NaiveDate,
    pub ticker: String,
    pub price: Decimal,
    pub currency: Currency,
}

/// One persisted daily rate for a single currency pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FxRateRow {
    pub date: NaiveDate,
    pub rate: Decimal,
}

/// What an idempotent write did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Where a stored observation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationSource {
    Csv,
    YahooCsv,
    Manual,
    ErApi,
}

impl ObservationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObservationSource::Csv => "CSV",
            ObservationSource::YahooCsv => "YAHOO_CSV",
            ObservationSource::Manual => "MANUAL",
            ObservationSource::ErApi => "ER_API",
        }
    }
}
