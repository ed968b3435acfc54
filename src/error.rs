//! Error handling for fxview
//!
//! Defines custom error types and establishes a unified Result type
//! using anyhow for context chaining and error propagation.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Core error types for import, pricing and configuration operations
#[derive(Error, Debug)]
pub enum PortfolioError {
    #[error("parse error: {0}")]
    ParseError(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("pricing error: {0}")]
    PricingError(String),

    #[error("config error: {0}")]
    ConfigError(String),
}

/// Provider-contract violations detected by the FX impact calculator.
///
/// Everything else the calculator runs into (empty inputs, bad rows, missing
/// tickers) degrades the report instead of failing it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalculationError {
    #[error("conflicting snapshot rows for {ticker} on {date}: {first} vs {second}")]
    ConflictingSnapshot {
        date: NaiveDate,
        ticker: String,
        first: Decimal,
        second: Decimal,
    },

    #[error("conflicting FX rates on {date}: {first} vs {second}")]
    ConflictingFxRate {
        date: NaiveDate,
        first: Decimal,
        second: Decimal,
    },
}

/// Result type alias for fxview operations
pub type Result<T> = anyhow::Result<T>;
