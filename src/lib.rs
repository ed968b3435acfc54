//! fxview - multi-currency portfolio tracker
//!
//! Keeps a daily history of prices and exchange rates for holdings spread
//! across accounts and currencies, and separates how much of a move came from
//! the market and how much from the exchange rate.

pub mod config;
pub mod db;
pub mod error;
pub mod importers;
pub mod pricing;
pub mod reports;
pub mod utils;
