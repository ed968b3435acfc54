// Reports module - FX impact and current valuation

pub mod fx_impact;
pub mod portfolio;

pub use fx_impact::{
    calculate_fx_impact, FxImpactPoint, FxImpactReport, LegValue, Notice, SeriesMode, Window,
};
pub use portfolio::{value_portfolio, PortfolioValuation, PositionValue};
