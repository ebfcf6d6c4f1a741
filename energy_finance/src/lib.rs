//! # Energy Finance
//!
//! Financial evaluation of waste-to-energy projects.
//! This crate turns a representative daily waste quantity and a set of
//! operator parameters into yearly cashflows, NPV, payback, ROI, an
//! environmental impact estimate and one-factor-at-a-time sensitivities.

use thiserror::Error;

pub mod cashflow;
pub mod engine;
pub mod params;
pub mod sensitivity;

pub use cashflow::{CashflowYear, Payback};
pub use engine::{EnvironmentalImpact, FinanceEngine, FinancialSummary};
pub use params::{FinancialParameters, ParameterName};
pub use sensitivity::SensitivityResult;

/// Errors that can occur in financial calculations
#[derive(Error, Debug)]
pub enum FinanceError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown parameter: {0}")]
    UnknownParameter(String),

    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for finance operations
pub type Result<T> = std::result::Result<T, FinanceError>;

/// Emission factor of displaced grid electricity, kg CO2 per kWh
pub const CO2_KG_PER_KWH: f64 = 0.9;

/// Trees credited per ton of CO2 saved
pub const TREES_PER_TON_CO2: f64 = 50.0;

/// Tons of saleable byproduct per ton of waste processed
pub const BYPRODUCT_YIELD: f64 = 0.3;

/// Default yearly growth of the processed waste quantity
pub const DEFAULT_GROWTH_RATE: f64 = 0.02;

/// Longest evaluation horizon accepted, in years
pub const MAX_HORIZON_YEARS: u32 = 50;

pub(crate) const DAYS_PER_YEAR: f64 = 365.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FinanceError::UnknownParameter("interest".to_string());
        assert_eq!(err.to_string(), "Unknown parameter: interest");
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<f64>("not json").unwrap_err();
        assert!(matches!(
            FinanceError::from(json_err),
            FinanceError::Serialization(_)
        ));
    }
}
