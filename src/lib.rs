//! # BIA
//!
//! Decision support for small bio-energy operators: waste logs go in, a
//! waste forecast and a financial viability assessment come out.
//!
//! The heavy lifting lives in two member crates, re-exported here:
//!
//! - [`waste_forecast`]: feature engineering, forecasting models, backtesting and model selection
//! - [`energy_finance`]: cashflows, NPV, payback, ROI and sensitivity analysis
//!
//! This crate adds a storage port for entities and their logs and the
//! end-to-end [`SiteAssessment`].
//!
//! ## Example
//!
//! ```no_run
//! use bia::store::{EntityProfile, InMemoryLogStore, LogStore, WasteLog, WasteType};
//! use bia::{FinancialParameters, SiteAssessment};
//!
//! # fn main() -> bia::Result<()> {
//! let store = InMemoryLogStore::new();
//! store.add_entity(EntityProfile::new("pune-dairy", "Pune Dairy Co-op", "Pune", WasteType::Organic)?)?;
//! store.add_log(WasteLog::new("pune-dairy", "2024-01-01".parse().unwrap(), 12.5)?)?;
//!
//! let params = FinancialParameters::new(500.0, 0.85, 6.0, 200.0, 500_000.0, 2.0e7, 0.1, 15)?;
//! let report = SiteAssessment::new().assess_entity(&store, "pune-dairy", &params, 30)?;
//! println!("NPV: {:.0}", report.summary.npv);
//! # Ok(())
//! # }
//! ```

use thiserror::Error;

pub mod assessment;
pub mod store;

pub use assessment::{AssessmentReport, DailyForecast, SiteAssessment};
pub use energy_finance::{FinanceEngine, FinancialParameters, ParameterName};
pub use store::{InMemoryLogStore, LogStore, StoreError};
pub use waste_forecast::{FeatureBuilder, ForecastModel, ModelSelector, Observation};

pub use energy_finance;
pub use waste_forecast;

/// Errors from an end-to-end assessment
#[derive(Error, Debug)]
pub enum AssessmentError {
    #[error(transparent)]
    Forecast(#[from] waste_forecast::ForecastError),

    #[error(transparent)]
    Finance(#[from] energy_finance::FinanceError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for assessment operations
pub type Result<T> = std::result::Result<T, AssessmentError>;
