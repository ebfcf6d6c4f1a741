//! # Waste Forecast
//!
//! Daily waste-volume forecasting for bio-energy sites.
//!
//! ## Features
//!
//! - Observation loading from CSV logs
//! - Feature engineering over a gap-free daily series (calendar, lag, rolling and trend features)
//! - Forecasting models (Deterministic growth, Seasonal ARIMA with deterministic fallback)
//! - Walk-forward backtesting and backtest-driven model selection
//! - Holdout metrics, confidence intervals and ensembles
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use waste_forecast::data::ObservationLoader;
//! use waste_forecast::features::FeatureBuilder;
//! use waste_forecast::models::ForecastModel;
//! use waste_forecast::selection::ModelSelector;
//!
//! # fn main() -> waste_forecast::Result<()> {
//! // Load logs
//! let observations = ObservationLoader::from_csv("waste_log.csv")?;
//!
//! // Build the daily feature table
//! let features = FeatureBuilder::build(&observations)?;
//!
//! // Pick the model with the lowest backtest error
//! let mut selector = ModelSelector::with_default_candidates();
//! let model = selector.select_best_model(&features);
//!
//! // Forecast the next 30 days
//! let forecast = model.predict(30)?;
//! let dates = features.forecast_dates(30);
//! # Ok(())
//! # }
//! ```

pub mod backtest;
pub mod data;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod selection;

// Re-export commonly used types
pub use crate::backtest::{BacktestReport, Backtester};
pub use crate::data::{Observation, ObservationLoader};
pub use crate::error::{ForecastError, Result};
pub use crate::features::{FeatureBuilder, FeatureRow, FeatureTable};
pub use crate::models::{
    DeterministicGrowthModel, ForecastModel, ForecastResult, ForecastStatus, ModelKind,
    SeasonalModel,
};
pub use crate::selection::ModelSelector;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
