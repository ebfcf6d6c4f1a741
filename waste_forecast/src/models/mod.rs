//! Forecasting models for daily waste series

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Debug};

/// Tag identifying a model variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Compounding growth from a recent base value
    Deterministic,
    /// Seasonal ARIMA with deterministic fallback
    Seasonal,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Deterministic => write!(f, "deterministic"),
            ModelKind::Seasonal => write!(f, "seasonal"),
        }
    }
}

/// Why a model is running on its simpler fallback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Not enough rows to fit the primary model
    InsufficientHistory { rows: usize },
    /// The series is constant
    ZeroVariance,
    /// The estimator was compiled out
    BackendUnavailable,
    /// The estimator returned an error
    FitFailed(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::InsufficientHistory { rows } => {
                write!(f, "insufficient history ({} rows)", rows)
            }
            FallbackReason::ZeroVariance => write!(f, "zero variance series"),
            FallbackReason::BackendUnavailable => write!(f, "seasonal estimator unavailable"),
            FallbackReason::FitFailed(msg) => write!(f, "fit failed: {}", msg),
        }
    }
}

/// Diagnostic state of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Unfitted,
    Fitted,
    Fallback(FallbackReason),
}

/// How a forecast was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastStatus {
    /// Produced by the model itself
    Modeled,
    /// Produced by the model's fallback
    Fallback(FallbackReason),
    /// Placeholder output after a prediction failure; not a real forecast
    Degenerate(String),
}

/// Forecast result containing predicted values
#[derive(Debug, Clone, Serialize)]
pub struct ForecastResult {
    /// Forecasted values, one per future day
    values: Vec<f64>,
    /// Number of periods forecasted
    horizons: usize,
    /// Confidence intervals (optional)
    intervals: Option<Vec<(f64, f64)>>,
    /// Provenance of the values
    status: ForecastStatus,
}

impl ForecastResult {
    /// Create a new forecast result
    pub fn new(values: Vec<f64>, horizons: usize) -> Result<Self> {
        if values.len() != horizons {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match horizons ({})",
                values.len(),
                horizons
            )));
        }

        Ok(Self {
            values,
            horizons,
            intervals: None,
            status: ForecastStatus::Modeled,
        })
    }

    /// Create a new forecast result with confidence intervals
    pub fn new_with_intervals(
        values: Vec<f64>,
        horizons: usize,
        intervals: Vec<(f64, f64)>,
    ) -> Result<Self> {
        if values.len() != intervals.len() {
            return Err(ForecastError::ValidationError(format!(
                "Values length ({}) doesn't match intervals length ({})",
                values.len(),
                intervals.len()
            )));
        }

        let mut result = Self::new(values, horizons)?;
        result.intervals = Some(intervals);
        Ok(result)
    }

    /// Constant 1.0 placeholder used when a fitted model cannot project
    pub(crate) fn degenerate(horizons: usize, reason: String) -> Self {
        Self {
            values: vec![1.0; horizons],
            horizons,
            intervals: None,
            status: ForecastStatus::Degenerate(reason),
        }
    }

    /// Replace the provenance marker
    pub fn with_status(mut self, status: ForecastStatus) -> Self {
        self.status = status;
        self
    }

    /// Get the forecasted values
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consume the result and return its values
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Get the number of periods forecasted
    pub fn horizons(&self) -> usize {
        self.horizons
    }

    /// Get the confidence intervals, if available
    pub fn intervals(&self) -> Option<&[(f64, f64)]> {
        self.intervals.as_deref()
    }

    /// Provenance of the values
    pub fn status(&self) -> &ForecastStatus {
        &self.status
    }

    /// True when the values are a placeholder rather than a forecast
    pub fn is_degenerate(&self) -> bool {
        matches!(self.status, ForecastStatus::Degenerate(_))
    }

    /// Calculate mean absolute error between forecast and actual values
    pub fn mean_absolute_error(&self, actual: &[f64]) -> Result<f64> {
        crate::metrics::mae(actual, &self.values)
    }

    /// Serialize the forecast to JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| ForecastError::DataError(format!("Failed to serialize forecast: {}", e)))
    }
}

/// Snapshot of a model for display and audit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub kind: ModelKind,
    pub is_fitted: bool,
    pub status: ModelStatus,
    pub parameters: BTreeMap<String, f64>,
    /// Walk-forward MAPE from the last selection run, if the model was scored
    pub last_mape: Option<f64>,
}

impl ModelInfo {
    /// Attach the backtest score the model was selected with
    pub fn with_last_mape(mut self, mape: Option<f64>) -> Self {
        self.last_mape = mape;
        self
    }
}

/// Fit/predict contract shared by all forecasting models.
///
/// `fit` is the only operation that mutates a model. A model instance is meant
/// to be owned by one request at a time; use [`ForecastModel::clone_box`] for
/// independent copies.
pub trait ForecastModel: Debug + Send + Sync {
    /// Fit the model to a feature table, replacing any previous fit
    fn fit(&mut self, features: &FeatureTable) -> Result<()>;

    /// Forecast the `horizon` days following the fitted history
    fn predict(&self, horizon: usize) -> Result<ForecastResult>;

    /// Current parameters and diagnostics
    fn info(&self) -> ModelInfo;

    /// Name of the model
    fn name(&self) -> &str;

    /// Variant tag
    fn kind(&self) -> ModelKind;

    /// Whether `fit` has completed
    fn is_fitted(&self) -> bool;

    /// Clone into a new boxed model
    fn clone_box(&self) -> Box<dyn ForecastModel>;
}

impl Clone for Box<dyn ForecastModel> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Reject a zero-length forecast request
pub(crate) fn validate_horizon(horizon: usize) -> Result<()> {
    if horizon == 0 {
        return Err(ForecastError::InvalidParameter(
            "Forecast horizon must be at least 1 day".to_string(),
        ));
    }
    Ok(())
}

/// Arithmetic mean, 0 for an empty slice
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub mod deterministic;
pub mod seasonal;
mod sarima;

pub use deterministic::DeterministicGrowthModel;
pub use seasonal::SeasonalModel;
