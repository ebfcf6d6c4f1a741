//! Deterministic compounding-growth model

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::models::{
    mean, validate_horizon, ForecastModel, ForecastResult, ModelInfo, ModelKind, ModelStatus,
};
use std::collections::BTreeMap;
use tracing::debug;

/// Daily growth used when the history cannot support an estimate (~0.2%/day)
pub const DEFAULT_GROWTH_RATE: f64 = 0.002;

/// Bound on the absolute daily growth rate
pub const MAX_DAILY_GROWTH: f64 = 0.01;

/// Number of trailing days averaged into the base value
const BASE_WINDOW: usize = 7;

/// Minimum rows before the half-over-half growth estimate is used
const MIN_ROWS_FOR_GROWTH: usize = 14;

/// Simple deterministic growth model.
///
/// Forecasts `base_value * (1 + growth_rate)^t` for offset `t` days ahead.
#[derive(Debug, Clone)]
pub struct DeterministicGrowthModel {
    /// Name of the model
    name: String,
    /// Rate used when growth cannot be estimated
    default_growth_rate: f64,
    /// Mean of the most recent quantities
    base_value: f64,
    /// Fitted per-day compounding rate
    growth_rate: f64,
    is_fitted: bool,
}

impl DeterministicGrowthModel {
    /// Create a new model with the default fallback growth rate
    pub fn new() -> Self {
        Self {
            name: "Deterministic Growth".to_string(),
            default_growth_rate: DEFAULT_GROWTH_RATE,
            base_value: 0.0,
            growth_rate: DEFAULT_GROWTH_RATE,
            is_fitted: false,
        }
    }

    /// Create a model with a custom fallback growth rate
    pub fn with_default_growth_rate(rate: f64) -> Result<Self> {
        if !rate.is_finite() || rate.abs() > MAX_DAILY_GROWTH {
            return Err(ForecastError::InvalidParameter(format!(
                "Default growth rate must lie within [-{0}, {0}], got {1}",
                MAX_DAILY_GROWTH, rate
            )));
        }

        Ok(Self {
            default_growth_rate: rate,
            growth_rate: rate,
            ..Self::new()
        })
    }

    /// Fitted base value
    pub fn base_value(&self) -> f64 {
        self.base_value
    }

    /// Fitted daily growth rate
    pub fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    /// Compare first-half and second-half means and express the ratio as a
    /// clamped per-day compounding rate
    fn estimate_growth(&self, quantities: &[f64]) -> f64 {
        if quantities.len() < MIN_ROWS_FOR_GROWTH {
            return self.default_growth_rate;
        }

        let mid = quantities.len() / 2;
        let first_half = mean(&quantities[..mid]);
        let second_half = mean(&quantities[mid..]);

        if first_half <= 0.0 {
            return self.default_growth_rate;
        }

        let periods = (quantities.len() - mid) as f64;
        let rate = (second_half / first_half).powf(1.0 / periods) - 1.0;

        if rate.is_finite() {
            rate.clamp(-MAX_DAILY_GROWTH, MAX_DAILY_GROWTH)
        } else {
            self.default_growth_rate
        }
    }
}

impl Default for DeterministicGrowthModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastModel for DeterministicGrowthModel {
    fn fit(&mut self, features: &FeatureTable) -> Result<()> {
        let quantities = features.quantities();

        if quantities.is_empty() {
            self.base_value = 1.0;
            self.growth_rate = self.default_growth_rate;
        } else {
            let recent = &quantities[quantities.len().saturating_sub(BASE_WINDOW)..];
            self.base_value = mean(recent);
            self.growth_rate = self.estimate_growth(&quantities);
        }

        self.is_fitted = true;
        debug!(
            base_value = self.base_value,
            growth_rate = self.growth_rate,
            rows = quantities.len(),
            "fitted deterministic growth model"
        );

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<ForecastResult> {
        validate_horizon(horizon)?;
        if !self.is_fitted {
            return Err(ForecastError::NotFitted(self.name.clone()));
        }

        let values = (1..=horizon)
            .map(|t| (self.base_value * (1.0 + self.growth_rate).powi(t as i32)).max(0.0))
            .collect();

        ForecastResult::new(values, horizon)
    }

    fn info(&self) -> ModelInfo {
        let mut parameters = BTreeMap::new();
        if self.is_fitted {
            parameters.insert("base_value".to_string(), self.base_value);
            parameters.insert("growth_rate".to_string(), self.growth_rate);
        }

        ModelInfo {
            name: self.name.clone(),
            kind: ModelKind::Deterministic,
            is_fitted: self.is_fitted,
            status: if self.is_fitted {
                ModelStatus::Fitted
            } else {
                ModelStatus::Unfitted
            },
            parameters,
            last_mape: None,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Deterministic
    }

    fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn clone_box(&self) -> Box<dyn ForecastModel> {
        Box::new(self.clone())
    }
}
