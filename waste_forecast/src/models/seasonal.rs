//! Seasonal ARIMA model with deterministic fallback

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::models::deterministic::DeterministicGrowthModel;
use crate::models::sarima::SarimaFit;
use crate::models::{
    validate_horizon, FallbackReason, ForecastModel, ForecastResult, ForecastStatus, ModelInfo,
    ModelKind, ModelStatus,
};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use tracing::{debug, error, warn};

/// Fewest rows the seasonal fit is attempted on
pub const MIN_SEASONAL_ROWS: usize = 10;

/// Default seasonal period
pub const DEFAULT_SEASONAL_PERIOD: usize = 12;

#[derive(Debug, Clone)]
enum SeasonalState {
    Unfitted,
    Fitted(SarimaFit),
    Fallback {
        model: DeterministicGrowthModel,
        reason: FallbackReason,
    },
}

/// SARIMA(1,1,1)(0,1,1)s model over the zero-filled daily series.
///
/// When the series is too short or flat, or the estimator fails, the model
/// fits a [`DeterministicGrowthModel`] instead and records why in its status.
#[derive(Debug, Clone)]
pub struct SeasonalModel {
    /// Name of the model
    name: String,
    /// Seasonal period in days
    period: usize,
    state: SeasonalState,
}

impl SeasonalModel {
    /// Create a new model with the default seasonal period of 12
    pub fn new() -> Self {
        Self {
            name: format!("SARIMA(1,1,1)(0,1,1,{})", DEFAULT_SEASONAL_PERIOD),
            period: DEFAULT_SEASONAL_PERIOD,
            state: SeasonalState::Unfitted,
        }
    }

    /// Create a model with a custom seasonal period
    pub fn with_period(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                period
            )));
        }

        Ok(Self {
            name: format!("SARIMA(1,1,1)(0,1,1,{})", period),
            period,
            state: SeasonalState::Unfitted,
        })
    }

    /// Seasonal period in days
    pub fn period(&self) -> usize {
        self.period
    }

    /// Whether predictions are delegated to the deterministic fallback
    pub fn is_fallback(&self) -> bool {
        matches!(self.state, SeasonalState::Fallback { .. })
    }

    /// Diagnostic status of the current fit
    pub fn status(&self) -> ModelStatus {
        match &self.state {
            SeasonalState::Unfitted => ModelStatus::Unfitted,
            SeasonalState::Fitted(_) => ModelStatus::Fitted,
            SeasonalState::Fallback { reason, .. } => ModelStatus::Fallback(reason.clone()),
        }
    }

    fn fall_back(&mut self, features: &FeatureTable, reason: FallbackReason) -> Result<()> {
        warn!(model = %self.name, %reason, "seasonal fit unavailable, using deterministic fallback");

        let mut model = DeterministicGrowthModel::new();
        model.fit(features)?;
        self.state = SeasonalState::Fallback { model, reason };

        Ok(())
    }
}

impl Default for SeasonalModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ForecastModel for SeasonalModel {
    fn fit(&mut self, features: &FeatureTable) -> Result<()> {
        self.state = SeasonalState::Unfitted;
        let series = features.quantities();

        if series.len() < MIN_SEASONAL_ROWS {
            return self.fall_back(
                features,
                FallbackReason::InsufficientHistory { rows: series.len() },
            );
        }

        if series.iter().population_std_dev() == 0.0 {
            return self.fall_back(features, FallbackReason::ZeroVariance);
        }

        if !cfg!(feature = "seasonal-fit") {
            return self.fall_back(features, FallbackReason::BackendUnavailable);
        }

        match SarimaFit::estimate(&series, self.period) {
            Ok(fit) => {
                debug!(
                    ar = fit.ar,
                    ma = fit.ma,
                    seasonal_ma = fit.seasonal_ma,
                    aic = fit.aic,
                    "fitted seasonal model"
                );
                self.state = SeasonalState::Fitted(fit);
                Ok(())
            }
            Err(e) => self.fall_back(features, FallbackReason::FitFailed(e.to_string())),
        }
    }

    fn predict(&self, horizon: usize) -> Result<ForecastResult> {
        validate_horizon(horizon)?;

        match &self.state {
            SeasonalState::Unfitted => Err(ForecastError::NotFitted(self.name.clone())),
            SeasonalState::Fallback { model, reason } => Ok(model
                .predict(horizon)?
                .with_status(ForecastStatus::Fallback(reason.clone()))),
            SeasonalState::Fitted(fit) => {
                let raw = fit.forecast(horizon);
                if raw.len() != horizon || raw.iter().any(|v| !v.is_finite()) {
                    error!(
                        model = %self.name,
                        horizon,
                        "seasonal projection produced non-finite values, returning degenerate forecast"
                    );
                    return Ok(ForecastResult::degenerate(
                        horizon,
                        "non-finite seasonal projection".to_string(),
                    ));
                }

                let values = raw.into_iter().map(|v| v.max(0.0)).collect();
                ForecastResult::new(values, horizon)
            }
        }
    }

    fn info(&self) -> ModelInfo {
        let mut parameters = BTreeMap::new();
        parameters.insert("period".to_string(), self.period as f64);

        match &self.state {
            SeasonalState::Unfitted => {}
            SeasonalState::Fitted(fit) => {
                parameters.insert("ar".to_string(), fit.ar);
                parameters.insert("ma".to_string(), fit.ma);
                parameters.insert("seasonal_ma".to_string(), fit.seasonal_ma);
                parameters.insert("sigma2".to_string(), fit.sigma2);
                parameters.insert("aic".to_string(), fit.aic);
                parameters.insert("bic".to_string(), fit.bic);
            }
            SeasonalState::Fallback { model, .. } => {
                parameters.extend(model.info().parameters);
            }
        }

        ModelInfo {
            name: self.name.clone(),
            kind: ModelKind::Seasonal,
            is_fitted: self.is_fitted(),
            status: self.status(),
            parameters,
            last_mape: None,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Seasonal
    }

    fn is_fitted(&self) -> bool {
        !matches!(self.state, SeasonalState::Unfitted)
    }

    fn clone_box(&self) -> Box<dyn ForecastModel> {
        Box::new(self.clone())
    }
}
