//! Metrics for evaluating forecast performance

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::models::{ForecastModel, ForecastResult};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::statistics::{Data, Median, Statistics};
use tracing::warn;

/// Fewest rows needed for holdout evaluation and residual-based intervals
const MIN_EVALUATION_ROWS: usize = 10;

/// Trailing rows used to estimate forecast residuals
const RESIDUAL_WINDOW: usize = 30;

/// Relative band used when residuals cannot be estimated
const FALLBACK_INTERVAL_MARGIN: f64 = 0.2;

/// Share of rows used for fitting in residual analysis
const RESIDUAL_TRAIN_SHARE: f64 = 0.7;

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::ValidationError(format!(
            "Actual length ({}) doesn't match predicted length ({})",
            actual.len(),
            predicted.len()
        )));
    }
    Ok(())
}

/// Mean Absolute Percentage Error over the pooled pairs.
///
/// Pairs with a zero actual are skipped. If every actual is zero the mean
/// absolute error is returned instead, and an empty input scores +infinity.
pub fn mape(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    if actual.is_empty() {
        return Ok(f64::INFINITY);
    }

    let (sum, count) = actual
        .iter()
        .zip(predicted)
        .filter(|&(&a, _)| a != 0.0)
        .fold((0.0, 0usize), |(s, c), (&a, &p)| {
            (s + ((a - p) / a).abs(), c + 1)
        });

    if count == 0 {
        return mae(actual, predicted);
    }

    Ok(sum / count as f64 * 100.0)
}

/// Mean Absolute Error
pub fn mae(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    if actual.is_empty() {
        return Ok(f64::INFINITY);
    }

    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();

    Ok(sum / actual.len() as f64)
}

/// Root Mean Squared Error
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    if actual.is_empty() {
        return Ok(f64::INFINITY);
    }

    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64;

    Ok(mse.sqrt())
}

/// Coefficient of determination; 0 when the actuals have no variance
pub fn r2(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    if actual.is_empty() {
        return Ok(0.0);
    }

    let mean = actual.iter().mean();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(0.0);
    }

    Ok(1.0 - ss_res / ss_tot)
}

/// Holdout performance of a model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastMetrics {
    /// Model name
    pub model: String,
    /// Mean Absolute Percentage Error
    pub mape: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
    /// Rows in the evaluated table
    pub data_points: usize,
    /// Rows held out for testing
    pub test_points: usize,
}

impl ForecastMetrics {
    fn unavailable(model: &str, data_points: usize) -> Self {
        Self {
            model: model.to_string(),
            mape: f64::INFINITY,
            mae: f64::INFINITY,
            rmse: f64::INFINITY,
            r2: 0.0,
            data_points,
            test_points: 0,
        }
    }
}

impl std::fmt::Display for ForecastMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Forecast Performance Metrics ({}):", self.model)?;
        writeln!(f, "  MAPE:  {:.4}%", self.mape)?;
        writeln!(f, "  MAE:   {:.4}", self.mae)?;
        writeln!(f, "  RMSE:  {:.4}", self.rmse)?;
        writeln!(f, "  R2:    {:.4}", self.r2)?;
        Ok(())
    }
}

/// Fit on the leading `1 - test_split` share of rows and score the rest.
///
/// Never fails: short tables and fit errors produce infinite error metrics.
pub fn evaluate_holdout(
    model: &dyn ForecastModel,
    features: &FeatureTable,
    test_split: f64,
) -> Result<ForecastMetrics> {
    if !(test_split > 0.0 && test_split < 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Test split must be between 0 and 1, got {}",
            test_split
        )));
    }

    let rows = features.len();
    if rows < MIN_EVALUATION_ROWS {
        return Ok(ForecastMetrics::unavailable(model.name(), rows));
    }

    let split = (rows as f64 * (1.0 - test_split)) as usize;
    let actual: Vec<f64> = features.quantities()[split..].to_vec();
    if actual.is_empty() {
        return Ok(ForecastMetrics::unavailable(model.name(), rows));
    }

    let mut trial = model.clone_box();
    let forecast = match trial
        .fit(&features.head(split))
        .and_then(|_| trial.predict(actual.len()))
    {
        Ok(forecast) => forecast.into_values(),
        Err(e) => {
            warn!(model = model.name(), error = %e, "holdout evaluation failed");
            return Ok(ForecastMetrics::unavailable(model.name(), rows));
        }
    };

    Ok(ForecastMetrics {
        model: model.name().to_string(),
        mape: mape(&actual, &forecast)?,
        mae: mae(&actual, &forecast)?,
        rmse: rmse(&actual, &forecast)?,
        r2: r2(&actual, &forecast)?,
        data_points: rows,
        test_points: actual.len(),
    })
}

/// Holdout metrics for several models, best MAPE first
pub fn compare_models(
    models: &[Box<dyn ForecastModel>],
    features: &FeatureTable,
) -> Result<Vec<ForecastMetrics>> {
    let mut results = models
        .iter()
        .map(|m| evaluate_holdout(m.as_ref(), features, 0.3))
        .collect::<Result<Vec<_>>>()?;

    results.sort_by(|a, b| a.mape.total_cmp(&b.mape));
    Ok(results)
}

/// Fit a fresh copy of `model` and attach a normal confidence band.
///
/// The band width comes from one-step residuals over the last 30 rows; with
/// fewer than 10 rows a fixed ±20% band is used.
pub fn confidence_interval(
    model: &dyn ForecastModel,
    features: &FeatureTable,
    horizon: usize,
    confidence_level: f64,
) -> Result<ForecastResult> {
    if confidence_level <= 0.0 || confidence_level >= 1.0 {
        return Err(ForecastError::ValidationError(
            "Confidence level must be between 0 and 1".to_string(),
        ));
    }

    let mut fitted = model.clone_box();
    fitted.fit(features)?;
    let forecast = fitted.predict(horizon)?;

    let intervals: Vec<(f64, f64)> = if features.len() >= MIN_EVALUATION_ROWS {
        let recent = features.tail(RESIDUAL_WINDOW);
        let actual = recent.quantities();

        let mut residuals = Vec::with_capacity(actual.len());
        for i in 0..actual.len() {
            let mut step_model = model.clone_box();
            step_model.fit(&recent.head(i.max(1)))?;
            let predicted = step_model.predict(1)?.values()[0];
            residuals.push(actual[i] - predicted);
        }

        let residual_std = residuals.iter().population_std_dev();
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::ForecastingError(e.to_string()))?;
        let margin = normal.inverse_cdf((1.0 + confidence_level) / 2.0) * residual_std;

        forecast
            .values()
            .iter()
            .map(|v| ((v - margin).max(0.0), v + margin))
            .collect()
    } else {
        forecast
            .values()
            .iter()
            .map(|v| {
                (
                    (v * (1.0 - FALLBACK_INTERVAL_MARGIN)).max(0.0),
                    v * (1.0 + FALLBACK_INTERVAL_MARGIN),
                )
            })
            .collect()
    };

    let status = forecast.status().clone();
    Ok(
        ForecastResult::new_with_intervals(forecast.into_values(), horizon, intervals)?
            .with_status(status),
    )
}

/// Summary statistics of out-of-sample residuals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidualStats {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    /// Third standardized moment; 0 when the residuals are constant
    pub skewness: f64,
    /// Fourth standardized moment (not excess); 0 when the residuals are constant
    pub kurtosis: f64,
}

impl ResidualStats {
    fn from_residuals(residuals: &[f64]) -> Self {
        let mean = residuals.iter().mean();
        let std = residuals.iter().population_std_dev();
        let moment = |power: i32| {
            if std > 0.0 {
                residuals
                    .iter()
                    .map(|r| ((r - mean) / std).powi(power))
                    .sum::<f64>()
                    / residuals.len() as f64
            } else {
                0.0
            }
        };

        Self {
            mean,
            std,
            min: Statistics::min(residuals.iter()),
            max: Statistics::max(residuals.iter()),
            median: Data::new(residuals.to_vec()).median(),
            skewness: moment(3),
            kurtosis: moment(4),
        }
    }
}

/// Out-of-sample residual diagnostics of a model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidualAnalysis {
    pub model: String,
    pub stats: ResidualStats,
    /// `actual - predicted` for each held-out day
    pub residuals: Vec<f64>,
    pub predictions: Vec<f64>,
    pub actuals: Vec<f64>,
}

/// Fit a copy of `model` on the first 70% of rows and study the residuals
/// of its forecast over the remaining rows.
pub fn residual_analysis(
    model: &dyn ForecastModel,
    features: &FeatureTable,
) -> Result<ResidualAnalysis> {
    let rows = features.len();
    if rows < MIN_EVALUATION_ROWS {
        return Err(ForecastError::DataError(format!(
            "Residual analysis needs at least {} rows, got {}",
            MIN_EVALUATION_ROWS, rows
        )));
    }

    let split = (rows as f64 * RESIDUAL_TRAIN_SHARE) as usize;
    let actuals = features.quantities()[split..].to_vec();

    let mut trial = model.clone_box();
    trial.fit(&features.head(split))?;
    let predictions = trial.predict(actuals.len())?.into_values();

    let residuals: Vec<f64> = actuals
        .iter()
        .zip(&predictions)
        .map(|(a, p)| a - p)
        .collect();

    Ok(ResidualAnalysis {
        model: model.name().to_string(),
        stats: ResidualStats::from_residuals(&residuals),
        residuals,
        predictions,
        actuals,
    })
}

/// Weighted average of several model forecasts.
///
/// Weights default to equal shares. Models that fail to fit or predict are
/// skipped and logged.
pub fn ensemble_forecast(
    models: &[Box<dyn ForecastModel>],
    features: &FeatureTable,
    horizon: usize,
    weights: Option<&[f64]>,
) -> Result<Vec<f64>> {
    if models.is_empty() {
        return Err(ForecastError::InvalidParameter(
            "Ensemble requires at least one model".to_string(),
        ));
    }

    let equal = vec![1.0 / models.len() as f64; models.len()];
    let weights = weights.unwrap_or(&equal);
    if weights.len() != models.len() {
        return Err(ForecastError::ValidationError(format!(
            "Got {} weights for {} models",
            weights.len(),
            models.len()
        )));
    }

    let mut ensemble = vec![0.0; horizon];
    for (model, &weight) in models.iter().zip(weights) {
        let mut member = model.clone_box();
        match member.fit(features).and_then(|_| member.predict(horizon)) {
            Ok(forecast) => {
                for (slot, value) in ensemble.iter_mut().zip(forecast.values()) {
                    *slot += weight * value;
                }
            }
            Err(e) => warn!(model = model.name(), error = %e, "ensemble member failed"),
        }
    }

    Ok(ensemble)
}
