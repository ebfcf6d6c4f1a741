//! Walk-forward backtesting of forecasting models
//!
//! The training window is anchored at the first row and grows by one test
//! block per step; every block is forecast by a model fitted only on the rows
//! before it.

use crate::error::{ForecastError, Result};
use crate::features::FeatureTable;
use crate::metrics::mape;
use crate::models::ForecastModel;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

/// Default number of days forecast per window
pub const DEFAULT_TEST_SIZE: usize = 7;

/// Default number of days in the first training window
pub const DEFAULT_MIN_TRAIN_SIZE: usize = 7;

/// One out-of-sample block of a walk-forward run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestWindow {
    /// Rows used for training, always a prefix of the table
    pub train_size: usize,
    /// First forecast day
    pub test_start: NaiveDate,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
}

/// Outcome of a walk-forward run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub model: String,
    pub windows: Vec<BacktestWindow>,
    /// Windows whose fit or forecast failed
    pub skipped_windows: usize,
    /// Pooled MAPE over all windows; +infinity when nothing could be scored
    pub mape: f64,
}

impl BacktestReport {
    fn empty(model: &str) -> Self {
        Self {
            model: model.to_string(),
            windows: Vec::new(),
            skipped_windows: 0,
            mape: f64::INFINITY,
        }
    }

    /// All actual values, window after window
    pub fn pooled_actual(&self) -> Vec<f64> {
        self.windows
            .iter()
            .flat_map(|w| w.actual.iter().copied())
            .collect()
    }

    /// All predicted values, window after window
    pub fn pooled_predicted(&self) -> Vec<f64> {
        self.windows
            .iter()
            .flat_map(|w| w.predicted.iter().copied())
            .collect()
    }
}

/// Anchored walk-forward backtester
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backtester {
    test_size: usize,
    min_train_size: usize,
}

impl Backtester {
    /// Create a backtester with explicit window sizes
    pub fn new(test_size: usize, min_train_size: usize) -> Result<Self> {
        if test_size == 0 {
            return Err(ForecastError::InvalidParameter(
                "Backtest test size must be at least 1".to_string(),
            ));
        }
        if min_train_size == 0 {
            return Err(ForecastError::InvalidParameter(
                "Backtest minimum training size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            test_size,
            min_train_size,
        })
    }

    /// Days forecast per window
    pub fn test_size(&self) -> usize {
        self.test_size
    }

    /// Days in the first training window
    pub fn min_train_size(&self) -> usize {
        self.min_train_size
    }

    /// Pooled walk-forward MAPE of `model`, +infinity when it cannot be scored
    pub fn score(&self, model: &dyn ForecastModel, features: &FeatureTable) -> f64 {
        self.run(model, features).mape
    }

    /// Run the walk-forward and keep every window.
    ///
    /// `model` itself is never refitted; each window works on a fresh clone.
    pub fn run(&self, model: &dyn ForecastModel, features: &FeatureTable) -> BacktestReport {
        let mut report = BacktestReport::empty(model.name());
        let rows = features.rows();

        if rows.len() < self.min_train_size + self.test_size {
            debug!(
                model = model.name(),
                rows = rows.len(),
                required = self.min_train_size + self.test_size,
                "not enough history to backtest"
            );
            return report;
        }

        let mut train_end = self.min_train_size;
        while train_end + self.test_size <= rows.len() {
            let test_rows = &rows[train_end..train_end + self.test_size];
            let actual: Vec<f64> = test_rows.iter().map(|r| r.quantity).collect();

            let mut trial = model.clone_box();
            let outcome = trial
                .fit(&features.head(train_end))
                .and_then(|_| trial.predict(self.test_size));

            match outcome {
                Ok(forecast) => {
                    debug!(model = model.name(), train_end, "backtest window scored");
                    report.windows.push(BacktestWindow {
                        train_size: train_end,
                        test_start: test_rows[0].date,
                        actual,
                        predicted: forecast.into_values(),
                    });
                }
                Err(e) => {
                    warn!(model = model.name(), train_end, error = %e, "backtest window failed");
                    report.skipped_windows += 1;
                }
            }

            train_end += self.test_size;
        }

        let actual = report.pooled_actual();
        let predicted = report.pooled_predicted();
        report.mape = match mape(&actual, &predicted) {
            Ok(score) => score,
            Err(e) => {
                warn!(model = model.name(), error = %e, "could not pool backtest errors");
                f64::INFINITY
            }
        };

        report
    }
}

impl Default for Backtester {
    fn default() -> Self {
        Self {
            test_size: DEFAULT_TEST_SIZE,
            min_train_size: DEFAULT_MIN_TRAIN_SIZE,
        }
    }
}
