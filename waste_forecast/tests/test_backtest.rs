use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use waste_forecast::backtest::Backtester;
use waste_forecast::data::Observation;
use waste_forecast::error::{ForecastError, Result};
use waste_forecast::features::{FeatureBuilder, FeatureTable};
use waste_forecast::models::{
    DeterministicGrowthModel, ForecastModel, ForecastResult, ModelInfo, ModelKind, ModelStatus,
};

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
}

fn table(values: &[f64]) -> FeatureTable {
    let observations: Vec<Observation> = values
        .iter()
        .enumerate()
        .map(|(i, &q)| Observation::new(start() + Duration::days(i as i64), q))
        .collect();
    FeatureBuilder::build(&observations).unwrap()
}

/// Forecasts the last seen value; refuses to fit on fewer than `min_rows`
#[derive(Debug, Clone)]
struct LastValueModel {
    min_rows: usize,
    last: Option<f64>,
}

impl ForecastModel for LastValueModel {
    fn fit(&mut self, features: &FeatureTable) -> Result<()> {
        if features.len() < self.min_rows {
            return Err(ForecastError::DataError("too short".to_string()));
        }
        self.last = features.quantities().last().copied();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<ForecastResult> {
        let last = self
            .last
            .ok_or_else(|| ForecastError::NotFitted(self.name().to_string()))?;
        ForecastResult::new(vec![last; horizon], horizon)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: self.name().to_string(),
            kind: ModelKind::Deterministic,
            is_fitted: self.is_fitted(),
            status: ModelStatus::Unfitted,
            parameters: BTreeMap::new(),
            last_mape: None,
        }
    }

    fn name(&self) -> &str {
        "Last Value"
    }

    fn kind(&self) -> ModelKind {
        ModelKind::Deterministic
    }

    fn is_fitted(&self) -> bool {
        self.last.is_some()
    }

    fn clone_box(&self) -> Box<dyn ForecastModel> {
        Box::new(self.clone())
    }
}

#[test]
fn test_zero_sizes_are_rejected() {
    assert!(matches!(
        Backtester::new(0, 7),
        Err(ForecastError::InvalidParameter(_))
    ));
    assert!(matches!(
        Backtester::new(7, 0),
        Err(ForecastError::InvalidParameter(_))
    ));

    let backtester = Backtester::default();
    assert_eq!(backtester.test_size(), 7);
    assert_eq!(backtester.min_train_size(), 7);
}

#[test]
fn test_insufficient_history_scores_infinity() {
    let backtester = Backtester::default();
    let model = DeterministicGrowthModel::new();

    let score = backtester.score(&model, &table(&[5.0; 13]));
    assert!(score.is_infinite());

    let report = backtester.run(&model, &table(&[5.0; 13]));
    assert!(report.windows.is_empty());
}

#[test]
fn test_walk_forward_windows() {
    let backtester = Backtester::default();
    let model = LastValueModel {
        min_rows: 1,
        last: None,
    };
    let report = backtester.run(&model, &table(&[10.0; 28]));

    let train_sizes: Vec<usize> = report.windows.iter().map(|w| w.train_size).collect();
    assert_eq!(train_sizes, vec![7, 14, 21]);

    let test_starts: Vec<NaiveDate> = report.windows.iter().map(|w| w.test_start).collect();
    assert_eq!(
        test_starts,
        vec![
            start() + Duration::days(7),
            start() + Duration::days(14),
            start() + Duration::days(21)
        ]
    );

    assert_eq!(report.pooled_actual().len(), 21);
    assert_eq!(report.pooled_predicted().len(), 21);
    assert_relative_eq!(report.mape, 0.0);
}

#[test]
fn test_trailing_partial_window_is_ignored() {
    let backtester = Backtester::new(5, 10).unwrap();
    let model = LastValueModel {
        min_rows: 1,
        last: None,
    };

    // 10 + 5 + 5 = 20 fits two windows, the last 4 rows are never scored
    let report = backtester.run(&model, &table(&[3.0; 24]));
    assert_eq!(report.windows.len(), 2);
}

#[test]
fn test_candidate_is_not_refitted() {
    let backtester = Backtester::default();
    let model = DeterministicGrowthModel::new();

    let score = backtester.score(&model, &table(&[4.0; 30]));

    assert!(score.is_finite());
    assert!(!model.is_fitted());
}

#[test]
fn test_failed_windows_are_skipped() {
    let backtester = Backtester::default();
    let model = LastValueModel {
        min_rows: 14,
        last: None,
    };

    let values: Vec<f64> = (1..=28).map(|v| v as f64).collect();
    let report = backtester.run(&model, &table(&values));

    assert_eq!(report.skipped_windows, 1);
    assert_eq!(report.windows.len(), 2);
    assert!(report.mape.is_finite());
}

#[test]
fn test_all_windows_failing_scores_infinity() {
    let backtester = Backtester::default();
    let model = LastValueModel {
        min_rows: 1000,
        last: None,
    };

    let report = backtester.run(&model, &table(&[2.0; 28]));
    assert_eq!(report.skipped_windows, 3);
    assert!(report.mape.is_infinite());
}

#[test]
fn test_zero_actuals_fall_back_to_absolute_error() {
    let backtester = Backtester::new(2, 2).unwrap();
    let mut values = vec![1.0, 1.0];
    values.extend([0.0, 0.0]);
    let model = LastValueModel {
        min_rows: 1,
        last: None,
    };

    let score = backtester.score(&model, &table(&values));
    assert_relative_eq!(score, 1.0);
}
