use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;
use waste_forecast::data::Observation;
use waste_forecast::error::ForecastError;
use waste_forecast::features::{FeatureBuilder, FeatureTable};
use waste_forecast::models::deterministic::{DEFAULT_GROWTH_RATE, MAX_DAILY_GROWTH};
use waste_forecast::models::{
    DeterministicGrowthModel, FallbackReason, ForecastModel, ForecastStatus, ModelKind,
    ModelStatus, SeasonalModel,
};

fn table(values: &[f64]) -> FeatureTable {
    let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let observations: Vec<Observation> = values
        .iter()
        .enumerate()
        .map(|(i, &q)| Observation::new(start + Duration::days(i as i64), q))
        .collect();
    FeatureBuilder::build(&observations).unwrap()
}

fn noisy_seasonal_series(days: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let pattern = [1.0, 1.1, 0.9, 1.2, 1.0, 0.7, 0.6];
    (0..days)
        .map(|d| 30.0 * pattern[d % 7] + 0.05 * d as f64 + rng.gen_range(-1.0..1.0))
        .collect()
}

#[test]
fn test_deterministic_flat_series() {
    let mut model = DeterministicGrowthModel::new();
    model.fit(&table(&[10.0; 20])).unwrap();

    assert!(model.is_fitted());
    assert_relative_eq!(model.base_value(), 10.0);
    assert_relative_eq!(model.growth_rate(), 0.0);

    let forecast = model.predict(5).unwrap();
    assert_eq!(forecast.horizons(), 5);
    assert_eq!(forecast.status(), &ForecastStatus::Modeled);
    for value in forecast.values() {
        assert_relative_eq!(*value, 10.0);
    }
}

#[test]
fn test_deterministic_short_history_uses_default_rate() {
    let values = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0, 14.0, 16.0, 18.0, 20.0];
    let mut model = DeterministicGrowthModel::new();
    model.fit(&table(&values)).unwrap();

    // Mean of the last seven values
    assert_relative_eq!(model.base_value(), 14.0);
    assert_relative_eq!(model.growth_rate(), DEFAULT_GROWTH_RATE);

    let forecast = model.predict(2).unwrap();
    assert_relative_eq!(forecast.values()[0], 14.0 * 1.002, epsilon = 1e-12);
    assert_relative_eq!(forecast.values()[1], 14.0 * 1.002f64.powi(2), epsilon = 1e-12);
}

#[test]
fn test_deterministic_half_over_half_rate() {
    // First half mean 10, second half mean 12.1 over 7 periods
    let mut long = vec![10.0; 7];
    long.extend([12.1; 7]);

    let mut model = DeterministicGrowthModel::new();
    model.fit(&table(&long)).unwrap();

    let expected = (12.1f64 / 10.0).powf(1.0 / 7.0) - 1.0;
    assert_relative_eq!(model.growth_rate(), expected, epsilon = 1e-12);
}

#[rstest]
#[case(1.0, 100.0, MAX_DAILY_GROWTH)]
#[case(100.0, 1.0, -MAX_DAILY_GROWTH)]
fn test_deterministic_growth_is_clamped(
    #[case] first: f64,
    #[case] second: f64,
    #[case] expected: f64,
) {
    let mut values = vec![first; 10];
    values.extend(vec![second; 10]);

    let mut model = DeterministicGrowthModel::new();
    model.fit(&table(&values)).unwrap();

    assert_relative_eq!(model.growth_rate(), expected);
    assert!(model.predict(60).unwrap().values().iter().all(|v| *v >= 0.0));
}

#[test]
fn test_deterministic_non_positive_first_half() {
    let mut values = vec![0.0; 8];
    values.extend([5.0; 8]);

    let mut model = DeterministicGrowthModel::with_default_growth_rate(0.001).unwrap();
    model.fit(&table(&values)).unwrap();

    assert_relative_eq!(model.growth_rate(), 0.001);
}

#[test]
fn test_deterministic_empty_table() {
    let mut model = DeterministicGrowthModel::new();
    model.fit(&FeatureTable::default()).unwrap();

    assert_relative_eq!(model.base_value(), 1.0);
    assert_relative_eq!(model.growth_rate(), DEFAULT_GROWTH_RATE);
}

#[test]
fn test_default_growth_rate_bounds() {
    assert!(DeterministicGrowthModel::with_default_growth_rate(0.01).is_ok());
    assert!(matches!(
        DeterministicGrowthModel::with_default_growth_rate(0.02),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_predict_contract_violations() {
    let model = DeterministicGrowthModel::new();
    assert!(matches!(model.predict(3), Err(ForecastError::NotFitted(_))));

    let mut fitted = DeterministicGrowthModel::new();
    fitted.fit(&table(&[1.0, 2.0])).unwrap();
    assert!(matches!(
        fitted.predict(0),
        Err(ForecastError::InvalidParameter(_))
    ));

    let seasonal = SeasonalModel::new();
    assert!(matches!(seasonal.predict(3), Err(ForecastError::NotFitted(_))));
    assert!(matches!(
        seasonal.predict(0),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_seasonal_falls_back_on_short_history() {
    let features = table(&[3.0, 5.0, 4.0, 6.0, 5.0]);
    let mut model = SeasonalModel::new();
    model.fit(&features).unwrap();

    assert!(model.is_fitted());
    assert!(model.is_fallback());
    let reason = FallbackReason::InsufficientHistory { rows: 5 };
    assert_eq!(model.status(), ModelStatus::Fallback(reason.clone()));

    let mut reference = DeterministicGrowthModel::new();
    reference.fit(&features).unwrap();

    let forecast = model.predict(4).unwrap();
    assert_eq!(forecast.values(), reference.predict(4).unwrap().values());
    assert_eq!(forecast.status(), &ForecastStatus::Fallback(reason));
}

#[test]
fn test_seasonal_falls_back_on_flat_series() {
    let mut model = SeasonalModel::new();
    model.fit(&table(&[7.0; 40])).unwrap();

    assert_eq!(
        model.status(),
        ModelStatus::Fallback(FallbackReason::ZeroVariance)
    );
    for value in model.predict(3).unwrap().values() {
        assert!(*value >= 7.0);
    }
}

#[test]
fn test_seasonal_falls_back_when_differencing_leaves_too_little() {
    let values: Vec<f64> = (0..15).map(|d| 10.0 + (d % 3) as f64).collect();
    let mut model = SeasonalModel::new();
    model.fit(&table(&values)).unwrap();

    assert!(matches!(
        model.status(),
        ModelStatus::Fallback(FallbackReason::FitFailed(_))
    ));
}

#[cfg(feature = "seasonal-fit")]
#[test]
fn test_seasonal_fit_on_long_series() {
    let features = table(&noisy_seasonal_series(90, 7));
    let mut model = SeasonalModel::new();
    model.fit(&features).unwrap();

    assert_eq!(model.status(), ModelStatus::Fitted);
    assert!(!model.is_fallback());

    let info = model.info();
    assert_eq!(info.kind, ModelKind::Seasonal);
    for key in ["ar", "ma", "seasonal_ma", "aic", "bic", "sigma2"] {
        assert!(info.parameters.contains_key(key), "missing {}", key);
    }

    let forecast = model.predict(30).unwrap();
    assert_eq!(forecast.values().len(), 30);
    assert_eq!(forecast.status(), &ForecastStatus::Modeled);
    assert!(forecast.values().iter().all(|v| v.is_finite() && *v >= 0.0));
}

#[cfg(feature = "seasonal-fit")]
#[test]
fn test_seasonal_forecast_near_float_limit_stays_finite() {
    let values: Vec<f64> = (0..48)
        .map(|d| if d % 12 < 6 { 1e308 } else { 0.9e308 })
        .collect();
    let mut model = SeasonalModel::new();
    model.fit(&table(&values)).unwrap();
    assert_eq!(model.status(), ModelStatus::Fitted);

    let forecast = model.predict(3).unwrap();
    assert_eq!(forecast.status(), &ForecastStatus::Modeled);
    for (h, value) in forecast.values().iter().enumerate() {
        assert_relative_eq!(*value, values[h], max_relative = 1e-9);
    }
}

#[cfg(feature = "seasonal-fit")]
#[test]
fn test_seasonal_overflowing_projection_is_degenerate() {
    // Exact powers of two keep the differenced series at zero, so the fit
    // succeeds and the linear trend is carried past f64::MAX
    let base = 2f64.powi(1023);
    let step = 2f64.powi(1017);
    let values: Vec<f64> = (0..48).map(|d| base + d as f64 * step).collect();

    let mut model = SeasonalModel::new();
    model.fit(&table(&values)).unwrap();
    assert_eq!(model.status(), ModelStatus::Fitted);

    let forecast = model.predict(30).unwrap();
    assert!(forecast.is_degenerate());
    assert!(matches!(forecast.status(), ForecastStatus::Degenerate(_)));
    assert_eq!(forecast.values(), &[1.0; 30][..]);
}

#[test]
fn test_seasonal_with_custom_period() {
    let model = SeasonalModel::with_period(7).unwrap();
    assert_eq!(model.period(), 7);
    assert_eq!(model.name(), "SARIMA(1,1,1)(0,1,1,7)");
    assert!(matches!(
        SeasonalModel::with_period(1),
        Err(ForecastError::InvalidParameter(_))
    ));
}

#[test]
fn test_predictions_are_non_negative() {
    // Collapsing series pushes both models toward zero
    let mut values: Vec<f64> = (0..30).map(|d| 100.0 - 3.3 * d as f64).collect();
    values.extend([0.0; 10]);
    let features = table(&values);

    let models: Vec<Box<dyn ForecastModel>> = vec![
        Box::new(DeterministicGrowthModel::new()),
        Box::new(SeasonalModel::new()),
    ];
    for mut model in models {
        model.fit(&features).unwrap();
        let forecast = model.predict(60).unwrap();
        assert!(forecast.values().iter().all(|v| *v >= 0.0), "{}", model.name());
    }
}

#[test]
fn test_clone_box_is_independent() {
    let original: Box<dyn ForecastModel> = Box::new(DeterministicGrowthModel::new());
    let mut copy = original.clone();
    copy.fit(&table(&[1.0, 2.0, 3.0])).unwrap();

    assert!(copy.is_fitted());
    assert!(!original.is_fitted());
    assert_eq!(original.kind(), ModelKind::Deterministic);
}

#[test]
fn test_forecast_serializes_with_status() {
    let mut model = SeasonalModel::new();
    model.fit(&table(&[1.0, 2.0, 3.0])).unwrap();

    let json = model.predict(2).unwrap().to_json().unwrap();
    assert!(json.contains("\"values\""));
    assert!(json.contains("insufficient_history"));
}
