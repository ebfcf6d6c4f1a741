use chrono::{Duration, NaiveDate};
use waste_forecast::backtest::Backtester;
use waste_forecast::data::Observation;
use waste_forecast::features::FeatureBuilder;
use waste_forecast::metrics::{confidence_interval, evaluate_holdout};
use waste_forecast::models::{DeterministicGrowthModel, ForecastModel, SeasonalModel};
use waste_forecast::selection::ModelSelector;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Waste Forecast: Basic Forecasting Example");
    println!("=========================================\n");

    // Create sample data
    println!("Creating sample data...");
    let observations = create_sample_observations(120);
    let features = FeatureBuilder::build(&observations)?;
    println!("Feature table created: {} daily rows\n", features.len());

    let patterns = features.seasonality_patterns();
    println!("Weekend factor: {:.3}", patterns.weekend_factor);
    println!("Quarterly factors: {:?}\n", patterns.quarterly_factors);

    // Fit both models directly
    println!("Fitting models...");
    let mut deterministic = DeterministicGrowthModel::new();
    deterministic.fit(&features)?;
    let mut seasonal = SeasonalModel::new();
    seasonal.fit(&features)?;

    for model in [&deterministic as &dyn ForecastModel, &seasonal] {
        let info = model.info();
        println!("{} [{:?}]", info.name, info.status);
        for (key, value) in &info.parameters {
            println!("  {}: {:.4}", key, value);
        }
    }

    // Compare with a walk-forward backtest
    println!("\nBacktesting (7-day blocks)...");
    let backtester = Backtester::default();
    for model in [&deterministic as &dyn ForecastModel, &seasonal] {
        let report = backtester.run(model, &features);
        println!(
            "  {}: MAPE {:.2}% over {} windows",
            report.model,
            report.mape,
            report.windows.len()
        );
    }

    println!("\n{}", evaluate_holdout(&deterministic, &features, 0.3)?);

    // Let the selector decide
    let mut selector = ModelSelector::with_default_candidates();
    let best = selector.select_best_model(&features);
    println!("Selected model: {}", best.name());

    // 95% confidence interval for the next two weeks
    let forecast = confidence_interval(best.as_ref(), &features, 14, 0.95)?;
    let dates = features.forecast_dates(14);
    println!("\n14-day forecast ({:?}):", forecast.status());
    if let Some(intervals) = forecast.intervals() {
        for ((date, value), (lower, upper)) in dates.iter().zip(forecast.values()).zip(intervals) {
            println!("  {}: {:.2} t ({:.2}, {:.2})", date, value, lower, upper);
        }
    }

    Ok(())
}

fn create_sample_observations(days: i64) -> Vec<Observation> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).expect("valid date");
    let pattern = [1.0, 1.05, 0.95, 1.1, 1.0, 0.8, 0.7];

    (0..days)
        .map(|d| {
            let trend = 40.0 + 0.05 * d as f64;
            let wobble = ((d * 37) % 11) as f64 / 10.0 - 0.5;
            Observation::new(
                start + Duration::days(d),
                trend * pattern[(d % 7) as usize] + wobble,
            )
        })
        .collect()
}
