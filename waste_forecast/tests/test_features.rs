use approx::assert_relative_eq;
use chrono::{Duration, NaiveDate};
use pretty_assertions::assert_eq;
use rstest::rstest;
use waste_forecast::data::Observation;
use waste_forecast::error::ForecastError;
use waste_forecast::features::{FeatureBuilder, SeasonalityPatterns};

fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset)
}

fn daily_series(values: &[f64]) -> Vec<Observation> {
    values
        .iter()
        .enumerate()
        .map(|(i, &q)| Observation::new(day(i as i64), q))
        .collect()
}

#[test]
fn test_aggregates_and_fills_gaps() {
    let observations = vec![
        Observation::new(day(3), 2.0),
        Observation::new(day(0), 5.0),
        Observation::new(day(0), 3.0),
    ];

    let table = FeatureBuilder::build(&observations).unwrap();

    assert_eq!(table.len(), 4);
    assert_eq!(table.quantities(), vec![8.0, 0.0, 0.0, 2.0]);
    assert_eq!(table.first_date(), Some(day(0)));
    assert_eq!(table.last_date(), Some(day(3)));

    let dates: Vec<NaiveDate> = table.rows().iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![day(0), day(1), day(2), day(3)]);
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(29)]
#[case(365)]
fn test_one_row_per_calendar_day(#[case] span: i64) {
    let observations = vec![Observation::new(day(span), 1.0), Observation::new(day(0), 1.0)];
    let table = FeatureBuilder::build(&observations).unwrap();

    assert_eq!(table.len() as i64, span + 1);
    for pair in table.rows().windows(2) {
        assert_eq!(pair[1].date - pair[0].date, Duration::days(1));
    }
}

#[test]
fn test_empty_input_is_rejected() {
    let result = FeatureBuilder::build(&[]);
    assert!(matches!(result, Err(ForecastError::EmptyInput(_))));
}

#[test]
fn test_non_finite_quantity_is_rejected() {
    let observations = vec![
        Observation::new(day(0), 4.0),
        Observation::new(day(1), f64::NAN),
    ];
    let result = FeatureBuilder::build(&observations);
    assert!(matches!(result, Err(ForecastError::DataError(_))));
}

#[test]
fn test_calendar_features() {
    // 2024-01-01 is a Monday
    let table = FeatureBuilder::build(&daily_series(&[1.0; 40])).unwrap();
    let rows = table.rows();

    assert_eq!(rows[0].day_of_week, 0);
    assert_eq!(rows[0].day_of_month, 1);
    assert_eq!(rows[0].month, 1);
    assert_eq!(rows[0].quarter, 1);
    assert!(!rows[0].is_weekend);
    assert!(rows[0].is_month_start);
    assert!(!rows[0].is_month_end);

    // Saturday and Sunday
    assert!(rows[5].is_weekend);
    assert!(rows[6].is_weekend);
    assert_eq!(rows[6].day_of_week, 6);

    // 2024-01-25 closes the month window, 2024-02-01 opens the next
    assert!(rows[24].is_month_end);
    assert!(!rows[23].is_month_end);
    assert_eq!(rows[31].month, 2);
    assert!(rows[31].is_month_start);
    assert_eq!(rows[39].days_since_start, 39);
}

#[test]
fn test_lag_features() {
    let values: Vec<f64> = (1..=35).map(|v| v as f64).collect();
    let table = FeatureBuilder::build(&daily_series(&values)).unwrap();
    let rows = table.rows();

    assert_eq!(rows[0].lag_1, None);
    assert_eq!(rows[1].lag_1, Some(1.0));
    assert_eq!(rows[6].lag_7, None);
    assert_eq!(rows[7].lag_7, Some(1.0));
    assert_eq!(rows[29].lag_30, None);
    assert_eq!(rows[30].lag_30, Some(1.0));
    assert_eq!(rows[34].lag(30), Some(5.0));
    assert_eq!(rows[34].lag(2), None);
}

#[test]
fn test_rolling_means_need_a_full_window() {
    let values: Vec<f64> = (1..=30).map(|v| v as f64).collect();
    let table = FeatureBuilder::build(&daily_series(&values)).unwrap();
    let rows = table.rows();

    assert_eq!(rows[5].rolling_mean_7, None);
    assert_relative_eq!(rows[6].rolling_mean_7.unwrap(), 4.0);
    assert_eq!(rows[12].rolling_mean_14, None);
    assert_relative_eq!(rows[13].rolling_mean_14.unwrap(), 7.5);
    assert_eq!(rows[28].rolling_mean(30), None);
    assert_relative_eq!(rows[29].rolling_mean(30).unwrap(), 15.5);
}

#[test]
fn test_growth_and_cumulative_features() {
    let mut values = vec![10.0; 7];
    values.extend([15.0, 0.0]);
    values[1] = 0.0;
    let table = FeatureBuilder::build(&daily_series(&values)).unwrap();
    let rows = table.rows();

    // No lag_7 yet
    assert_eq!(rows[3].growth_rate_7d, 0.0);
    assert_relative_eq!(rows[7].growth_rate_7d, 0.5);
    // lag_7 is zero
    assert_eq!(rows[8].growth_rate_7d, 0.0);

    assert_relative_eq!(rows[8].cumulative_quantity, values.iter().sum::<f64>());
}

#[test]
fn test_head_and_tail() {
    let values: Vec<f64> = (0..20).map(|v| v as f64).collect();
    let table = FeatureBuilder::build(&daily_series(&values)).unwrap();

    let head = table.head(5);
    assert_eq!(head.len(), 5);
    assert_eq!(head.rows(), &table.rows()[..5]);
    assert_eq!(table.head(100).len(), 20);

    let tail = table.tail(3);
    assert_eq!(tail.quantities(), vec![17.0, 18.0, 19.0]);
    assert_eq!(tail.rows()[0].lag_1, Some(16.0));
}

#[test]
fn test_forecast_dates_follow_last_day() {
    let table = FeatureBuilder::build(&daily_series(&[1.0, 2.0, 3.0])).unwrap();

    assert_eq!(table.forecast_dates(3), vec![day(3), day(4), day(5)]);
    assert!(table.forecast_dates(0).is_empty());
}

#[test]
fn test_seasonality_patterns_need_history() {
    let table = FeatureBuilder::build(&daily_series(&[5.0; 29])).unwrap();
    assert_eq!(table.seasonality_patterns(), SeasonalityPatterns::default());
}

#[test]
fn test_weekend_factor() {
    // Weekends at half the weekday level
    let values: Vec<f64> = (0..56)
        .map(|d| if d % 7 >= 5 { 5.0 } else { 10.0 })
        .collect();
    let table = FeatureBuilder::build(&daily_series(&values)).unwrap();
    let patterns = table.seasonality_patterns();

    assert_relative_eq!(patterns.weekend_factor, 0.5);
    assert_relative_eq!(patterns.quarterly_factors[1], 1.0);
}

#[test]
fn test_to_dataframe() {
    let table = FeatureBuilder::build(&daily_series(&[1.0, 2.0, 3.0, 4.0])).unwrap();
    let df = table.to_dataframe().unwrap();

    assert_eq!(df.height(), 4);
    assert_eq!(df.width(), 18);
    assert!(df.column("rolling_mean_7").is_ok());
    assert_eq!(df.column("lag_1").unwrap().null_count(), 1);
}
