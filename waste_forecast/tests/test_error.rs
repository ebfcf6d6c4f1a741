use std::io;
use waste_forecast::error::ForecastError;

#[test]
fn test_error_conversion() {
    // Test IO error conversion
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    let forecast_error = ForecastError::from(io_error);

    match forecast_error {
        ForecastError::IoError(_) => {}
        _ => panic!("Expected IoError variant"),
    }

    // Test polars error conversion
    let polars_error = polars::prelude::PolarsError::ComputeError("bad column".into());
    let forecast_error = ForecastError::from(polars_error);

    match forecast_error {
        ForecastError::PolarsError(msg) => assert!(msg.contains("bad column")),
        _ => panic!("Expected PolarsError variant"),
    }
}

#[test]
fn test_error_display() {
    // Test display implementation
    let error = ForecastError::InvalidParameter("horizon must be at least 1".to_string());
    assert_eq!(
        error.to_string(),
        "Invalid parameter: horizon must be at least 1"
    );

    let error = ForecastError::NotFitted("Deterministic Growth".to_string());
    assert_eq!(error.to_string(), "Model not fitted: Deterministic Growth");

    let error = ForecastError::EmptyInput("no observations".to_string());
    assert!(error.to_string().starts_with("Empty input"));
}
