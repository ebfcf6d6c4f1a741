//! Observation handling for waste logs

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One logged waste amount for one day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Calendar day of the log
    pub date: NaiveDate,
    /// Waste amount in tons
    #[serde(alias = "waste_tons")]
    pub quantity: f64,
}

impl Observation {
    /// Create a new observation
    pub fn new(date: NaiveDate, quantity: f64) -> Self {
        Self { date, quantity }
    }
}

/// Data loader for observation logs
#[derive(Debug)]
pub struct ObservationLoader;

impl ObservationLoader {
    /// Load observations from a CSV file with `date` and `quantity` (or `waste_tons`) columns
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Load observations from any CSV reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Observation>> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut observations = Vec::new();
        for record in csv_reader.deserialize() {
            let observation: Observation = record?;
            if !observation.quantity.is_finite() {
                return Err(ForecastError::DataError(format!(
                    "Non-finite quantity on {}",
                    observation.date
                )));
            }
            observations.push(observation);
        }

        Ok(observations)
    }
}

/// Sum observations per calendar day, ascending by date
pub fn aggregate_daily(observations: &[Observation]) -> BTreeMap<NaiveDate, f64> {
    let mut daily = BTreeMap::new();
    for obs in observations {
        *daily.entry(obs.date).or_insert(0.0) += obs.quantity;
    }
    daily
}

/// Total quantity divided by the number of distinct logged days.
///
/// This is the representative daily quantity fed to the finance engine.
pub fn mean_daily_quantity(observations: &[Observation]) -> Result<f64> {
    if observations.is_empty() {
        return Err(ForecastError::EmptyInput(
            "Cannot compute a daily mean without observations".to_string(),
        ));
    }

    let daily = aggregate_daily(observations);
    let total: f64 = daily.values().sum();

    Ok(total / daily.len() as f64)
}
