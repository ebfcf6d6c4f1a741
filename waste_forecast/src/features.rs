//! Feature engineering for forecasting models
//!
//! Turns a raw log of dated quantities into a regularized daily series with
//! calendar, lag, rolling and trend features.

use crate::data::{aggregate_daily, Observation};
use crate::error::{ForecastError, Result};
use chrono::{Datelike, Duration, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Lags (in days) computed for every row
pub const LAG_PERIODS: [usize; 3] = [1, 7, 30];

/// Rolling mean windows (in days) computed for every row
pub const ROLLING_WINDOWS: [usize; 3] = [7, 14, 30];

/// Minimum history before seasonality factors are estimated
const MIN_ROWS_FOR_PATTERNS: usize = 30;

/// One calendar day of the regularized series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    /// Summed quantity for the day, 0 for unobserved days
    pub quantity: f64,
    /// Monday = 0 .. Sunday = 6
    pub day_of_week: u32,
    pub day_of_month: u32,
    pub month: u32,
    pub quarter: u32,
    pub lag_1: Option<f64>,
    pub lag_7: Option<f64>,
    pub lag_30: Option<f64>,
    pub rolling_mean_7: Option<f64>,
    pub rolling_mean_14: Option<f64>,
    pub rolling_mean_30: Option<f64>,
    pub days_since_start: i64,
    /// quantity / lag_7 - 1, or 0 when lag_7 is missing or zero
    pub growth_rate_7d: f64,
    pub cumulative_quantity: f64,
    pub is_weekend: bool,
    pub is_month_start: bool,
    pub is_month_end: bool,
}

impl FeatureRow {
    /// Lag feature for one of [`LAG_PERIODS`]
    pub fn lag(&self, period: usize) -> Option<f64> {
        match period {
            1 => self.lag_1,
            7 => self.lag_7,
            30 => self.lag_30,
            _ => None,
        }
    }

    /// Rolling mean for one of [`ROLLING_WINDOWS`]
    pub fn rolling_mean(&self, window: usize) -> Option<f64> {
        match window {
            7 => self.rolling_mean_7,
            14 => self.rolling_mean_14,
            30 => self.rolling_mean_30,
            _ => None,
        }
    }
}

/// Multiplicative seasonality factors relative to the overall mean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityPatterns {
    /// Weekend mean over weekday mean
    pub weekend_factor: f64,
    pub month_start_factor: f64,
    pub month_end_factor: f64,
    /// Quarter 1..=4 means over the overall mean
    pub quarterly_factors: [f64; 4],
}

impl Default for SeasonalityPatterns {
    fn default() -> Self {
        Self {
            weekend_factor: 1.0,
            month_start_factor: 1.0,
            month_end_factor: 1.0,
            quarterly_factors: [1.0; 4],
        }
    }
}

/// Dense daily feature table.
///
/// Holds exactly one row per calendar day between the first and last
/// observation, with strictly increasing dates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

/// Builds [`FeatureTable`]s from observation logs
#[derive(Debug, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    /// Aggregate, regularize and featurize a set of observations.
    ///
    /// Input order is irrelevant; the output is ascending by date with
    /// zero-filled gaps.
    pub fn build(observations: &[Observation]) -> Result<FeatureTable> {
        if observations.is_empty() {
            return Err(ForecastError::EmptyInput(
                "At least one observation is required to build features".to_string(),
            ));
        }

        if let Some(bad) = observations.iter().find(|o| !o.quantity.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Non-finite quantity on {}",
                bad.date
            )));
        }

        let daily = aggregate_daily(observations);
        let (start, end) = match (daily.keys().next(), daily.keys().next_back()) {
            (Some(start), Some(end)) => (*start, *end),
            _ => {
                return Err(ForecastError::EmptyInput(
                    "No dated observations after aggregation".to_string(),
                ))
            }
        };

        let span = (end - start).num_days();
        let quantities: Vec<f64> = (0..=span)
            .map(|offset| {
                daily
                    .get(&(start + Duration::days(offset)))
                    .copied()
                    .unwrap_or(0.0)
            })
            .collect();

        let mut rows = Vec::with_capacity(quantities.len());
        let mut cumulative = 0.0;

        for (i, &quantity) in quantities.iter().enumerate() {
            let date = start + Duration::days(i as i64);
            cumulative += quantity;

            let lag = |k: usize| if i >= k { Some(quantities[i - k]) } else { None };
            let rolling = |w: usize| {
                if i + 1 >= w {
                    Some(quantities[i + 1 - w..=i].iter().sum::<f64>() / w as f64)
                } else {
                    None
                }
            };

            let lag_7 = lag(7);
            let growth_rate_7d = match lag_7 {
                Some(prev) if prev != 0.0 => quantity / prev - 1.0,
                _ => 0.0,
            };

            let day_of_week = date.weekday().num_days_from_monday();
            let day_of_month = date.day();
            let month = date.month();

            rows.push(FeatureRow {
                date,
                quantity,
                day_of_week,
                day_of_month,
                month,
                quarter: (month - 1) / 3 + 1,
                lag_1: lag(1),
                lag_7,
                lag_30: lag(30),
                rolling_mean_7: rolling(7),
                rolling_mean_14: rolling(14),
                rolling_mean_30: rolling(30),
                days_since_start: i as i64,
                growth_rate_7d,
                cumulative_quantity: cumulative,
                is_weekend: day_of_week >= 5,
                is_month_start: day_of_month <= 5,
                is_month_end: day_of_month >= 25,
            });
        }

        Ok(FeatureTable { rows })
    }
}

impl FeatureTable {
    /// Get the feature rows
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    /// Number of calendar days covered
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The daily quantity series
    pub fn quantities(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.quantity).collect()
    }

    /// First calendar day, if any
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.date)
    }

    /// Last calendar day, if any
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.date)
    }

    /// The first `n` rows as a new table.
    ///
    /// Every feature is backward-looking, so a prefix is itself a valid table.
    pub fn head(&self, n: usize) -> Self {
        Self {
            rows: self.rows[..n.min(self.rows.len())].to_vec(),
        }
    }

    /// The last `n` rows as a new table; lag features keep their full-history values
    pub fn tail(&self, n: usize) -> Self {
        Self {
            rows: self.rows[self.rows.len().saturating_sub(n)..].to_vec(),
        }
    }

    /// The `n` consecutive days following the last date
    pub fn forecast_dates(&self, n: usize) -> Vec<NaiveDate> {
        match self.last_date() {
            Some(last) => (1..=n as i64).map(|d| last + Duration::days(d)).collect(),
            None => Vec::new(),
        }
    }

    /// Estimate weekday, month-boundary and quarterly factors.
    ///
    /// All factors stay at 1.0 with fewer than 30 rows.
    pub fn seasonality_patterns(&self) -> SeasonalityPatterns {
        let mut patterns = SeasonalityPatterns::default();
        if self.rows.len() < MIN_ROWS_FOR_PATTERNS {
            return patterns;
        }

        let overall = self.mean_where(|_| true).unwrap_or(0.0);
        let weekend = self.mean_where(|r| r.is_weekend);
        let weekday = self.mean_where(|r| !r.is_weekend);

        if let (Some(weekend), Some(weekday)) = (weekend, weekday) {
            if weekday > 0.0 {
                patterns.weekend_factor = weekend / weekday;
            }
        }

        if overall > 0.0 {
            if let Some(start) = self.mean_where(|r| r.is_month_start) {
                patterns.month_start_factor = start / overall;
            }
            if let Some(end) = self.mean_where(|r| r.is_month_end) {
                patterns.month_end_factor = end / overall;
            }
            for quarter in 1..=4u32 {
                if let Some(mean) = self.mean_where(|r| r.quarter == quarter) {
                    patterns.quarterly_factors[(quarter - 1) as usize] = mean / overall;
                }
            }
        }

        patterns
    }

    fn mean_where<F: Fn(&FeatureRow) -> bool>(&self, predicate: F) -> Option<f64> {
        let (sum, count) = self
            .rows
            .iter()
            .filter(|r| predicate(r))
            .fold((0.0, 0usize), |(s, c), r| (s + r.quantity, c + 1));

        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }

    /// Export the table as a polars DataFrame
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let col_f64 = |f: fn(&FeatureRow) -> f64| self.rows.iter().map(f).collect::<Vec<f64>>();
        let col_opt = |f: fn(&FeatureRow) -> Option<f64>| {
            self.rows.iter().map(f).collect::<Vec<Option<f64>>>()
        };
        let col_u32 = |f: fn(&FeatureRow) -> u32| self.rows.iter().map(f).collect::<Vec<u32>>();
        let col_bool = |f: fn(&FeatureRow) -> bool| self.rows.iter().map(f).collect::<Vec<bool>>();

        let dates: Vec<String> = self.rows.iter().map(|r| r.date.to_string()).collect();
        let days: Vec<i64> = self.rows.iter().map(|r| r.days_since_start).collect();

        let df = DataFrame::new(vec![
            Series::new("date", dates),
            Series::new("quantity", col_f64(|r| r.quantity)),
            Series::new("day_of_week", col_u32(|r| r.day_of_week)),
            Series::new("day_of_month", col_u32(|r| r.day_of_month)),
            Series::new("month", col_u32(|r| r.month)),
            Series::new("quarter", col_u32(|r| r.quarter)),
            Series::new("lag_1", col_opt(|r| r.lag_1)),
            Series::new("lag_7", col_opt(|r| r.lag_7)),
            Series::new("lag_30", col_opt(|r| r.lag_30)),
            Series::new("rolling_mean_7", col_opt(|r| r.rolling_mean_7)),
            Series::new("rolling_mean_14", col_opt(|r| r.rolling_mean_14)),
            Series::new("rolling_mean_30", col_opt(|r| r.rolling_mean_30)),
            Series::new("days_since_start", days),
            Series::new("growth_rate_7d", col_f64(|r| r.growth_rate_7d)),
            Series::new("cumulative_quantity", col_f64(|r| r.cumulative_quantity)),
            Series::new("is_weekend", col_bool(|r| r.is_weekend)),
            Series::new("is_month_start", col_bool(|r| r.is_month_start)),
            Series::new("is_month_end", col_bool(|r| r.is_month_end)),
        ])?;

        Ok(df)
    }
}
