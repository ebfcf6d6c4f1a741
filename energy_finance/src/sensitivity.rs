//! One-factor-at-a-time sensitivity of NPV

use crate::engine::FinanceEngine;
use crate::params::ParameterName;
use crate::{FinanceError, Result};
use serde::Serialize;
use tracing::debug;

/// Default relative perturbation for sensitivity runs
pub const DEFAULT_SENSITIVITY_PCT: f64 = 0.15;

/// NPV response to scaling one parameter down and up
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityResult {
    pub parameter: ParameterName,
    /// NPV with the parameter scaled by `1 - pct`
    pub npv_low: f64,
    /// NPV with the parameter scaled by `1 + pct`
    pub npv_high: f64,
    /// `npv_high - npv_low`
    pub impact: f64,
}

impl FinanceEngine {
    fn npv_with(
        &self,
        daily_quantity: f64,
        horizon_years: u32,
        parameter: ParameterName,
        value: f64,
    ) -> Result<f64> {
        let variant = self.params().with_value(parameter, value);
        self.with_params(variant).npv(daily_quantity, horizon_years)
    }

    /// Scale `parameter` by `1 ± pct` and recompute NPV for both variants
    pub fn sensitivity(
        &self,
        daily_quantity: f64,
        horizon_years: u32,
        parameter: ParameterName,
        pct: f64,
    ) -> Result<SensitivityResult> {
        if !(pct > 0.0 && pct < 1.0) {
            return Err(FinanceError::InvalidParameter(format!(
                "Sensitivity percentage must be between 0 and 1, got {}",
                pct
            )));
        }

        let base = self.params().value(parameter);
        let npv_low = self.npv_with(daily_quantity, horizon_years, parameter, base * (1.0 - pct))?;
        let npv_high = self.npv_with(daily_quantity, horizon_years, parameter, base * (1.0 + pct))?;

        debug!(%parameter, npv_low, npv_high, "sensitivity computed");

        Ok(SensitivityResult {
            parameter,
            npv_low,
            npv_high,
            impact: npv_high - npv_low,
        })
    }

    /// Sensitivities at ±15% ordered by absolute impact, largest first.
    ///
    /// Equal impacts keep the order in which the parameters were given.
    pub fn tornado(
        &self,
        daily_quantity: f64,
        horizon_years: u32,
        parameters: &[ParameterName],
    ) -> Result<Vec<SensitivityResult>> {
        if parameters.is_empty() {
            return Err(FinanceError::InvalidParameter(
                "Tornado analysis needs at least one parameter".to_string(),
            ));
        }

        let mut results = parameters
            .iter()
            .map(|&p| self.sensitivity(daily_quantity, horizon_years, p, DEFAULT_SENSITIVITY_PCT))
            .collect::<Result<Vec<_>>>()?;

        results.sort_by(|a, b| b.impact.abs().total_cmp(&a.impact.abs()));
        Ok(results)
    }

    /// NPV at each explicit value of one parameter, paired with that value
    pub fn npv_sweep(
        &self,
        daily_quantity: f64,
        horizon_years: u32,
        parameter: ParameterName,
        values: &[f64],
    ) -> Result<Vec<(f64, f64)>> {
        if values.is_empty() {
            return Err(FinanceError::InsufficientData(format!(
                "No values to sweep for {}",
                parameter
            )));
        }

        values
            .iter()
            .map(|&value| {
                self.npv_with(daily_quantity, horizon_years, parameter, value)
                    .map(|npv| (value, npv))
            })
            .collect()
    }
}
