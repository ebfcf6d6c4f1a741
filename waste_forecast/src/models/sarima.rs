//! Conditional-sum-of-squares estimator for SARIMA(1,1,1)(0,1,1)s
//!
//! The differenced process `w_t = (1 - B)(1 - B^s) y_t` follows
//! `w_t = phi w_{t-1} + e_t + theta e_{t-1} + Theta e_{t-s} + theta Theta e_{t-s-1}`.

use crate::error::{ForecastError, Result};

/// Coefficients are kept strictly inside the unit interval
const PARAM_BOUND: f64 = 0.99;

/// Spacing of the coarse search grid
const GRID_STEP: f64 = 0.2;

/// Grid spans [-GRID_HALF_WIDTH, GRID_HALF_WIDTH] steps around zero
const GRID_HALF_WIDTH: i32 = 4;

/// Pattern search stops once its step drops below this
const MIN_STEP: f64 = 1e-4;

const MAX_REFINEMENTS: usize = 500;

/// Fewest differenced observations the estimator accepts
const MIN_EFFECTIVE_OBSERVATIONS: usize = 8;

/// Fitted seasonal ARIMA process
#[derive(Debug, Clone)]
pub(crate) struct SarimaFit {
    /// Non-seasonal AR coefficient
    pub(crate) ar: f64,
    /// Non-seasonal MA coefficient
    pub(crate) ma: f64,
    /// Seasonal MA coefficient
    pub(crate) seasonal_ma: f64,
    pub(crate) period: usize,
    /// Residual variance
    pub(crate) sigma2: f64,
    pub(crate) aic: f64,
    pub(crate) bic: f64,
    /// Original series
    history: Vec<f64>,
    /// Doubly differenced series
    differenced: Vec<f64>,
    /// In-sample one-step residuals of the differenced series
    residuals: Vec<f64>,
}

impl SarimaFit {
    /// Estimate the process from a dense daily series
    pub(crate) fn estimate(series: &[f64], period: usize) -> Result<Self> {
        if period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "Seasonal period must be at least 2, got {}",
                period
            )));
        }

        let differenced = seasonal_difference(&difference(series), period);
        if differenced.len() < MIN_EFFECTIVE_OBSERVATIONS {
            return Err(ForecastError::ForecastingError(format!(
                "Only {} observations remain after differencing, need {}",
                differenced.len(),
                MIN_EFFECTIVE_OBSERVATIONS
            )));
        }

        let (params, sse) = minimize_css(&differenced, period);
        if !sse.is_finite() {
            return Err(ForecastError::ForecastingError(
                "Conditional sum of squares did not converge".to_string(),
            ));
        }

        let residuals = css_residuals(&differenced, params, period);

        // Residuals start at t = 1; the first differenced point only conditions
        let n = (differenced.len() - 1) as f64;
        let sigma2 = (sse / n).max(f64::MIN_POSITIVE);
        let k = 4.0; // three coefficients plus the variance
        let log_likelihood = -0.5 * n * ((2.0 * std::f64::consts::PI * sigma2).ln() + 1.0);

        Ok(Self {
            ar: params[0],
            ma: params[1],
            seasonal_ma: params[2],
            period,
            sigma2,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * n.ln(),
            history: series.to_vec(),
            differenced,
            residuals,
        })
    }

    /// Project `horizon` values on the original scale.
    ///
    /// Future shocks are zero; the differenced forecasts are integrated back
    /// through `y_t = y_{t-1} + (y_{t-s} - y_{t-s-1}) + w_t`. The seasonal step
    /// is taken before adding to the level so that large finite series stay
    /// finite.
    pub(crate) fn forecast(&self, horizon: usize) -> Vec<f64> {
        let s = self.period;
        let mut w = self.differenced.clone();
        let mut e = self.residuals.clone();

        for _ in 0..horizon {
            let t = w.len();
            let mut next = self.ar * w[t - 1] + self.ma * e[t - 1];
            if t >= s {
                next += self.seasonal_ma * e[t - s];
            }
            if t > s {
                next += self.ma * self.seasonal_ma * e[t - s - 1];
            }
            w.push(next);
            e.push(0.0);
        }

        let mut y = self.history.clone();
        for &wt in &w[self.differenced.len()..] {
            let t = y.len();
            y.push(y[t - 1] + (y[t - s] - y[t - s - 1]) + wt);
        }

        y.split_off(self.history.len())
    }
}

/// First difference
fn difference(series: &[f64]) -> Vec<f64> {
    series.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Seasonal difference at lag `period`
fn seasonal_difference(series: &[f64], period: usize) -> Vec<f64> {
    if series.len() <= period {
        return Vec::new();
    }
    (period..series.len())
        .map(|t| series[t] - series[t - period])
        .collect()
}

/// One-step residuals of the differenced series for `[phi, theta, Theta]`
fn css_residuals(w: &[f64], params: [f64; 3], period: usize) -> Vec<f64> {
    let [phi, theta, big_theta] = params;
    let mut e = vec![0.0; w.len()];

    for t in 1..w.len() {
        let mut predicted = phi * w[t - 1] + theta * e[t - 1];
        if t >= period {
            predicted += big_theta * e[t - period];
        }
        if t > period {
            predicted += theta * big_theta * e[t - period - 1];
        }
        e[t] = w[t] - predicted;
    }

    e
}

fn css(w: &[f64], params: [f64; 3], period: usize) -> f64 {
    css_residuals(w, params, period)[1..]
        .iter()
        .map(|r| r * r)
        .sum()
}

/// Coarse grid search followed by a shrinking-step pattern search
fn minimize_css(w: &[f64], period: usize) -> ([f64; 3], f64) {
    let grid: Vec<f64> = (-GRID_HALF_WIDTH..=GRID_HALF_WIDTH)
        .map(|k| k as f64 * GRID_STEP)
        .collect();

    let mut best = [0.0; 3];
    let mut best_sse = f64::INFINITY;

    for &phi in &grid {
        for &theta in &grid {
            for &big_theta in &grid {
                let candidate = [phi, theta, big_theta];
                let sse = css(w, candidate, period);
                if sse < best_sse {
                    best = candidate;
                    best_sse = sse;
                }
            }
        }
    }

    let mut step = GRID_STEP / 2.0;
    let mut iterations = 0;
    while step >= MIN_STEP && iterations < MAX_REFINEMENTS {
        iterations += 1;
        let mut improved = false;

        for i in 0..3 {
            for direction in [-1.0, 1.0] {
                let mut candidate = best;
                candidate[i] = (candidate[i] + direction * step).clamp(-PARAM_BOUND, PARAM_BOUND);
                let sse = css(w, candidate, period);
                if sse < best_sse {
                    best = candidate;
                    best_sse = sse;
                    improved = true;
                }
            }
        }

        if !improved {
            step /= 2.0;
        }
    }

    (best, best_sse)
}
