//! End-to-end site assessment: logs to forecast to financial viability

use crate::store::LogStore;
use crate::{AssessmentError, Result};
use chrono::NaiveDate;
use energy_finance::{
    CashflowYear, FinanceEngine, FinancialParameters, FinancialSummary, ParameterName,
    SensitivityResult,
};
use serde::Serialize;
use tracing::info;
use waste_forecast::data::mean_daily_quantity;
use waste_forecast::models::{ForecastStatus, ModelInfo};
use waste_forecast::{FeatureBuilder, ForecastModel, ModelSelector, Observation};

/// Longest forecast window accepted, in days
pub const MAX_FORECAST_DAYS: usize = 365;

/// Parameters ranked in the default tornado
pub const DEFAULT_TORNADO_PARAMETERS: [ParameterName; 5] = [
    ParameterName::YieldRate,
    ParameterName::Tariff,
    ParameterName::OpexPerTon,
    ParameterName::Capex,
    ParameterName::DiscountRate,
];

/// Forecast quantity for one future day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub quantity: f64,
}

/// Everything produced by one assessment run
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    /// Selected model after fitting on the full history, with its backtest score
    pub model: ModelInfo,
    /// Backtest score per candidate; empty when history was too short to compare
    pub model_scores: Vec<(String, f64)>,
    pub forecast: Vec<DailyForecast>,
    pub forecast_status: ForecastStatus,
    /// Representative daily quantity fed to the cashflow projection
    pub daily_quantity: f64,
    pub cashflows: Vec<CashflowYear>,
    pub summary: FinancialSummary,
    pub tornado: Vec<SensitivityResult>,
}

impl AssessmentReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs model selection, forecasting and financial evaluation together
#[derive(Debug, Clone)]
pub struct SiteAssessment {
    selector: ModelSelector,
    growth_rate: f64,
    tornado_parameters: Vec<ParameterName>,
}

impl SiteAssessment {
    /// Default candidates, 2% yearly growth and the default tornado parameters
    pub fn new() -> Self {
        Self {
            selector: ModelSelector::with_default_candidates(),
            growth_rate: energy_finance::DEFAULT_GROWTH_RATE,
            tornado_parameters: DEFAULT_TORNADO_PARAMETERS.to_vec(),
        }
    }

    pub fn with_selector(mut self, selector: ModelSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Yearly growth of the processed quantity in the cashflow projection
    pub fn with_growth_rate(mut self, growth_rate: f64) -> Self {
        self.growth_rate = growth_rate;
        self
    }

    pub fn with_tornado_parameters(mut self, parameters: Vec<ParameterName>) -> Self {
        self.tornado_parameters = parameters;
        self
    }

    /// Assess a site from its raw observations
    pub fn run(
        &self,
        observations: &[Observation],
        params: &FinancialParameters,
        forecast_days: usize,
    ) -> Result<AssessmentReport> {
        if !(1..=MAX_FORECAST_DAYS).contains(&forecast_days) {
            return Err(AssessmentError::InvalidRequest(format!(
                "Forecast window must be 1 to {} days, got {}",
                MAX_FORECAST_DAYS, forecast_days
            )));
        }

        let features = FeatureBuilder::build(observations)?;

        let mut selector = self.selector.clone();
        let mut model = selector.select_best_model(&features);
        // Unscored picks come back as configured, possibly fitted on other history
        if selector.selected_score().is_none() {
            model.fit(&features)?;
        }

        let forecast = model.predict(forecast_days)?;
        let dates = features.forecast_dates(forecast_days);
        let daily: Vec<DailyForecast> = dates
            .into_iter()
            .zip(forecast.values())
            .map(|(date, &quantity)| DailyForecast { date, quantity })
            .collect();

        let daily_quantity = mean_daily_quantity(observations)?;
        let engine = FinanceEngine::new(params.clone()).with_growth_rate(self.growth_rate)?;
        let horizon = params.horizon_years();
        let cashflows = engine.project_cashflows(daily_quantity, horizon)?;
        let summary = engine.summary(daily_quantity, horizon)?;
        let tornado = engine.tornado(daily_quantity, horizon, &self.tornado_parameters)?;

        info!(
            model = model.name(),
            rows = features.len(),
            forecast_days,
            daily_quantity,
            npv = summary.npv,
            "site assessment complete"
        );

        Ok(AssessmentReport {
            model: model.info().with_last_mape(selector.selected_score()),
            model_scores: selector.performance_scores().to_vec(),
            forecast: daily,
            forecast_status: forecast.status().clone(),
            daily_quantity,
            cashflows,
            summary,
            tornado,
        })
    }

    /// Assess a registered entity from the logs held in `store`
    pub fn assess_entity<S: LogStore + ?Sized>(
        &self,
        store: &S,
        entity: &str,
        params: &FinancialParameters,
        forecast_days: usize,
    ) -> Result<AssessmentReport> {
        let observations = store.observations_for(entity)?;
        self.run(&observations, params, forecast_days)
    }
}

impl Default for SiteAssessment {
    fn default() -> Self {
        Self::new()
    }
}
