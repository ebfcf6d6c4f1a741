//! Financial evaluation of a project from a representative daily quantity

use crate::cashflow::{self, CashflowYear, Payback};
use crate::params::FinancialParameters;
use crate::{
    FinanceError, Result, CO2_KG_PER_KWH, DEFAULT_GROWTH_RATE, MAX_HORIZON_YEARS, TREES_PER_TON_CO2,
};
use serde::Serialize;
use tracing::debug;

/// Energy and emissions totals over the horizon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnvironmentalImpact {
    pub total_energy_kwh: f64,
    pub co2_savings_kg: f64,
    pub co2_savings_tons: f64,
    pub trees_equivalent: f64,
}

/// Headline figures for one evaluation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub npv: f64,
    pub payback_years: Payback,
    pub roi_percent: f64,
    /// Average yearly net cashflow over capex, floored at 0; not a true IRR
    pub irr_percent: f64,
    pub total_revenue: f64,
    pub total_opex: f64,
    pub total_net_cashflow: f64,
    pub co2_savings_tons: f64,
    pub trees_equivalent: f64,
}

/// Cashflow calculator bound to one parameter set
#[derive(Debug, Clone, PartialEq)]
pub struct FinanceEngine {
    params: FinancialParameters,
    growth_rate: f64,
}

impl FinanceEngine {
    /// Create an engine with the default 2% yearly quantity growth
    pub fn new(params: FinancialParameters) -> Self {
        Self {
            params,
            growth_rate: DEFAULT_GROWTH_RATE,
        }
    }

    /// Override the yearly quantity growth rate
    pub fn with_growth_rate(mut self, growth_rate: f64) -> Result<Self> {
        if !growth_rate.is_finite() || growth_rate <= -1.0 {
            return Err(FinanceError::InvalidParameter(format!(
                "Growth rate must be greater than -1, got {}",
                growth_rate
            )));
        }
        self.growth_rate = growth_rate;
        Ok(self)
    }

    pub fn params(&self) -> &FinancialParameters {
        &self.params
    }

    pub fn growth_rate(&self) -> f64 {
        self.growth_rate
    }

    /// Same growth assumption, different parameters
    pub(crate) fn with_params(&self, params: FinancialParameters) -> Self {
        Self {
            params,
            growth_rate: self.growth_rate,
        }
    }

    fn check_inputs(daily_quantity: f64, horizon_years: u32) -> Result<()> {
        if !daily_quantity.is_finite() || daily_quantity < 0.0 {
            return Err(FinanceError::InvalidParameter(format!(
                "Daily quantity must be a non-negative number, got {}",
                daily_quantity
            )));
        }
        if !(1..=MAX_HORIZON_YEARS).contains(&horizon_years) {
            return Err(FinanceError::InvalidParameter(format!(
                "Horizon must be 1 to {} years, got {}",
                MAX_HORIZON_YEARS, horizon_years
            )));
        }
        Ok(())
    }

    /// Project a single 1-based year
    pub fn project_year(&self, daily_quantity: f64, year: u32) -> CashflowYear {
        cashflow::project_year(&self.params, daily_quantity, year, self.growth_rate)
    }

    /// Project every year of the horizon
    pub fn project_cashflows(
        &self,
        daily_quantity: f64,
        horizon_years: u32,
    ) -> Result<Vec<CashflowYear>> {
        Self::check_inputs(daily_quantity, horizon_years)?;
        Ok(cashflow::project_cashflows(
            &self.params,
            daily_quantity,
            horizon_years,
            self.growth_rate,
        ))
    }

    fn net_cashflows(&self, daily_quantity: f64, horizon_years: u32) -> Result<Vec<f64>> {
        Ok(self
            .project_cashflows(daily_quantity, horizon_years)?
            .iter()
            .map(|year| year.net_cashflow)
            .collect())
    }

    /// Net present value at the configured discount rate
    pub fn npv(&self, daily_quantity: f64, horizon_years: u32) -> Result<f64> {
        let nets = self.net_cashflows(daily_quantity, horizon_years)?;
        Ok(cashflow::npv(
            self.params.capex(),
            self.params.discount_rate(),
            &nets,
        ))
    }

    pub fn payback_years(&self, daily_quantity: f64, horizon_years: u32) -> Result<Payback> {
        let nets = self.net_cashflows(daily_quantity, horizon_years)?;
        Ok(cashflow::payback_period(self.params.capex(), &nets))
    }

    pub fn roi_percent(&self, daily_quantity: f64, horizon_years: u32) -> Result<f64> {
        let nets = self.net_cashflows(daily_quantity, horizon_years)?;
        Ok(cashflow::roi_percent(self.params.capex(), &nets))
    }

    /// Rough return estimate: average yearly net cashflow over capex, floored at 0
    pub fn irr_percent(&self, daily_quantity: f64, horizon_years: u32) -> Result<f64> {
        let nets = self.net_cashflows(daily_quantity, horizon_years)?;
        Ok(approximate_irr(self.params.capex(), &nets))
    }

    pub fn environmental_impact(
        &self,
        daily_quantity: f64,
        horizon_years: u32,
    ) -> Result<EnvironmentalImpact> {
        let cashflows = self.project_cashflows(daily_quantity, horizon_years)?;
        Ok(impact_of(&cashflows))
    }

    /// All headline figures from a single projection
    pub fn summary(&self, daily_quantity: f64, horizon_years: u32) -> Result<FinancialSummary> {
        let cashflows = self.project_cashflows(daily_quantity, horizon_years)?;
        let nets: Vec<f64> = cashflows.iter().map(|c| c.net_cashflow).collect();
        let capex = self.params.capex();

        let total_revenue: f64 = cashflows.iter().map(|c| c.revenue_total).sum();
        let total_opex: f64 = cashflows.iter().map(|c| c.opex_total).sum();
        let total_net_cashflow: f64 = nets.iter().sum();
        let impact = impact_of(&cashflows);

        let summary = FinancialSummary {
            npv: cashflow::npv(capex, self.params.discount_rate(), &nets),
            payback_years: cashflow::payback_period(capex, &nets),
            roi_percent: cashflow::roi_percent(capex, &nets),
            irr_percent: approximate_irr(capex, &nets),
            total_revenue,
            total_opex,
            total_net_cashflow,
            co2_savings_tons: impact.co2_savings_tons,
            trees_equivalent: impact.trees_equivalent,
        };

        debug!(
            daily_quantity,
            horizon_years,
            npv = summary.npv,
            payback = %summary.payback_years,
            "computed financial summary"
        );

        Ok(summary)
    }
}

fn approximate_irr(capex: f64, nets: &[f64]) -> f64 {
    if nets.is_empty() || capex <= 0.0 {
        return 0.0;
    }
    let average = nets.iter().sum::<f64>() / nets.len() as f64;
    (average / capex * 100.0).max(0.0)
}

fn impact_of(cashflows: &[CashflowYear]) -> EnvironmentalImpact {
    let total_energy_kwh: f64 = cashflows.iter().map(|c| c.energy_kwh).sum();
    let co2_savings_kg = total_energy_kwh * CO2_KG_PER_KWH;
    let co2_savings_tons = co2_savings_kg / 1000.0;

    EnvironmentalImpact {
        total_energy_kwh,
        co2_savings_kg,
        co2_savings_tons,
        trees_equivalent: co2_savings_tons * TREES_PER_TON_CO2,
    }
}
