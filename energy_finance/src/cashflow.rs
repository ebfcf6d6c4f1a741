//! Yearly cashflow projection and the discounted-cashflow measures built on it

use crate::params::FinancialParameters;
use crate::{Result, BYPRODUCT_YIELD, CO2_KG_PER_KWH, DAYS_PER_YEAR};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::io::Write;

/// One projected project year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowYear {
    /// 1-based project year
    pub year: u32,
    pub quantity_tons: f64,
    pub energy_kwh: f64,
    pub electricity_revenue: f64,
    pub carbon_revenue: f64,
    pub byproduct_revenue: f64,
    pub revenue_total: f64,
    pub opex_variable: f64,
    pub opex_fixed: f64,
    pub opex_total: f64,
    pub net_cashflow: f64,
}

/// Project a single year from a representative daily quantity.
///
/// The processed quantity compounds at `growth_rate` per year from year 1.
pub fn project_year(
    params: &FinancialParameters,
    daily_quantity: f64,
    year: u32,
    growth_rate: f64,
) -> CashflowYear {
    let exponent = year.saturating_sub(1) as i32;
    let quantity_tons = daily_quantity * DAYS_PER_YEAR * (1.0 + growth_rate).powi(exponent);
    let energy_kwh = quantity_tons * params.yield_rate() * params.capacity_factor();

    let electricity_revenue = energy_kwh * params.tariff();
    let carbon_revenue = params
        .carbon_credit_price()
        .map_or(0.0, |price| energy_kwh * CO2_KG_PER_KWH / 1000.0 * price);
    let byproduct_revenue = params
        .byproduct_price()
        .map_or(0.0, |price| quantity_tons * BYPRODUCT_YIELD * price);
    let revenue_total = electricity_revenue + carbon_revenue + byproduct_revenue;

    let opex_variable = quantity_tons * params.opex_per_ton();
    let opex_fixed = params.fixed_opex();
    let opex_total = opex_variable + opex_fixed;

    CashflowYear {
        year,
        quantity_tons,
        energy_kwh,
        electricity_revenue,
        carbon_revenue,
        byproduct_revenue,
        revenue_total,
        opex_variable,
        opex_fixed,
        opex_total,
        net_cashflow: revenue_total - opex_total,
    }
}

/// Project years `1..=horizon_years` in order
pub fn project_cashflows(
    params: &FinancialParameters,
    daily_quantity: f64,
    horizon_years: u32,
    growth_rate: f64,
) -> Vec<CashflowYear> {
    (1..=horizon_years)
        .map(|year| project_year(params, daily_quantity, year, growth_rate))
        .collect()
}

/// Net present value of yearly net cashflows after an upfront `capex`.
///
/// The first entry is discounted by one full year.
pub fn npv(capex: f64, discount_rate: f64, net_cashflows: &[f64]) -> f64 {
    net_cashflows
        .iter()
        .enumerate()
        .fold(-capex, |acc, (i, net)| {
            acc + net / (1.0 + discount_rate).powi(i as i32 + 1)
        })
}

/// Simple (undiscounted) payback period
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payback {
    /// Fractional years until cumulative net cashflow covers the investment
    Years(f64),
    /// The investment is not recovered within the horizon
    Unreachable,
}

impl Payback {
    /// Years, if the investment is recovered
    pub fn years(&self) -> Option<f64> {
        match self {
            Payback::Years(years) => Some(*years),
            Payback::Unreachable => None,
        }
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, Payback::Years(_))
    }
}

impl fmt::Display for Payback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payback::Years(years) => write!(f, "{:.2} years", years),
            Payback::Unreachable => write!(f, "unreachable"),
        }
    }
}

impl Serialize for Payback {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Payback::Years(years) => serializer.serialize_f64(*years),
            Payback::Unreachable => serializer.serialize_str("unreachable"),
        }
    }
}

/// Walk the cumulative net cashflow until it covers `capex`.
///
/// The crossing year is interpolated linearly. A year whose own net cashflow
/// is not positive cannot be the crossing year and is skipped.
pub fn payback_period(capex: f64, net_cashflows: &[f64]) -> Payback {
    if capex <= 0.0 {
        return Payback::Years(0.0);
    }

    let mut cumulative = 0.0;
    for (i, &net) in net_cashflows.iter().enumerate() {
        let recovered = cumulative;
        cumulative += net;
        if cumulative >= capex && net > 0.0 {
            return Payback::Years(i as f64 + (capex - recovered) / net);
        }
    }

    Payback::Unreachable
}

/// Total net cashflow as a percentage of `capex`; 0 without an investment
pub fn roi_percent(capex: f64, net_cashflows: &[f64]) -> f64 {
    if capex <= 0.0 {
        return 0.0;
    }
    net_cashflows.iter().sum::<f64>() / capex * 100.0
}

/// Write the cashflow table as CSV with a header row
pub fn cashflows_to_csv<W: Write>(cashflows: &[CashflowYear], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in cashflows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}
