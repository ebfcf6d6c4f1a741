//! Project parameters and their names
//!
//! Parameters are validated whenever they are built, either in code or from
//! JSON. Sensitivity variants are derived copies and skip upper-bound checks.

use crate::{FinanceError, Result, MAX_HORIZON_YEARS};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator-supplied inputs for one financial evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterSpec")]
pub struct FinancialParameters {
    yield_rate: f64,
    capacity_factor: f64,
    tariff: f64,
    opex_per_ton: f64,
    fixed_opex: f64,
    capex: f64,
    discount_rate: f64,
    horizon_years: u32,
    carbon_credit_price: Option<f64>,
    byproduct_enabled: bool,
    byproduct_price: Option<f64>,
}

/// Unvalidated wire form of [`FinancialParameters`]
#[derive(Debug, Deserialize)]
struct ParameterSpec {
    yield_rate: f64,
    capacity_factor: f64,
    tariff: f64,
    opex_per_ton: f64,
    fixed_opex: f64,
    capex: f64,
    discount_rate: f64,
    horizon_years: u32,
    #[serde(default)]
    carbon_credit_price: Option<f64>,
    #[serde(default)]
    byproduct_enabled: bool,
    #[serde(default)]
    byproduct_price: Option<f64>,
}

impl TryFrom<ParameterSpec> for FinancialParameters {
    type Error = FinanceError;

    fn try_from(raw: ParameterSpec) -> Result<Self> {
        let params = Self {
            yield_rate: raw.yield_rate,
            capacity_factor: raw.capacity_factor,
            tariff: raw.tariff,
            opex_per_ton: raw.opex_per_ton,
            fixed_opex: raw.fixed_opex,
            capex: raw.capex,
            discount_rate: raw.discount_rate,
            horizon_years: raw.horizon_years,
            carbon_credit_price: raw.carbon_credit_price,
            byproduct_enabled: raw.byproduct_enabled,
            byproduct_price: raw.byproduct_price,
        };
        params.validate()?;
        Ok(params)
    }
}

fn check(name: &str, value: f64, valid: bool, expected: &str) -> Result<()> {
    if !value.is_finite() || !valid {
        return Err(FinanceError::InvalidParameter(format!(
            "{} must be {}, got {}",
            name, expected, value
        )));
    }
    Ok(())
}

impl FinancialParameters {
    /// Create a parameter set without carbon credits or byproduct sales
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        yield_rate: f64,
        capacity_factor: f64,
        tariff: f64,
        opex_per_ton: f64,
        fixed_opex: f64,
        capex: f64,
        discount_rate: f64,
        horizon_years: u32,
    ) -> Result<Self> {
        let params = Self {
            yield_rate,
            capacity_factor,
            tariff,
            opex_per_ton,
            fixed_opex,
            capex,
            discount_rate,
            horizon_years,
            carbon_credit_price: None,
            byproduct_enabled: false,
            byproduct_price: None,
        };
        params.validate()?;
        Ok(params)
    }

    /// Add revenue from carbon credits, priced per ton of CO2
    pub fn with_carbon_credit_price(mut self, price: f64) -> Result<Self> {
        check("carbon_credit_price", price, price >= 0.0, "non-negative")?;
        self.carbon_credit_price = Some(price);
        Ok(self)
    }

    /// Enable byproduct sales, priced per ton of byproduct
    pub fn with_byproduct_price(mut self, price: f64) -> Result<Self> {
        check("byproduct_price", price, price >= 0.0, "non-negative")?;
        self.byproduct_enabled = true;
        self.byproduct_price = Some(price);
        Ok(self)
    }

    /// Parse and validate parameters from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the parameters to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<()> {
        check("yield_rate", self.yield_rate, self.yield_rate > 0.0, "positive")?;
        check(
            "capacity_factor",
            self.capacity_factor,
            self.capacity_factor > 0.0 && self.capacity_factor <= 1.0,
            "in (0, 1]",
        )?;
        check("tariff", self.tariff, self.tariff > 0.0, "positive")?;
        check("opex_per_ton", self.opex_per_ton, self.opex_per_ton >= 0.0, "non-negative")?;
        check("fixed_opex", self.fixed_opex, self.fixed_opex >= 0.0, "non-negative")?;
        check("capex", self.capex, self.capex > 0.0, "positive")?;
        check(
            "discount_rate",
            self.discount_rate,
            self.discount_rate > 0.0 && self.discount_rate <= 1.0,
            "in (0, 1]",
        )?;
        if !(1..=MAX_HORIZON_YEARS).contains(&self.horizon_years) {
            return Err(FinanceError::InvalidParameter(format!(
                "horizon_years must be 1 to {}, got {}",
                MAX_HORIZON_YEARS, self.horizon_years
            )));
        }
        if let Some(price) = self.carbon_credit_price {
            check("carbon_credit_price", price, price >= 0.0, "non-negative")?;
        }
        if let Some(price) = self.byproduct_price {
            check("byproduct_price", price, price >= 0.0, "non-negative")?;
        }
        Ok(())
    }

    /// Energy yield, kWh per ton
    pub fn yield_rate(&self) -> f64 {
        self.yield_rate
    }

    pub fn capacity_factor(&self) -> f64 {
        self.capacity_factor
    }

    /// Electricity tariff per kWh
    pub fn tariff(&self) -> f64 {
        self.tariff
    }

    /// Variable operating cost per ton of waste
    pub fn opex_per_ton(&self) -> f64 {
        self.opex_per_ton
    }

    /// Fixed operating cost per year
    pub fn fixed_opex(&self) -> f64 {
        self.fixed_opex
    }

    pub fn capex(&self) -> f64 {
        self.capex
    }

    pub fn discount_rate(&self) -> f64 {
        self.discount_rate
    }

    pub fn horizon_years(&self) -> u32 {
        self.horizon_years
    }

    pub fn carbon_credit_price(&self) -> Option<f64> {
        self.carbon_credit_price
    }

    /// Byproduct price, only when byproduct sales are enabled
    pub fn byproduct_price(&self) -> Option<f64> {
        if self.byproduct_enabled {
            self.byproduct_price
        } else {
            None
        }
    }

    /// Current value of a named parameter; unset prices read as 0
    pub fn value(&self, name: ParameterName) -> f64 {
        match name {
            ParameterName::YieldRate => self.yield_rate,
            ParameterName::CapacityFactor => self.capacity_factor,
            ParameterName::Tariff => self.tariff,
            ParameterName::OpexPerTon => self.opex_per_ton,
            ParameterName::FixedOpex => self.fixed_opex,
            ParameterName::Capex => self.capex,
            ParameterName::DiscountRate => self.discount_rate,
            ParameterName::CarbonCreditPrice => self.carbon_credit_price.unwrap_or(0.0),
            ParameterName::ByproductPrice => self.byproduct_price.unwrap_or(0.0),
        }
    }

    /// Copy with one parameter replaced.
    ///
    /// Used for sensitivity variants, so bounds such as `capacity_factor <= 1`
    /// are not re-checked. An unset price stays unset.
    pub(crate) fn with_value(&self, name: ParameterName, value: f64) -> Self {
        let mut variant = self.clone();
        match name {
            ParameterName::YieldRate => variant.yield_rate = value,
            ParameterName::CapacityFactor => variant.capacity_factor = value,
            ParameterName::Tariff => variant.tariff = value,
            ParameterName::OpexPerTon => variant.opex_per_ton = value,
            ParameterName::FixedOpex => variant.fixed_opex = value,
            ParameterName::Capex => variant.capex = value,
            ParameterName::DiscountRate => variant.discount_rate = value,
            ParameterName::CarbonCreditPrice => {
                variant.carbon_credit_price = variant.carbon_credit_price.map(|_| value)
            }
            ParameterName::ByproductPrice => {
                variant.byproduct_price = variant.byproduct_price.map(|_| value)
            }
        }
        variant
    }
}

/// Parameters that can be varied in a sensitivity analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterName {
    YieldRate,
    CapacityFactor,
    Tariff,
    OpexPerTon,
    FixedOpex,
    Capex,
    DiscountRate,
    CarbonCreditPrice,
    ByproductPrice,
}

impl ParameterName {
    /// Every variable parameter
    pub const ALL: [ParameterName; 9] = [
        ParameterName::YieldRate,
        ParameterName::CapacityFactor,
        ParameterName::Tariff,
        ParameterName::OpexPerTon,
        ParameterName::FixedOpex,
        ParameterName::Capex,
        ParameterName::DiscountRate,
        ParameterName::CarbonCreditPrice,
        ParameterName::ByproductPrice,
    ];

    /// Snake-case identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            ParameterName::YieldRate => "yield_rate",
            ParameterName::CapacityFactor => "capacity_factor",
            ParameterName::Tariff => "tariff",
            ParameterName::OpexPerTon => "opex_per_ton",
            ParameterName::FixedOpex => "fixed_opex",
            ParameterName::Capex => "capex",
            ParameterName::DiscountRate => "discount_rate",
            ParameterName::CarbonCreditPrice => "carbon_credit_price",
            ParameterName::ByproductPrice => "byproduct_price",
        }
    }

    /// Human-readable label for charts
    pub fn label(&self) -> &'static str {
        match self {
            ParameterName::YieldRate => "Energy Yield",
            ParameterName::CapacityFactor => "Capacity Factor",
            ParameterName::Tariff => "Electricity Tariff",
            ParameterName::OpexPerTon => "Variable OPEX",
            ParameterName::FixedOpex => "Fixed OPEX",
            ParameterName::Capex => "CAPEX",
            ParameterName::DiscountRate => "Discount Rate",
            ParameterName::CarbonCreditPrice => "Carbon Credit Price",
            ParameterName::ByproductPrice => "Byproduct Price",
        }
    }
}

impl fmt::Display for ParameterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParameterName {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self> {
        ParameterName::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| FinanceError::UnknownParameter(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> FinancialParameters {
        FinancialParameters::new(500.0, 0.85, 6.0, 200.0, 500_000.0, 20_000_000.0, 0.1, 15)
            .unwrap()
    }

    #[test]
    fn test_valid_parameters() {
        let params = base();
        assert_eq!(params.horizon_years(), 15);
        assert_eq!(params.carbon_credit_price(), None);
        assert_eq!(params.byproduct_price(), None);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(FinancialParameters::new(0.0, 0.85, 6.0, 200.0, 0.0, 1.0, 0.1, 15).is_err());
        assert!(FinancialParameters::new(500.0, 1.2, 6.0, 200.0, 0.0, 1.0, 0.1, 15).is_err());
        assert!(FinancialParameters::new(500.0, 0.85, 6.0, -1.0, 0.0, 1.0, 0.1, 15).is_err());
        assert!(FinancialParameters::new(500.0, 0.85, 6.0, 200.0, 0.0, 0.0, 0.1, 15).is_err());
        assert!(FinancialParameters::new(500.0, 0.85, 6.0, 200.0, 0.0, 1.0, 0.0, 15).is_err());
        assert!(FinancialParameters::new(500.0, 0.85, 6.0, 200.0, 0.0, 1.0, 0.1, 0).is_err());
        assert!(FinancialParameters::new(500.0, 0.85, 6.0, 200.0, 0.0, 1.0, 0.1, 51).is_err());
        assert!(FinancialParameters::new(500.0, 0.85, 6.0, 200.0, 0.0, 1.0, 0.1, u32::MAX).is_err());
        assert!(FinancialParameters::new(500.0, 0.85, 6.0, 200.0, 0.0, 1.0, 0.1, 50).is_ok());
        assert!(FinancialParameters::new(f64::NAN, 0.85, 6.0, 200.0, 0.0, 1.0, 0.1, 5).is_err());
        assert!(base().with_carbon_credit_price(-5.0).is_err());
    }

    #[test]
    fn test_byproduct_toggle() {
        let params = base().with_byproduct_price(1500.0).unwrap();
        assert_eq!(params.byproduct_price(), Some(1500.0));
        assert_eq!(params.value(ParameterName::ByproductPrice), 1500.0);
    }

    #[test]
    fn test_json_round_trip_validates() {
        let json = r#"{
            "yield_rate": 500.0,
            "capacity_factor": 0.85,
            "tariff": 6.0,
            "opex_per_ton": 200.0,
            "fixed_opex": 500000.0,
            "capex": 20000000.0,
            "discount_rate": 0.1,
            "horizon_years": 15,
            "carbon_credit_price": 800.0
        }"#;
        let params = FinancialParameters::from_json_str(json).unwrap();
        assert_eq!(params.carbon_credit_price(), Some(800.0));
        assert!(!params.byproduct_enabled);

        let reparsed = FinancialParameters::from_json_str(&params.to_json().unwrap()).unwrap();
        assert_eq!(reparsed, params);

        let invalid = json.replace("0.85", "1.5");
        assert!(matches!(
            FinancialParameters::from_json_str(&invalid),
            Err(FinanceError::Serialization(_))
        ));

        let too_long = json.replace("\"horizon_years\": 15", "\"horizon_years\": 4000000000");
        assert!(FinancialParameters::from_json_str(&too_long).is_err());
    }

    #[test]
    fn test_parameter_names() {
        for name in ParameterName::ALL {
            assert_eq!(name.as_str().parse::<ParameterName>().unwrap(), name);
        }
        assert!(matches!(
            "interest_rate".parse::<ParameterName>(),
            Err(FinanceError::UnknownParameter(_))
        ));
        assert_eq!(ParameterName::OpexPerTon.to_string(), "opex_per_ton");
    }

    #[test]
    fn test_variants_are_not_revalidated() {
        let params = base();
        let variant = params.with_value(ParameterName::CapacityFactor, 0.85 * 1.15);
        assert!(variant.capacity_factor() > 1.0);
        assert_eq!(params.capacity_factor(), 0.85);

        // Unset prices stay unset
        let variant = params.with_value(ParameterName::CarbonCreditPrice, 100.0);
        assert_eq!(variant.carbon_credit_price(), None);
    }
}
