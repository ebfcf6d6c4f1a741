use bia::store::{EntityProfile, InMemoryLogStore, LogStore, WasteLog, WasteType};
use bia::{FinancialParameters, SiteAssessment};
use chrono::{Duration, NaiveDate};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("BIA: Site Assessment Example");
    println!("============================\n");

    // Register a site and log three months of waste
    let store = InMemoryLogStore::new();
    store.add_entity(EntityProfile::new(
        "ahmedabad-kitchens",
        "Ahmedabad Community Kitchens",
        "Ahmedabad",
        WasteType::Organic,
    )?)?;

    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("invalid start date")?;
    for day in 0..90 {
        let weekday_factor = if day % 7 >= 5 { 0.75 } else { 1.0 };
        let tons = (18.0 + 0.04 * day as f64) * weekday_factor + ((day * 13) % 5) as f64 * 0.3;
        store.add_log(WasteLog::new(
            "ahmedabad-kitchens",
            start + Duration::days(day),
            tons,
        )?)?;
    }

    let params = FinancialParameters::from_json_str(
        r#"{
            "yield_rate": 450.0,
            "capacity_factor": 0.85,
            "tariff": 6.5,
            "opex_per_ton": 250.0,
            "fixed_opex": 600000.0,
            "capex": 25000000.0,
            "discount_rate": 0.1,
            "horizon_years": 15,
            "carbon_credit_price": 800.0
        }"#,
    )?;

    let report = SiteAssessment::new().assess_entity(&store, "ahmedabad-kitchens", &params, 30)?;

    println!("Model: {} ({:?})", report.model.name, report.forecast_status);
    for (name, score) in &report.model_scores {
        println!("  backtest MAPE {:>8.2}%  {}", score, name);
    }

    println!("\nNext 7 days:");
    for day in report.forecast.iter().take(7) {
        println!("  {}: {:.2} t", day.date, day.quantity);
    }

    let summary = &report.summary;
    println!("\nRepresentative daily quantity: {:.2} t", report.daily_quantity);
    println!("NPV:        {:>16.0}", summary.npv);
    println!("Payback:    {:>16}", summary.payback_years.to_string());
    println!("ROI:        {:>15.1}%", summary.roi_percent);
    println!("IRR (approx): {:>13.1}%", summary.irr_percent);
    println!("CO2 saved:  {:>14.0} t", summary.co2_savings_tons);
    println!("Trees:      {:>16.0}", summary.trees_equivalent);

    println!("\nSensitivity (±15%):");
    for result in &report.tornado {
        println!(
            "  {:<20} low {:>14.0}  high {:>14.0}  impact {:>14.0}",
            result.parameter.label(),
            result.npv_low,
            result.npv_high,
            result.impact
        );
    }

    let mut csv = Vec::new();
    bia::energy_finance::cashflow::cashflows_to_csv(&report.cashflows, &mut csv)?;
    println!("\nCashflow table:\n{}", String::from_utf8(csv)?);

    Ok(())
}
