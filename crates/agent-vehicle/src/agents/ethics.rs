//! Ethics review agent
//!
//! Produces the transparency note, a make-specific bias statement and the
//! static disclaimer. The fairness check is always reported and never blocks
//! the report.

use agent_core::{Agent, LogEntry, Result};
use async_trait::async_trait;

use crate::engine::PipelineContext;
use crate::engine::log_builder::{ETHICS_AGENT, EthicsSnapshot, ethics_entry};
use crate::types::{FairnessCheck, ForecastMethod, InventoryTrend, Volatility};

/// Disclaimer attached to every report
pub const ETHICS_DISCLAIMER: &str = "This AI recommendation is advisory only and is not \
financial advice. Forecasts are estimates based on historical market data and may not reflect \
local conditions; verify pricing with multiple sources before making a purchase decision.";

const FAIRNESS_MIN_CONFIDENCE: u8 = 50;

const LUXURY_MAKES: &[&str] = &[
    "bmw", "mercedes", "mercedes-benz", "audi", "lexus", "porsche", "jaguar", "land rover",
    "volvo", "genesis", "cadillac", "lincoln", "infiniti", "acura",
];
const EV_MAKES: &[&str] = &["tesla", "rivian", "lucid", "polestar"];
const TRUCK_MAKES: &[&str] = &["ford", "ram", "chevrolet", "gmc"];
const WELL_REPRESENTED_MAKES: &[&str] = &["toyota", "honda", "nissan", "hyundai", "kia", "mazda", "subaru"];

/// Output of the ethics stage
#[derive(Debug, Clone, PartialEq)]
pub struct EthicsOutput {
    pub transparency_note: String,
    pub bias_statement: String,
    pub ethics_disclaimer: String,
    pub fairness_check: FairnessCheck,
}

/// Known data-quality caveats for a make
pub fn bias_statement(make: &str) -> String {
    let make = make.trim().to_lowercase();
    let statement = if EV_MAKES.contains(&make.as_str()) {
        "EV resale data is sparse and sensitive to subsidy and battery-warranty changes, so residual values can shift quickly."
    } else if LUXURY_MAKES.contains(&make.as_str()) {
        "Luxury vehicles are underrepresented in listing data, and maintenance or out-of-warranty costs are not factored into this prediction."
    } else if TRUCK_MAKES.contains(&make.as_str()) {
        "Truck pricing varies strongly by region; national averages may not reflect your local market."
    } else if WELL_REPRESENTED_MAKES.contains(&make.as_str()) {
        "This make is well represented in listing data, so model bias is expected to be below average."
    } else {
        "Listing coverage for this make is limited; treat the forecast as a rough guide and compare local prices."
    };
    statement.to_string()
}

/// How the forecast was produced and how much to trust it
pub fn transparency_note(
    method: ForecastMethod,
    history_months: usize,
    confidence: u8,
    volatility: Volatility,
) -> String {
    if history_months == 0 {
        return format!(
            "No price history was available; the {} forecast relies on industry estimates \
             ({confidence}% confidence, {volatility} volatility).",
            method.label()
        );
    }
    format!(
        "{} forecast built from {history_months} months of price history \
         ({confidence}% confidence, {volatility} volatility).",
        method.label()
    )
}

pub fn fairness_check(has_history: bool, inventory_trend: InventoryTrend, confidence: u8) -> FairnessCheck {
    if has_history && inventory_trend != InventoryTrend::Unknown && confidence >= FAIRNESS_MIN_CONFIDENCE {
        FairnessCheck::Passed
    } else {
        FairnessCheck::Failed
    }
}

/// Agent attaching transparency and bias disclosures
#[derive(Debug, Clone, Copy, Default)]
pub struct EthicsAgent;

impl EthicsAgent {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Agent<PipelineContext> for EthicsAgent {
    type Output = EthicsOutput;

    fn name(&self) -> &str {
        ETHICS_AGENT
    }

    async fn run(&self, context: &PipelineContext) -> Result<EthicsOutput> {
        let data = context.require_data()?;
        let forecast = context.require_forecast()?;
        let risk = context.require_risk()?;

        let fairness = fairness_check(
            data.has_history,
            data.market_context.inventory_trend,
            forecast.confidence_base,
        );
        if fairness == FairnessCheck::Failed {
            tracing::warn!(
                has_history = data.has_history,
                inventory_trend = %data.market_context.inventory_trend,
                confidence = forecast.confidence_base,
                "fairness check failed"
            );
        }

        Ok(EthicsOutput {
            transparency_note: transparency_note(
                forecast.method,
                data.price_history.len(),
                forecast.confidence_base,
                risk.volatility,
            ),
            bias_statement: bias_statement(context.query().make()),
            ethics_disclaimer: ETHICS_DISCLAIMER.to_string(),
            fairness_check: fairness,
        })
    }

    fn describe(&self, output: &EthicsOutput) -> LogEntry {
        ethics_entry(&EthicsSnapshot::reviewed(output.fairness_check))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bias_statement_by_make() {
        assert!(bias_statement("Tesla").starts_with("EV resale"));
        assert!(bias_statement(" BMW ").starts_with("Luxury"));
        assert!(bias_statement("ram").starts_with("Truck"));
        assert!(bias_statement("Toyota").contains("well represented"));
        assert!(bias_statement("Lada").starts_with("Listing coverage"));
    }

    #[test]
    fn test_fairness_check() {
        assert_eq!(fairness_check(true, InventoryTrend::Stable, 50), FairnessCheck::Passed);
        assert_eq!(fairness_check(true, InventoryTrend::Stable, 49), FairnessCheck::Failed);
        assert_eq!(fairness_check(false, InventoryTrend::Stable, 90), FairnessCheck::Failed);
        assert_eq!(fairness_check(true, InventoryTrend::Unknown, 90), FairnessCheck::Failed);
    }

    #[test]
    fn test_transparency_note() {
        assert_eq!(
            transparency_note(ForecastMethod::LinearTrend, 8, 69, Volatility::Low),
            "Linear-trend forecast built from 8 months of price history (69% confidence, Low volatility)."
        );
        assert!(
            transparency_note(ForecastMethod::IndustryEstimate, 0, 40, Volatility::Moderate)
                .starts_with("No price history was available")
        );
    }

    #[test]
    fn test_ethics_entry() {
        let output = EthicsOutput {
            transparency_note: String::new(),
            bias_statement: String::new(),
            ethics_disclaimer: ETHICS_DISCLAIMER.to_string(),
            fairness_check: FairnessCheck::Failed,
        };
        let entry = EthicsAgent::new().describe(&output);
        assert!(entry.message.ends_with("Fairness check failed."));
        assert_eq!(entry.output["fairness_check"], "failed");
    }
}
