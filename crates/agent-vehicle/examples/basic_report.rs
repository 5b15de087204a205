//! Basic vehicle report example
//!
//! Runs the pipeline against an in-memory market datastore and prints the
//! JSON report. Registered vehicles (e.g. `tesla "model 3"`) are served from
//! their fixture; `kia soul` and `mazda cx-5` run the live stages.
//!
//! To run this example:
//! ```bash
//! # Optional: JSON log records
//! export LOG_FORMAT=json
//!
//! cargo run --example basic_report -- kia soul 2019
//! ```

use agent_utils::{Config, init_tracing_with};
use agent_vehicle::providers::{MarketContext, MarketData, PricePoint, StaticMarketData};
use agent_vehicle::types::InventoryTrend;
use agent_vehicle::{Collaborators, Orchestrator, OverrideRegistry, PipelineConfig};
use chrono::NaiveDate;
use std::env;
use std::sync::Arc;

fn monthly_history(start: f64, monthly_change: f64, listings: u32) -> Vec<PricePoint> {
    (1..=12)
        .filter_map(|month| {
            let date = NaiveDate::from_ymd_opt(2024, month, 1)?;
            Some(PricePoint {
                date,
                avg_price: start + monthly_change * f64::from(month - 1),
                listing_count: listings,
            })
        })
        .collect()
}

fn demo_market() -> StaticMarketData {
    StaticMarketData::new()
        .with_vehicle(
            "Kia",
            "Soul",
            MarketData {
                price_history: monthly_history(17_800.0, -120.0, 85),
                market_context: MarketContext {
                    current_inventory_count: 640,
                    inventory_trend: InventoryTrend::Rising,
                    price_vs_median_pct: -0.8,
                },
            },
        )
        .with_vehicle(
            "Mazda",
            "CX-5",
            MarketData {
                price_history: monthly_history(24_100.0, 40.0, 140),
                market_context: MarketContext {
                    current_inventory_count: 1_120,
                    inventory_trend: InventoryTrend::Falling,
                    price_vs_median_pct: 2.4,
                },
            },
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing_with(&Config::from_env())?;

    // make model year, defaulting to a live vehicle
    let args: Vec<String> = env::args().skip(1).collect();
    let make = args.first().map_or("kia", String::as_str);
    let model = args.get(1).map_or("soul", String::as_str);
    let year = args.get(2).map_or(Ok(2019), |y| y.parse())?;

    let config = PipelineConfig::from_env()?;
    let orchestrator = Orchestrator::new(
        Arc::new(OverrideRegistry::builtin()?),
        Collaborators::reference(Arc::new(demo_market())),
        config,
    );

    let report = orchestrator.analyze(make, model, year).await?;
    println!("{}", report.to_json_pretty()?);

    Ok(())
}
