//! The two report producers
//!
//! [`FixtureProducer`] turns an override record into a report without any
//! collaborator call; [`LivePipelineProducer`] runs the seven stages. Both
//! converge on [`IntelligenceReport::assemble`].

use agent_core::{Agent, AgentOutput, LogEntry, StageError};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

use super::PipelineContext;
use super::log_builder::{ExecutionLogBuilder, ORCHESTRATOR_AGENT};
use super::report::{
    CanonicalReport, CompatInputs, DataFeatures, IntelligenceReport, PriceAnalysis, TrendData,
};
use crate::agents::decision::{decide, rationale};
use crate::agents::{
    DataAgent, DecisionAgent, ETHICS_DISCLAIMER, EthicsAgent, ExplanationAgent, ForecastAgent,
    RiskAssessmentAgent, TrendAnalysisAgent,
};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::metrics::{self, round_to};
use crate::overrides::OverrideRecord;
use crate::providers::{
    BaselineForecaster, CachedMarketData, ExplanationProvider, ForecastCurve, ForecastProvider,
    MarketContext, MarketDataProvider, PricePoint, TemplateExplainer,
};
use crate::query::VehicleQuery;
use crate::types::{BuyWindow, ForecastMethod, InventoryTrend, TrendDirection};

/// Anything that can turn a query into a report
#[async_trait]
pub trait ReportProducer: Send + Sync {
    async fn produce(&self, query: &VehicleQuery) -> Result<IntelligenceReport, PipelineError>;
}

/// Report built from an override fixture's seeds
#[derive(Debug, Clone, Copy)]
pub struct FixtureProducer<'a> {
    record: &'a OverrideRecord,
}

impl<'a> FixtureProducer<'a> {
    pub fn new(record: &'a OverrideRecord) -> Self {
        Self { record }
    }

    /// Build the report; fixtures need no collaborator and cannot fail
    pub fn build(&self, query: &VehicleQuery) -> IntelligenceReport {
        let record = self.record;
        let seeds = &record.seeds;
        let change = record.predicted_90_day_change;
        let current = seeds.current_price;
        let vehicle_name = query.display_name();

        let projected = metrics::projected_price(current, change);
        let direction = TrendDirection::of_change(change);
        let forecast_30d = metrics::forecast_30d(current, change);
        let key_insight = record.reasoning_summary[1].clone();
        let (_, rule) = decide(change, record.confidence_score, record.volatility);

        let canonical = CanonicalReport {
            agent_log: ExecutionLogBuilder::synthesize(&vehicle_name, record),
            vehicle_name,
            predicted_90_day_change: change,
            projected_price: projected,
            current_price: current,
            confidence_score: record.confidence_score,
            volatility_index: record.volatility,
            risk_score: record.risk_score,
            final_recommendation: record.final_recommendation,
            reasoning_summary: record.reasoning_summary.clone(),
            uncertainty_range: metrics::uncertainty_range(projected, record.volatility),
            transparency_note: record.transparency_note.clone(),
            bias_statement: record.bias_statement.clone(),
            ethics_disclaimer: ETHICS_DISCLAIMER.to_string(),
            trend_data: TrendData {
                direction,
                strength: metrics::fixture_trend_strength(change),
                momentum_score: metrics::momentum_score(change),
            },
            data_features: DataFeatures {
                ma_30: current,
                ma_90: projected,
                depreciation_rate: if change < 0.0 { change.abs() } else { 0.0 },
                seasonal_factor: 1.0,
            },
        };

        let compat = CompatInputs {
            legacy_confidence: record.legacy_confidence,
            forecast_30d,
            forecast_method: record.forecast_method,
            llm_key_insight: key_insight.clone(),
            shap_factors: Vec::new(),
            price_history: vec![PricePoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
                avg_price: current,
                listing_count: seeds.inventory_count,
            }],
            forecast_curve: ForecastCurve {
                forecast_30d,
                forecast_90d: projected,
                trend_direction: direction,
                trend_pct_change: round_to(change / 3.0, 2),
                trend_pct_90d: change,
                method: ForecastMethod::Prophet,
                last_known_price: Some(current),
            },
            market_context: MarketContext {
                current_inventory_count: seeds.inventory_count,
                inventory_trend: InventoryTrend::Stable,
                price_vs_median_pct: seeds.price_vs_median_pct,
            },
            price_analysis: PriceAnalysis {
                forecast_30d,
                forecast_90d: projected,
                trend_direction: direction,
                key_insight,
                best_time_to_buy: BuyWindow::for_recommendation(record.final_recommendation),
            },
            decision_rationale: rationale(
                rule,
                change,
                record.confidence_score,
                seeds.price_vs_median_pct,
            ),
        };

        IntelligenceReport::assemble(canonical, compat)
    }
}

#[async_trait]
impl ReportProducer for FixtureProducer<'_> {
    async fn produce(&self, query: &VehicleQuery) -> Result<IntelligenceReport, PipelineError> {
        Ok(self.build(query))
    }
}

/// External collaborators of the live stages
#[derive(Clone)]
pub struct Collaborators {
    pub market: Arc<dyn MarketDataProvider>,
    pub forecaster: Arc<dyn ForecastProvider>,
    pub explainer: Arc<dyn ExplanationProvider>,
}

impl Collaborators {
    pub fn new(
        market: Arc<dyn MarketDataProvider>,
        forecaster: Arc<dyn ForecastProvider>,
        explainer: Arc<dyn ExplanationProvider>,
    ) -> Self {
        Self {
            market,
            forecaster,
            explainer,
        }
    }

    /// Baseline forecaster and template explainer over `market`
    pub fn reference(market: Arc<dyn MarketDataProvider>) -> Self {
        Self::new(
            market,
            Arc::new(BaselineForecaster::new()),
            Arc::new(TemplateExplainer::new()),
        )
    }
}

/// Market data as seen by the data stage
pub type MarketCache = CachedMarketData<Arc<dyn MarketDataProvider>>;

/// The seven live stages, run in order over one [`PipelineContext`]
pub struct LivePipelineProducer {
    market_cache: Arc<MarketCache>,
    data: DataAgent,
    trend: TrendAnalysisAgent,
    forecast: ForecastAgent,
    risk: RiskAssessmentAgent,
    decision: DecisionAgent,
    explanation: ExplanationAgent,
    ethics: EthicsAgent,
}

impl LivePipelineProducer {
    /// Wire the stages; market data is cached for `config.market_cache_ttl`
    pub fn new(collaborators: Collaborators, config: &PipelineConfig) -> Self {
        let timeout = config.stage_timeout;
        let market_cache = Arc::new(CachedMarketData::new(
            collaborators.market,
            config.market_cache_ttl,
        ));
        let market: Arc<dyn MarketDataProvider> = market_cache.clone();

        Self {
            market_cache,
            data: DataAgent::new(market, timeout),
            trend: TrendAnalysisAgent::new(Arc::clone(&collaborators.forecaster), timeout),
            forecast: ForecastAgent::new(collaborators.forecaster, timeout),
            risk: RiskAssessmentAgent::new(),
            decision: DecisionAgent::new(),
            explanation: ExplanationAgent::new(collaborators.explainer, timeout),
            ethics: EthicsAgent::new(),
        }
    }

    pub fn market_cache(&self) -> &MarketCache {
        &self.market_cache
    }

    /// Run one stage under the failure policy
    ///
    /// A recoverable error with a neutral default records a `degraded`
    /// entry and continues. Anything else records a `failed` entry and
    /// aborts with the partial log.
    async fn run_stage<A>(
        &self,
        agent: &A,
        context: &PipelineContext,
        log: &mut ExecutionLogBuilder,
    ) -> Result<A::Output, PipelineError>
    where
        A: Agent<PipelineContext>,
    {
        let outcome = match agent.run(context).await {
            Ok(output) => {
                let entry = agent.describe(&output);
                AgentOutput::new(output, entry)
            }
            Err(err) => match agent.fallback(context).filter(|_| err.is_recoverable()) {
                Some(output) => {
                    tracing::warn!(agent = agent.name(), error = %err, "stage degraded");
                    let entry = agent.describe(&output).degraded(&err);
                    AgentOutput::new(output, entry)
                }
                None => {
                    tracing::error!(agent = agent.name(), error = %err, "stage failed");
                    log.push(LogEntry::failed(agent.name(), &err));
                    return Err(PipelineError::StageFailed {
                        agent: agent.name().to_string(),
                        source: err,
                        log: log.entries().to_vec(),
                    });
                }
            },
        };

        log.push(outcome.log_entry);
        Ok(outcome.payload)
    }

    fn assemble(
        context: &PipelineContext,
        log: ExecutionLogBuilder,
    ) -> agent_core::Result<IntelligenceReport> {
        let data = context.require_data()?;
        let trend = context.require_trend()?;
        let forecast = context.require_forecast()?;
        let risk = context.require_risk()?;
        let decision = context.require_decision()?;
        let explanation = context.require_explanation()?;
        let ethics = context.require_ethics()?;

        let confidence = forecast.confidence_base;
        let forecast_30d = round_to(forecast.forecast_30d, 2);

        let canonical = CanonicalReport {
            vehicle_name: context.query().display_name(),
            predicted_90_day_change: risk.predicted_90_day_change,
            projected_price: round_to(forecast.forecast_90d, 2),
            current_price: round_to(forecast.predicted_price, 2),
            confidence_score: confidence,
            volatility_index: risk.volatility,
            risk_score: risk.risk_score,
            final_recommendation: decision.final_recommendation,
            reasoning_summary: explanation.reasoning_summary.clone(),
            uncertainty_range: risk.uncertainty_range,
            transparency_note: ethics.transparency_note.clone(),
            bias_statement: ethics.bias_statement.clone(),
            ethics_disclaimer: ethics.ethics_disclaimer.clone(),
            agent_log: log.finish(decision.final_recommendation, confidence, risk.volatility),
            trend_data: trend.trend.clone(),
            data_features: trend.features.clone(),
        };

        let compat = CompatInputs {
            legacy_confidence: metrics::legacy_confidence(confidence),
            forecast_30d,
            forecast_method: forecast.method,
            llm_key_insight: forecast.key_insight.clone(),
            shap_factors: forecast.factors.clone(),
            price_history: data.price_history.clone(),
            forecast_curve: trend.curve.clone(),
            market_context: data.market_context.clone(),
            price_analysis: PriceAnalysis {
                forecast_30d,
                forecast_90d: round_to(forecast.forecast_90d, 2),
                trend_direction: trend.trend.direction,
                key_insight: forecast.key_insight.clone(),
                best_time_to_buy: forecast.best_time_to_buy,
            },
            decision_rationale: decision.rationale.clone(),
        };

        Ok(IntelligenceReport::assemble(canonical, compat))
    }
}

#[async_trait]
impl ReportProducer for LivePipelineProducer {
    async fn produce(&self, query: &VehicleQuery) -> Result<IntelligenceReport, PipelineError> {
        let mut log = ExecutionLogBuilder::start(&query.display_name());
        let mut context = PipelineContext::new(query.clone());

        let data = self.run_stage(&self.data, &context, &mut log).await?;
        context.data = Some(data);
        let trend = self.run_stage(&self.trend, &context, &mut log).await?;
        context.trend = Some(trend);
        let forecast = self.run_stage(&self.forecast, &context, &mut log).await?;
        context.forecast = Some(forecast);
        let risk = self.run_stage(&self.risk, &context, &mut log).await?;
        context.risk = Some(risk);
        let decision = self.run_stage(&self.decision, &context, &mut log).await?;
        context.decision = Some(decision);
        let explanation = self.run_stage(&self.explanation, &context, &mut log).await?;
        context.explanation = Some(explanation);
        let ethics = self.run_stage(&self.ethics, &context, &mut log).await?;
        context.ethics = Some(ethics);

        let partial = log.entries().to_vec();
        Self::assemble(&context, log).map_err(|source: StageError| PipelineError::StageFailed {
            agent: ORCHESTRATOR_AGENT.to_string(),
            source,
            log: partial,
        })
    }
}
