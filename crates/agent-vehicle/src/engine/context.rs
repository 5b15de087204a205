//! Accumulating state of one live pipeline run

use agent_core::{Result, StageError};

use crate::agents::{
    DataOutput, DecisionOutput, EthicsOutput, ExplanationOutput, ForecastOutput, RiskOutput,
    TrendOutput,
};
use crate::query::VehicleQuery;

/// Typed stage outputs, filled in execution order
///
/// A stage reads earlier outputs through the `require_*` accessors, which
/// report a missing output as [`StageError::MissingInput`].
#[derive(Debug, Clone)]
pub struct PipelineContext {
    query: VehicleQuery,
    pub data: Option<DataOutput>,
    pub trend: Option<TrendOutput>,
    pub forecast: Option<ForecastOutput>,
    pub risk: Option<RiskOutput>,
    pub decision: Option<DecisionOutput>,
    pub explanation: Option<ExplanationOutput>,
    pub ethics: Option<EthicsOutput>,
}

fn require<'a, T>(slot: Option<&'a T>, input: &'static str) -> Result<&'a T> {
    slot.ok_or(StageError::MissingInput { input })
}

impl PipelineContext {
    pub fn new(query: VehicleQuery) -> Self {
        Self {
            query,
            data: None,
            trend: None,
            forecast: None,
            risk: None,
            decision: None,
            explanation: None,
            ethics: None,
        }
    }

    pub fn query(&self) -> &VehicleQuery {
        &self.query
    }

    pub fn require_data(&self) -> Result<&DataOutput> {
        require(self.data.as_ref(), "market data")
    }

    pub fn require_trend(&self) -> Result<&TrendOutput> {
        require(self.trend.as_ref(), "trend analysis")
    }

    pub fn require_forecast(&self) -> Result<&ForecastOutput> {
        require(self.forecast.as_ref(), "price forecast")
    }

    pub fn require_risk(&self) -> Result<&RiskOutput> {
        require(self.risk.as_ref(), "risk assessment")
    }

    pub fn require_decision(&self) -> Result<&DecisionOutput> {
        require(self.decision.as_ref(), "decision")
    }

    pub fn require_explanation(&self) -> Result<&ExplanationOutput> {
        require(self.explanation.as_ref(), "explanation")
    }

    pub fn require_ethics(&self) -> Result<&EthicsOutput> {
        require(self.ethics.as_ref(), "ethics review")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_inputs_are_fatal() {
        let context = PipelineContext::new(VehicleQuery::new("Kia", "Soul", 2019).unwrap());

        let err = context.require_forecast().unwrap_err();
        assert_eq!(err, StageError::MissingInput { input: "price forecast" });
        assert!(!err.is_recoverable());
        assert!(context.require_data().is_err());
        assert_eq!(context.query().registry_key(), "kia soul");
    }
}
