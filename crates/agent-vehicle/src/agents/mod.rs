//! The seven live pipeline stages

pub mod data_retrieval;
pub mod decision;
pub mod ethics;
pub mod explanation;
pub mod forecast;
pub mod risk_assessment;
pub mod trend_analysis;

pub use data_retrieval::{DataAgent, DataOutput};
pub use decision::{DecisionAgent, DecisionOutput, DecisionRule};
pub use ethics::{ETHICS_DISCLAIMER, EthicsAgent, EthicsOutput};
pub use explanation::{ExplanationAgent, ExplanationOutput};
pub use forecast::{ForecastAgent, ForecastOutput};
pub use risk_assessment::{RiskAssessmentAgent, RiskOutput};
pub use trend_analysis::{TrendAnalysisAgent, TrendOutput};

use agent_core::StageError;
use std::future::Future;
use std::time::Duration;

/// Await a collaborator call within the stage budget
///
/// Collaborator errors convert through `From<VehicleError>`; an elapsed
/// budget becomes a recoverable [`StageError::Timeout`].
pub(crate) async fn call_with_timeout<T>(
    limit: Duration,
    call: impl Future<Output = crate::Result<T>> + Send,
) -> agent_core::Result<T> {
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(StageError::from),
        Err(_) => Err(StageError::Timeout { after: limit }),
    }
}
