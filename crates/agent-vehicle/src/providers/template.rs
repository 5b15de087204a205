//! Template-based reasoning generator
//!
//! Renders the three reasoning statements with MiniJinja. Used as a
//! standalone [`ExplanationProvider`] and as the explanation stage's local
//! fallback when the configured generator fails.

use super::{ExplanationProvider, ExplanationRequest, GeneratedNarrative, NarrativeMethod};
use crate::error::Result;
use crate::metrics::whole_dollars;
use crate::types::InventoryTrend;
use async_trait::async_trait;
use minijinja::{Environment, context};

/// Generator name recorded in the execution log
pub const TEMPLATE_GENERATOR: &str = "local templates";

const OUTLOOK_TEMPLATE: &str = "The {{ vehicle }} is projected to \
{% if change < 0 %}decline{% else %}rise{% endif %} {{ magnitude }}% over 90 days \
from a current fair value of ${{ price }}.";

const SIGNAL_TEMPLATE: &str = "With {{ confidence }}% confidence and {{ volatility }} \
volatility, the decision rules point to {{ recommendation }}: {{ rationale }}";

const CONTEXT_TEMPLATE: &str = "{% if insight %}{{ insight }}{% else %}Inventory is \
{{ inventory }} in {{ region }} for a {{ condition }}-condition vehicle with \
{{ mileage }} miles; re-check pricing before committing.{% endif %}";

/// Render the narrative for `request` without any external call
pub fn render_narrative(request: &ExplanationRequest) -> Result<GeneratedNarrative> {
    let env = Environment::new();

    let inventory = match request.inventory_trend {
        InventoryTrend::Unknown => "of unknown direction",
        trend => trend.as_str(),
    };
    let vars = context! {
        vehicle => request.vehicle,
        change => request.predicted_90_day_change,
        magnitude => format!("{:.1}", request.predicted_90_day_change.abs()),
        price => whole_dollars(request.predicted_price),
        confidence => request.confidence_score,
        volatility => request.volatility.as_str().to_lowercase(),
        recommendation => request.final_recommendation.as_str(),
        rationale => request.decision_rationale,
        insight => request.key_insight.trim(),
        inventory => inventory,
        region => request.region,
        condition => request.condition,
        mileage => crate::metrics::group_thousands(i64::from(request.mileage)),
    };

    let statements = [OUTLOOK_TEMPLATE, SIGNAL_TEMPLATE, CONTEXT_TEMPLATE]
        .iter()
        .map(|template| env.render_str(template, &vars))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(GeneratedNarrative {
        statements,
        generator: TEMPLATE_GENERATOR.to_string(),
        method: NarrativeMethod::Template,
    })
}

/// Explanation provider backed by [`render_narrative`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateExplainer;

impl TemplateExplainer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ExplanationProvider for TemplateExplainer {
    async fn explain(&self, request: &ExplanationRequest) -> Result<GeneratedNarrative> {
        render_narrative(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Recommendation, TrendDirection, Volatility};

    fn request() -> ExplanationRequest {
        ExplanationRequest {
            vehicle: "2020 Nissan Leaf".to_string(),
            mileage: 62_000,
            condition: "good".to_string(),
            region: "oregon".to_string(),
            predicted_price: 18_240.4,
            predicted_90_day_change: -3.46,
            confidence_score: 78,
            volatility: Volatility::Moderate,
            final_recommendation: Recommendation::Wait,
            decision_rationale: "prices are falling with high confidence.".to_string(),
            key_insight: String::new(),
            trend_direction: TrendDirection::Falling,
            inventory_trend: InventoryTrend::Rising,
        }
    }

    #[test]
    fn test_render_narrative() {
        let narrative = render_narrative(&request()).unwrap();
        assert_eq!(narrative.method, NarrativeMethod::Template);
        assert_eq!(
            narrative.statements,
            vec![
                "The 2020 Nissan Leaf is projected to decline 3.5% over 90 days from a current fair value of $18,240.",
                "With 78% confidence and moderate volatility, the decision rules point to WAIT: prices are falling with high confidence.",
                "Inventory is rising in oregon for a good-condition vehicle with 62,000 miles; re-check pricing before committing.",
            ]
        );
    }

    #[test]
    fn test_key_insight_replaces_context_statement() {
        let mut req = request();
        req.key_insight = "Spring demand typically lifts EV prices.".to_string();
        let narrative = render_narrative(&req).unwrap();
        assert_eq!(narrative.statements[2], "Spring demand typically lifts EV prices.");
    }

    #[tokio::test]
    async fn test_explainer_delegates_to_templates() {
        let narrative = TemplateExplainer::new().explain(&request()).await.unwrap();
        assert_eq!(narrative.statements.len(), 3);
        assert_eq!(narrative.generator, TEMPLATE_GENERATOR);
    }
}
