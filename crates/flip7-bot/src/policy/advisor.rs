use super::{Action, Policy, PolicyContext};
use crate::bot::AdvisorSettings;
use flip7_core::{Advisor, Recommendation, StrategyResult};
use tracing::{Level, event};

/// Follows the engine's recommendation.
pub struct AdvisorPolicy {
    name: String,
    advisor: Advisor,
    toss_up: Action,
}

impl AdvisorPolicy {
    pub fn new(name: impl Into<String>, settings: AdvisorSettings) -> Self {
        Self {
            name: name.into(),
            advisor: Advisor::new(settings.strategy),
            toss_up: settings.toss_up,
        }
    }
}

impl Policy for AdvisorPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &PolicyContext) -> Action {
        let result = self.advisor.evaluate(ctx.observation);
        let action = match result.recommendation {
            Recommendation::Hit => Action::Hit,
            Recommendation::Stay => Action::Stay,
            Recommendation::TossUp => self.toss_up,
        };
        log_advised_decision(&self.name, ctx, &result, action);
        action
    }
}

fn log_advised_decision(name: &str, ctx: &PolicyContext, result: &StrategyResult, action: Action) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let danger = result
        .danger_faces
        .iter()
        .map(|face| face.to_string())
        .collect::<Vec<_>>()
        .join(",");

    event!(
        target: "flip7_bot::decision",
        Level::INFO,
        policy = name,
        action = %action,
        recommendation = %result.recommendation,
        bust_probability = result.bust_probability,
        effective_bust_probability = result.effective_bust_probability,
        ev_hit = result.ev_hit,
        ev_stay = result.ev_stay,
        confidence = result.confidence,
        flip7_potential = result.flip7_potential,
        danger = %danger,
        hand_size = ctx.observation.hand.unique_len(),
        draws = ctx.draws,
        reason = "advisor",
    );
}
