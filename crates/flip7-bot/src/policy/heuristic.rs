use super::{Action, Policy, PolicyContext};
use flip7_core::odds::{bust_probability, unknown_pool};
use tracing::{Level, event};

/// Rule-of-thumb players used as baselines for the advisor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeuristicStyle {
    /// Hit until the banked card points reach the target.
    Threshold(u32),
    /// Hit while the chance of busting on the next card stays at or below the cap.
    RiskCap(f64),
    /// Never stay voluntarily.
    Reckless,
}

pub struct HeuristicPolicy {
    name: String,
    style: HeuristicStyle,
}

impl HeuristicPolicy {
    pub fn new(name: impl Into<String>, style: HeuristicStyle) -> Self {
        Self {
            name: name.into(),
            style,
        }
    }

    pub fn threshold(target: u32) -> Self {
        Self::new(format!("threshold_{target}"), HeuristicStyle::Threshold(target))
    }

    pub fn style(&self) -> HeuristicStyle {
        self.style
    }
}

impl Policy for HeuristicPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn choose(&mut self, ctx: &PolicyContext) -> Action {
        let observation = ctx.observation;
        let (action, reason) = match self.style {
            HeuristicStyle::Threshold(target) => {
                let multiplier = if observation.modifiers.times_two { 2 } else { 1 };
                let points = observation.hand.points() * multiplier;
                if points < target {
                    (Action::Hit, "below_threshold")
                } else {
                    (Action::Stay, "threshold_reached")
                }
            }
            HeuristicStyle::RiskCap(cap) => {
                let pool = unknown_pool(&observation.revealed);
                let p_bust = if observation.modifiers.second_chance {
                    0.0
                } else {
                    bust_probability(&observation.hand, &pool)
                };
                if p_bust <= cap {
                    (Action::Hit, "risk_acceptable")
                } else {
                    (Action::Stay, "risk_too_high")
                }
            }
            HeuristicStyle::Reckless => (Action::Hit, "reckless"),
        };

        if tracing::enabled!(Level::INFO) {
            event!(
                target: "flip7_bot::decision",
                Level::INFO,
                policy = %self.name,
                action = %action,
                style = ?self.style,
                hand_size = observation.hand.unique_len(),
                draws = ctx.draws,
                reason,
            );
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flip7_core::Observation;
    use flip7_core::model::hand::Hand;
    use flip7_core::model::modifiers::Modifiers;
    use flip7_core::model::revealed::RevealedCounts;

    fn observe(values: &[u8], modifiers: Modifiers) -> Observation {
        let hand = Hand::from_values(values).unwrap();
        let revealed = RevealedCounts::from_hand(&hand);
        Observation::new(hand, revealed, modifiers)
    }

    fn decide(policy: &mut HeuristicPolicy, observation: &Observation) -> Action {
        policy.choose(&PolicyContext {
            observation,
            draws: observation.hand.len(),
        })
    }

    #[test]
    fn threshold_stops_at_target() {
        let mut policy = HeuristicPolicy::threshold(20);
        assert_eq!(policy.name(), "threshold_20");
        assert_eq!(decide(&mut policy, &observe(&[4, 9], Modifiers::NONE)), Action::Hit);
        assert_eq!(decide(&mut policy, &observe(&[9, 11], Modifiers::NONE)), Action::Stay);
    }

    #[test]
    fn threshold_counts_times_two() {
        let mut policy = HeuristicPolicy::threshold(20);
        assert_eq!(
            decide(&mut policy, &observe(&[4, 9], Modifiers::new(false, true))),
            Action::Stay
        );
    }

    #[test]
    fn risk_cap_compares_bust_probability() {
        let mut policy = HeuristicPolicy::new("cap", HeuristicStyle::RiskCap(0.25));
        assert_eq!(decide(&mut policy, &observe(&[], Modifiers::NONE)), Action::Hit);
        assert_eq!(decide(&mut policy, &observe(&[12], Modifiers::NONE)), Action::Hit);
        assert_eq!(
            decide(&mut policy, &observe(&[9, 10, 11, 12], Modifiers::NONE)),
            Action::Stay
        );
        assert_eq!(
            decide(&mut policy, &observe(&[9, 10, 11, 12], Modifiers::new(true, false))),
            Action::Hit
        );
    }

    #[test]
    fn reckless_always_hits() {
        let mut policy = HeuristicPolicy::new("yolo", HeuristicStyle::Reckless);
        assert_eq!(
            decide(&mut policy, &observe(&[1, 2, 3, 4, 5, 6], Modifiers::NONE)),
            Action::Hit
        );
        assert_eq!(policy.style(), HeuristicStyle::Reckless);
    }
}
