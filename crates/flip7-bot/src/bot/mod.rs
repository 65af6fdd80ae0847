mod tracker;

pub use tracker::{DrawOutcome, RevealTracker};

use crate::policy::Action;
use flip7_core::strategy::{ProbabilityModel, StrategyConfig};

/// Advisor tunables, optionally overridden from the environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdvisorSettings {
    pub strategy: StrategyConfig,
    /// What to do when hitting and staying are worth exactly the same.
    pub toss_up: Action,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            strategy: StrategyConfig::default(),
            toss_up: Action::Stay,
        }
    }
}

impl AdvisorSettings {
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    /// Unparseable or out-of-range values keep their defaults.
    pub fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(model) = read("FLIP7_MODEL").and_then(|raw| raw.parse::<ProbabilityModel>().ok())
        {
            settings.strategy.model = model;
        }

        if let Some(damping) = read("FLIP7_SECOND_CHANCE_DAMPING")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite() && (0.0..=1.0).contains(value))
        {
            settings.strategy.odds.second_chance_damping = damping;
        }

        if let Some(decay) = read("FLIP7_BONUS_DECAY")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite() && (0.0..=1.0).contains(value))
        {
            settings.strategy.odds.flip7_decay = decay;
        }

        if let Some(horizon) = read("FLIP7_BONUS_HORIZON")
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|value| *value <= 7)
        {
            settings.strategy.odds.flip7_horizon = horizon;
        }

        if let Some(action) = read("FLIP7_TOSS_UP").and_then(|raw| Action::parse(&raw)) {
            settings.toss_up = action;
        }

        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn reader(pairs: &[(&str, &str)]) -> impl FnMut(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = AdvisorSettings::from_reader(|_| None);
        assert_eq!(settings, AdvisorSettings::default());
        assert_eq!(settings.toss_up, Action::Stay);
    }

    #[test]
    fn reads_every_override() {
        let settings = AdvisorSettings::from_reader(reader(&[
            ("FLIP7_MODEL", "exact"),
            ("FLIP7_SECOND_CHANCE_DAMPING", "0.5"),
            ("FLIP7_BONUS_DECAY", " 0.6 "),
            ("FLIP7_BONUS_HORIZON", "4"),
            ("FLIP7_TOSS_UP", "hit"),
        ]));
        assert_eq!(settings.strategy.model, ProbabilityModel::Exact);
        assert_eq!(settings.strategy.odds.second_chance_damping, 0.5);
        assert_eq!(settings.strategy.odds.flip7_decay, 0.6);
        assert_eq!(settings.strategy.odds.flip7_horizon, 4);
        assert_eq!(settings.toss_up, Action::Hit);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let settings = AdvisorSettings::from_reader(reader(&[
            ("FLIP7_MODEL", "oracle"),
            ("FLIP7_SECOND_CHANCE_DAMPING", "1.5"),
            ("FLIP7_BONUS_DECAY", "NaN"),
            ("FLIP7_BONUS_HORIZON", "12"),
            ("FLIP7_TOSS_UP", "maybe"),
        ]));
        assert_eq!(settings, AdvisorSettings::default());
    }
}
