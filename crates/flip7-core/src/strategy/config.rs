use crate::model::deck::FLIP7_BONUS;
use crate::odds::OddsConfig;
use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which probability formulas feed the decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilityModel {
    /// Closed-form single-draw estimates.
    #[default]
    Approximate,
    /// Exact double-duplicate and multi-draw bonus probabilities.
    Exact,
}

impl ProbabilityModel {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProbabilityModel::Approximate => "approximate",
            ProbabilityModel::Exact => "exact",
        }
    }
}

impl fmt::Display for ProbabilityModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown probability model '{0}' (expected 'approximate' or 'exact')")]
pub struct UnknownModel(pub String);

impl FromStr for ProbabilityModel {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approximate" | "approx" | "default" => Ok(ProbabilityModel::Approximate),
            "exact" => Ok(ProbabilityModel::Exact),
            other => Err(UnknownModel(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub model: ProbabilityModel,
    pub odds: OddsConfig,
    /// Points for seven distinct faces.
    pub bonus: u32,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            model: ProbabilityModel::Approximate,
            odds: OddsConfig::default(),
            bonus: FLIP7_BONUS,
        }
    }
}

impl StrategyConfig {
    pub fn exact() -> Self {
        Self {
            model: ProbabilityModel::Exact,
            ..Self::default()
        }
    }
}
