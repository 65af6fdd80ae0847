use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use flip7_core::model::deck::TOTAL_NUMBER_CARDS;

/// A simulation run: which decks to deal, who plays them, and where results go.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub deals: DealConfig,
    pub agents: Vec<AgentConfig>,
    pub comparison: ComparisonConfig,
    /// Directory for every artifact of the run; `{run_id}` is substituted.
    pub output_dir: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            source,
            path: path.clone(),
        })?;
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                source,
                path: path.clone(),
            })?;
        cfg.validate()
            .map_err(|source| ConfigError::Invalid { path, source })?;
        Ok(cfg)
    }

    /// Checks cross-field constraints; also replaces absent agent params
    /// with an empty mapping.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        check_identifier("run_id", &self.run_id)?;
        if self.output_dir.trim().is_empty() {
            return Err(ValidationError::EmptyOutputDir);
        }
        if self.deals.rounds == 0 {
            return Err(ValidationError::NoRounds);
        }
        let deck = self.deals.deck_size();
        if self.deals.opponent_reveals >= deck {
            return Err(ValidationError::RevealsExceedDeck {
                requested: self.deals.opponent_reveals,
                deck,
            });
        }
        if self.agents.is_empty() {
            return Err(ValidationError::NoAgents);
        }

        let mut seen = HashSet::new();
        for agent in &mut self.agents {
            check_identifier("agent name", &agent.name)?;
            if !seen.insert(agent.name.clone()) {
                return Err(ValidationError::DuplicateAgent(agent.name.clone()));
            }
            if agent.params.is_null() {
                agent.params = serde_yaml::Value::Mapping(Default::default());
            }
        }

        if !seen.contains(&self.comparison.baseline) {
            return Err(ValidationError::UnknownBaseline(
                self.comparison.baseline.clone(),
            ));
        }
        if self.comparison.latency_budget_ms == 0 {
            return Err(ValidationError::ZeroLatencyBudget);
        }
        Ok(())
    }

    /// Concrete artifact paths under the substituted output directory.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs::in_dir(self.output_dir.replace("{run_id}", &self.run_id))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DealConfig {
    /// Seed for the per-deal seed stream; `0` when absent.
    pub seed: Option<u64>,
    pub rounds: usize,
    /// Cards turned over for other players before the agent's turn.
    #[serde(default)]
    pub opponent_reveals: usize,
    #[serde(default = "DealConfig::default_second_chance_cards")]
    pub second_chance_cards: usize,
    #[serde(default = "DealConfig::default_times_two_cards")]
    pub times_two_cards: usize,
}

impl DealConfig {
    fn default_second_chance_cards() -> usize {
        3
    }

    fn default_times_two_cards() -> usize {
        1
    }

    pub fn deck_size(&self) -> usize {
        TOTAL_NUMBER_CARDS as usize + self.second_chance_cards + self.times_two_cards
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub kind: AgentKind,
    #[serde(default)]
    pub params: serde_yaml::Value,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Advisor,
    Heuristic,
}

/// Paired comparison against one baseline agent.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ComparisonConfig {
    pub baseline: String,
    /// Average decision latency above which an agent is flagged.
    #[serde(default = "ComparisonConfig::default_latency_budget_ms")]
    pub latency_budget_ms: u64,
}

impl ComparisonConfig {
    fn default_latency_budget_ms() -> u64 {
        5
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Write decision and round events to `telemetry.jsonl`.
    #[serde(default)]
    pub structured: bool,
    #[serde(default)]
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

fn check_identifier(field: &'static str, value: &str) -> Result<(), ValidationError> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(ValidationError::BadIdentifier {
            field,
            value: value.to_string(),
        })
    }
}

/// Where a run writes its artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub dir: PathBuf,
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub plots_dir: PathBuf,
    pub telemetry: PathBuf,
}

impl ResolvedOutputs {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            jsonl: dir.join("rounds.jsonl"),
            summary_md: dir.join("summary.md"),
            plots_dir: dir.join("plots"),
            telemetry: dir.join("telemetry.jsonl"),
            dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} '{value}' may only contain letters, digits, '.', '_' or '-'")]
    BadIdentifier { field: &'static str, value: String },
    #[error("output_dir must not be empty")]
    EmptyOutputDir,
    #[error("deals.rounds must be greater than zero")]
    NoRounds,
    #[error("deals.opponent_reveals: cannot reveal {requested} cards from a deck of {deck}")]
    RevealsExceedDeck { requested: usize, deck: usize },
    #[error("at least one agent must be configured")]
    NoAgents,
    #[error("agent '{0}' is defined more than once")]
    DuplicateAgent(String),
    #[error("comparison.baseline '{0}' is not one of the configured agents")]
    UnknownBaseline(String),
    #[error("comparison.latency_budget_ms must be greater than zero")]
    ZeroLatencyBudget,
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "stage0_smoke"
deals:
  seed: 123
  rounds: 16
agents:
  - name: "advisor"
    kind: "advisor"
    params:
      model: "exact"
  - name: "threshold_20"
    kind: "heuristic"
comparison:
  baseline: "threshold_20"
output_dir: "bench/out/{run_id}"
logging:
  structured: true
  level: "debug"
"#;

    fn parse(yaml: &str) -> BenchmarkConfig {
        serde_yaml::from_str(yaml).expect("parse yaml")
    }

    #[test]
    fn fills_deck_and_comparison_defaults() {
        let mut cfg = parse(BASIC_YAML);
        cfg.validate().expect("validate");

        assert_eq!(cfg.deals.opponent_reveals, 0);
        assert_eq!(cfg.deals.second_chance_cards, 3);
        assert_eq!(cfg.deals.times_two_cards, 1);
        assert_eq!(cfg.deals.deck_size(), 83);
        assert_eq!(cfg.comparison.latency_budget_ms, 5);
        assert!(cfg.logging.structured);
        assert_eq!(cfg.logging.level, LogLevel::Debug);
        assert!(cfg.agents[1].params.is_mapping());
    }

    #[test]
    fn artifacts_share_the_run_directory() {
        let cfg = parse(BASIC_YAML);
        let outputs = cfg.resolved_outputs();
        let dir = PathBuf::from("bench/out/stage0_smoke");
        assert_eq!(outputs.jsonl, dir.join("rounds.jsonl"));
        assert_eq!(outputs.summary_md, dir.join("summary.md"));
        assert_eq!(outputs.plots_dir, dir.join("plots"));
        assert_eq!(outputs.telemetry, dir.join("telemetry.jsonl"));
        assert_eq!(outputs.dir, dir);
    }

    #[test]
    fn logging_defaults_to_quiet_info() {
        let yaml = BASIC_YAML.replace("logging:\n  structured: true\n  level: \"debug\"\n", "");
        let cfg = parse(&yaml);
        assert_eq!(cfg.logging, LoggingConfig::default());
        assert_eq!(cfg.logging.level, LogLevel::Info);
        assert!(!cfg.logging.structured);
    }

    #[test]
    fn unknown_log_level_fails_to_parse() {
        let yaml = BASIC_YAML.replace("level: \"debug\"", "level: \"chatty\"");
        assert!(serde_yaml::from_str::<BenchmarkConfig>(&yaml).is_err());
    }

    #[test]
    fn baseline_must_name_an_agent() {
        let mut cfg = parse(&BASIC_YAML.replace("baseline: \"threshold_20\"", "baseline: \"ghost\""));
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::UnknownBaseline("ghost".into()))
        );
    }

    #[test]
    fn rejects_duplicate_agents() {
        let mut cfg = parse(&BASIC_YAML.replace("name: \"advisor\"", "name: \"threshold_20\""));
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::DuplicateAgent("threshold_20".into()))
        );
    }

    #[test]
    fn rejects_run_id_with_spaces() {
        let mut cfg = parse(&BASIC_YAML.replace("stage0_smoke", "stage 0 smoke"));
        assert!(matches!(
            cfg.validate(),
            Err(ValidationError::BadIdentifier { field: "run_id", .. })
        ));
    }

    #[test]
    fn reveals_must_leave_cards_to_draw() {
        let mut cfg = parse(&BASIC_YAML.replace("rounds: 16", "rounds: 16\n  opponent_reveals: 83"));
        assert_eq!(
            cfg.validate(),
            Err(ValidationError::RevealsExceedDeck {
                requested: 83,
                deck: 83
            })
        );

        let mut cfg = parse(&BASIC_YAML.replace("rounds: 16", "rounds: 16\n  opponent_reveals: 82"));
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_rounds() {
        let mut cfg = parse(&BASIC_YAML.replace("rounds: 16", "rounds: 0"));
        assert_eq!(cfg.validate(), Err(ValidationError::NoRounds));
    }
}
