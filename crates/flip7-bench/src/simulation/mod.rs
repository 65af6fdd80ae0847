mod round;

pub use round::{DecisionSummary, RoundEnding, RoundResult, play_round};

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use flip7_bot::bot::{AdvisorSettings, RevealTracker};
use flip7_bot::policy::{Action, AdvisorPolicy, HeuristicPolicy, HeuristicStyle, Policy};
use flip7_core::model::deck::Deck;
use flip7_core::strategy::ProbabilityModel;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig, ResolvedOutputs, ValidationError};
use crate::logging::ROUND_TARGET;
use crate::telemetry::{
    TelemetryError, TelemetryOutputs, append_highlights_to_markdown, write_summary_outputs,
};

const DEFAULT_THRESHOLD: u32 = 20;
const DEFAULT_RISK_CAP: f64 = 0.2;

/// Plays every configured agent through the same shuffled decks.
pub struct SimulationRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub rounds_played: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    pub telemetry_path: Option<PathBuf>,
    pub telemetry_outputs: Option<TelemetryOutputs>,
}

impl SimulationRunner {
    /// Build a runner, validating the configuration first.
    pub fn new(mut config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        config.validate()?;
        let defaults = AdvisorSettings::from_env();
        let agents = AgentBlueprint::from_configs(&config.agents, defaults)?;

        Ok(Self {
            logging_enabled: config.logging.structured,
            config,
            outputs,
            agents,
        })
    }

    /// Execute the simulation, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        fs::create_dir_all(&self.outputs.plots_dir)?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.deals.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config)?;

        for deal_index in 0..self.config.deals.rounds {
            let base_seed = rng.next_u64();
            let outcome = self.play_deal(deal_index, base_seed)?;
            analytics.record_deal(deal_index, &outcome)?;
            rows_written +=
                write_deal_rows(&mut writer, &self.config, deal_index, base_seed, &outcome)?;
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;
        let plot_path = match summary.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("WARN: {}", err);
                None
            }
        };

        let telemetry_path = self.logging_enabled.then(|| self.outputs.telemetry.clone());
        let telemetry_outputs = match telemetry_path.as_ref() {
            Some(path) => write_summary_outputs(path, &self.outputs.dir)?,
            None => None,
        };

        if let Some(outputs) = telemetry_outputs.as_ref() {
            append_highlights_to_markdown(&self.outputs.summary_md, outputs)?;
        }

        Ok(RunSummary {
            rounds_played: self.config.deals.rounds,
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
            telemetry_path,
            telemetry_outputs,
        })
    }

    fn play_deal(&self, deal_index: usize, base_seed: u64) -> Result<DealOutcome, RunnerError> {
        let deals = &self.config.deals;
        let mut deck = Deck::with_modifiers(deals.second_chance_cards, deals.times_two_cards);
        deck.shuffle_in_place(&mut StdRng::seed_from_u64(base_seed));

        let mut seen = RevealTracker::new();
        for _ in 0..deals.opponent_reveals {
            let card = deck.draw().ok_or(RunnerError::RevealLimit {
                requested: deals.opponent_reveals,
                deck: deals.deck_size(),
            })?;
            seen.note_revealed(card);
        }

        let mut results = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let mut policy = agent.spawn_policy();
            let mut deck = deck.clone();
            let mut tracker = seen.clone();
            let result = play_round(policy.as_mut(), &mut deck, &mut tracker);

            if self.logging_enabled && tracing::enabled!(Level::INFO) {
                event!(
                    target: ROUND_TARGET,
                    Level::INFO,
                    run_id = %self.config.run_id,
                    deal_index = deal_index as u32,
                    agent = %agent.name,
                    ending = result.ending.as_str(),
                    points = result.points,
                    draws = result.draws as u32,
                    absorbed = result.absorbed as u32,
                    elapsed_ms = result.metrics.total_ms,
                );
            }

            results.push(AgentRoundResult {
                agent_name: agent.name.clone(),
                result,
            });
        }

        Ok(DealOutcome {
            revealed_before: deals.opponent_reveals,
            results,
        })
    }
}

fn write_deal_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    deal_index: usize,
    base_seed: u64,
    outcome: &DealOutcome,
) -> Result<usize, RunnerError> {
    let deal_id = format!("D{deal_index:05}");

    let mut rows_written = 0usize;
    for entry in &outcome.results {
        let result = &entry.result;
        let row = DealLogRow {
            run_id: config.run_id.clone(),
            deal_id: deal_id.clone(),
            deal_index,
            deal_seed: base_seed,
            agent: entry.agent_name.clone(),
            points: result.points,
            ending: result.ending,
            draws: result.draws,
            absorbed: result.absorbed,
            revealed_before: outcome.revealed_before,
            speed_ms_decision: result.metrics.avg_ms_per_decision,
            decisions: result.metrics.decisions,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

/// Every agent's result on one shuffled deck.
pub struct DealOutcome {
    pub revealed_before: usize,
    pub results: Vec<AgentRoundResult>,
}

pub struct AgentRoundResult {
    pub agent_name: String,
    pub result: RoundResult,
}

#[derive(Serialize)]
struct DealLogRow {
    run_id: String,
    deal_id: String,
    deal_index: usize,
    deal_seed: u64,
    agent: String,
    points: u32,
    ending: RoundEnding,
    draws: usize,
    absorbed: usize,
    revealed_before: usize,
    speed_ms_decision: f64,
    decisions: u32,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("cannot reveal {requested} cards from a deck of {deck}")]
    RevealLimit { requested: usize, deck: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("telemetry summarisation failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid advisor parameter for agent '{name}': {message}")]
    InvalidAdvisorParam { name: String, message: String },
    #[error("invalid heuristic parameter for agent '{name}': {message}")]
    InvalidHeuristicParam { name: String, message: String },
}

struct AgentBlueprint {
    name: String,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    Advisor(AdvisorSettings),
    Heuristic(HeuristicStyle),
}

impl AgentBlueprint {
    fn from_configs(
        configs: &[AgentConfig],
        defaults: AdvisorSettings,
    ) -> Result<Vec<Self>, AgentError> {
        configs
            .iter()
            .map(|config| Self::from_config(config, defaults))
            .collect()
    }

    fn from_config(config: &AgentConfig, defaults: AdvisorSettings) -> Result<Self, AgentError> {
        let implementation = match config.kind {
            AgentKind::Advisor => AgentImplementation::Advisor(advisor_settings_from_params(
                &config.name,
                &config.params,
                defaults,
            )?),
            AgentKind::Heuristic => AgentImplementation::Heuristic(heuristic_style_from_params(
                &config.name,
                &config.params,
            )?),
        };

        Ok(Self {
            name: config.name.clone(),
            implementation,
        })
    }

    fn spawn_policy(&self) -> Box<dyn Policy> {
        match &self.implementation {
            AgentImplementation::Advisor(settings) => {
                Box::new(AdvisorPolicy::new(self.name.clone(), *settings))
            }
            AgentImplementation::Heuristic(style) => {
                Box::new(HeuristicPolicy::new(self.name.clone(), *style))
            }
        }
    }
}

fn params_mapping<'a>(
    params: &'a serde_yaml::Value,
    invalid: impl FnOnce(String) -> AgentError,
) -> Result<Option<&'a serde_yaml::Mapping>, AgentError> {
    if params.is_null() {
        return Ok(None);
    }
    params
        .as_mapping()
        .map(Some)
        .ok_or_else(|| invalid("expected mapping for params".to_string()))
}

fn advisor_settings_from_params(
    name: &str,
    params: &serde_yaml::Value,
    defaults: AdvisorSettings,
) -> Result<AdvisorSettings, AgentError> {
    let invalid = |message: String| AgentError::InvalidAdvisorParam {
        name: name.to_string(),
        message,
    };

    let mut settings = defaults;
    let Some(mapping) = params_mapping(params, invalid)? else {
        return Ok(settings);
    };

    for (key, value) in mapping {
        match key.as_str() {
            Some("model") => {
                let text = value
                    .as_str()
                    .ok_or_else(|| invalid("model must be a string".to_string()))?;
                settings.strategy.model = text
                    .parse::<ProbabilityModel>()
                    .map_err(|err| invalid(err.to_string()))?;
            }
            Some("second_chance_damping") => {
                settings.strategy.odds.second_chance_damping =
                    unit_interval(value, "second_chance_damping").map_err(invalid)?;
            }
            Some("bonus_decay") => {
                settings.strategy.odds.flip7_decay =
                    unit_interval(value, "bonus_decay").map_err(invalid)?;
            }
            Some("bonus_horizon") => {
                let horizon = value
                    .as_u64()
                    .filter(|h| *h <= 7)
                    .ok_or_else(|| invalid("bonus_horizon must be an integer in 0..=7".into()))?;
                settings.strategy.odds.flip7_horizon = horizon as usize;
            }
            Some("bonus") => {
                let bonus = value
                    .as_u64()
                    .and_then(|b| u32::try_from(b).ok())
                    .ok_or_else(|| invalid("bonus must be a non-negative integer".into()))?;
                settings.strategy.bonus = bonus;
            }
            Some("toss_up") => {
                settings.toss_up = value
                    .as_str()
                    .and_then(Action::parse)
                    .ok_or_else(|| invalid("toss_up must be 'hit' or 'stay'".into()))?;
            }
            Some(other) => return Err(invalid(format!("unknown parameter '{other}'"))),
            None => return Err(invalid("parameter keys must be strings".into())),
        }
    }

    Ok(settings)
}

fn unit_interval(value: &serde_yaml::Value, field: &str) -> Result<f64, String> {
    value
        .as_f64()
        .filter(|v| v.is_finite() && (0.0..=1.0).contains(v))
        .ok_or_else(|| format!("{field} must be a number in [0, 1]"))
}

fn heuristic_style_from_params(
    name: &str,
    params: &serde_yaml::Value,
) -> Result<HeuristicStyle, AgentError> {
    let invalid = |message: String| AgentError::InvalidHeuristicParam {
        name: name.to_string(),
        message,
    };

    let Some(mapping) = params_mapping(params, invalid)? else {
        return Ok(HeuristicStyle::Threshold(DEFAULT_THRESHOLD));
    };

    let lookup = |field: &str| {
        mapping
            .iter()
            .find_map(|(key, value)| (key.as_str() == Some(field)).then_some(value))
    };

    let style = match lookup("style") {
        None => "threshold",
        Some(value) => value
            .as_str()
            .ok_or_else(|| invalid("style must be a string".to_string()))?,
    };

    match style.to_ascii_lowercase().as_str() {
        "threshold" => {
            let target = match lookup("target") {
                None => DEFAULT_THRESHOLD,
                Some(value) => value
                    .as_u64()
                    .and_then(|t| u32::try_from(t).ok())
                    .ok_or_else(|| invalid("target must be a non-negative integer".into()))?,
            };
            Ok(HeuristicStyle::Threshold(target))
        }
        "risk_cap" | "risk" => {
            let cap = match lookup("max_bust") {
                None => DEFAULT_RISK_CAP,
                Some(value) => unit_interval(value, "max_bust").map_err(invalid)?,
            };
            Ok(HeuristicStyle::RiskCap(cap))
        }
        "reckless" => Ok(HeuristicStyle::Reckless),
        other => Err(invalid(format!("unknown style '{other}'"))),
    }
}
