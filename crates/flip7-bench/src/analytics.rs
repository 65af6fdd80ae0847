use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig};
use crate::simulation::{DealOutcome, DecisionSummary, RoundEnding};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline agent '{0}' not present in simulation results")]
    MissingBaseline(String),
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("baseline '{0}' missing for deal {1}")]
    MissingBaselineDeal(String, String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

pub struct AnalyticsCollector {
    baseline: String,
    agents: HashMap<String, AgentAccumulator>,
    comparisons: HashMap<String, ComparisonAccumulator>,
    agent_order: Vec<String>,
    latency_budget_ms: u64,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config.comparison.baseline.clone();

        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(
                agent.name.clone(),
                AgentAccumulator::new(agent.clone(), config.comparison.latency_budget_ms),
            );
            order.push(agent.name.clone());
        }

        Ok(Self {
            baseline,
            agents,
            comparisons: HashMap::new(),
            agent_order: order,
            latency_budget_ms: config.comparison.latency_budget_ms,
        })
    }

    pub fn record_deal(
        &mut self,
        deal_index: usize,
        outcome: &DealOutcome,
    ) -> Result<(), AnalyticsError> {
        let deal_id = format!("D{deal_index:05}");

        let best_points = outcome
            .results
            .iter()
            .map(|entry| entry.result.points)
            .max()
            .unwrap_or(0);

        let baseline_points = outcome
            .results
            .iter()
            .find(|entry| entry.agent_name == self.baseline)
            .map(|entry| f64::from(entry.result.points))
            .ok_or_else(|| {
                AnalyticsError::MissingBaselineDeal(self.baseline.clone(), deal_id.clone())
            })?;

        for entry in &outcome.results {
            let acc = self
                .agents
                .get_mut(&entry.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(entry.agent_name.clone()))?;

            acc.record_round(
                entry.result.points,
                entry.result.points == best_points,
                entry.result.ending,
                &entry.result.metrics,
            );
        }

        for entry in &outcome.results {
            if entry.agent_name == self.baseline {
                continue;
            }
            let diff = f64::from(entry.result.points) - baseline_points;
            self.comparisons
                .entry(entry.agent_name.clone())
                .or_insert_with(ComparisonAccumulator::new)
                .record(diff);
        }

        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        if !reports.iter().any(|report| report.name == self.baseline) {
            return Err(AnalyticsError::MissingBaseline(self.baseline));
        }

        let mut comparisons = Vec::new();
        for report in &reports {
            if report.name == self.baseline {
                comparisons.push(ComparisonReport {
                    agent: report.name.clone(),
                    p_value: 1.0,
                    sample_size: report.rounds,
                });
                continue;
            }
            let (p_value, sample_size) = self
                .comparisons
                .remove(&report.name)
                .map(ComparisonAccumulator::wilcoxon_signed_rank)
                .unwrap_or((1.0, 0));
            comparisons.push(ComparisonReport {
                agent: report.name.clone(),
                p_value,
                sample_size,
            });
        }

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
            comparisons,
            latency_budget_ms: self.latency_budget_ms,
        }
        .enrich())
    }
}

struct AgentAccumulator {
    config: AgentConfig,
    per_round_points: Vec<f64>,
    wins: u32,
    busts: u32,
    flip7s: u32,
    total_latency_ms: f64,
    total_decisions: u64,
    latency_budget_ms: u64,
}

impl AgentAccumulator {
    fn new(config: AgentConfig, latency_budget_ms: u64) -> Self {
        Self {
            config,
            per_round_points: Vec::new(),
            wins: 0,
            busts: 0,
            flip7s: 0,
            total_latency_ms: 0.0,
            total_decisions: 0,
            latency_budget_ms,
        }
    }

    fn record_round(
        &mut self,
        points: u32,
        is_best: bool,
        ending: RoundEnding,
        metrics: &DecisionSummary,
    ) {
        self.per_round_points.push(f64::from(points));
        if is_best {
            self.wins += 1;
        }
        match ending {
            RoundEnding::Busted => self.busts += 1,
            RoundEnding::Flip7 => self.flip7s += 1,
            RoundEnding::Stayed | RoundEnding::DeckExhausted => {}
        }
        self.total_latency_ms += metrics.total_ms;
        self.total_decisions += u64::from(metrics.decisions);
    }

    fn into_report(self) -> AgentReport {
        let rounds = self.per_round_points.len();
        let avg_points = if rounds == 0 {
            0.0
        } else {
            self.per_round_points.iter().sum::<f64>() / rounds as f64
        };

        let avg_latency = if self.total_decisions == 0 {
            0.0
        } else {
            self.total_latency_ms / self.total_decisions as f64
        };

        AgentReport {
            name: self.config.name.clone(),
            kind: self.config.kind.clone(),
            params: self.config.params.clone(),
            rounds,
            avg_points,
            ci95: confidence_interval(&self.per_round_points),
            wins: self.wins as usize,
            busts: self.busts as usize,
            flip7s: self.flip7s as usize,
            average_ms_per_decision: avg_latency,
            delta_vs_baseline: 0.0, // Filled in by `enrich`
            over_budget: avg_latency > self.latency_budget_ms as f64,
        }
    }
}

#[derive(Clone)]
struct ComparisonAccumulator {
    diffs: Vec<f64>,
}

impl ComparisonAccumulator {
    fn new() -> Self {
        Self { diffs: Vec::new() }
    }

    fn record(&mut self, diff: f64) {
        self.diffs.push(diff);
    }

    /// Two-sided p-value from the normal approximation, with tie correction.
    fn wilcoxon_signed_rank(self) -> (f64, usize) {
        let diffs: Vec<f64> = self
            .diffs
            .into_iter()
            .filter(|d| d.abs() > f64::EPSILON)
            .collect();
        let n = diffs.len();
        if n == 0 {
            return (1.0, 0);
        }

        let mut paired: Vec<(f64, f64)> =
            diffs.into_iter().map(|d| (d.abs(), d.signum())).collect();
        paired.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut ranks = Vec::with_capacity(n);
        let mut tie_sizes = Vec::new();
        let mut i = 0;
        while i < paired.len() {
            let mut j = i;
            while j + 1 < paired.len() && (paired[j + 1].0 - paired[i].0).abs() < 1e-12 {
                j += 1;
            }
            let rank = (i + j + 2) as f64 / 2.0;
            for entry in &paired[i..=j] {
                ranks.push((rank, entry.1));
            }
            if j > i {
                tie_sizes.push(j - i + 1);
            }
            i = j + 1;
        }

        let w_plus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign > 0.0)
            .map(|(rank, _)| *rank)
            .sum();
        let w_minus: f64 = ranks
            .iter()
            .filter(|(_, sign)| *sign < 0.0)
            .map(|(rank, _)| *rank)
            .sum();

        let w = w_plus.min(w_minus);
        let n_f = n as f64;
        let mean_w = n_f * (n_f + 1.0) / 4.0;

        let tie_adjustment: f64 = tie_sizes
            .into_iter()
            .map(|count| {
                let c = count as f64;
                (c.powi(3) - c) / 48.0
            })
            .sum();
        let variance_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0 - tie_adjustment;
        if variance_w <= 0.0 {
            return (1.0, n);
        }

        let z = ((w - mean_w).abs() - 0.5).max(0.0) / variance_w.sqrt();
        let Ok(normal) = Normal::new(0.0, 1.0) else {
            return (1.0, n);
        };
        let p = 2.0 * (1.0 - normal.cdf(z));
        (p.clamp(0.0, 1.0), n)
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub agents: Vec<AgentReport>,
    pub comparisons: Vec<ComparisonReport>,
    pub latency_budget_ms: u64,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_avg = self
            .agents
            .iter()
            .find(|agent| agent.name == self.baseline)
            .map(|agent| agent.avg_points)
            .unwrap_or(0.0);

        for agent in &mut self.agents {
            agent.delta_vs_baseline = agent.avg_points - baseline_avg;
        }

        self
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Simulation Summary\n\n");
        rows.push_str(&format!("Baseline: `{}`\n\n", self.baseline));
        rows.push_str(&format!(
            "Latency budget: {} ms average per decision\n\n",
            self.latency_budget_ms
        ));
        rows.push_str("| Agent | Kind | Rounds | Avg points | Δ vs baseline | 95% CI | Bust % | Flip 7 % | Win % | Avg ms/decision | Over Budget | p-value |\n");
        rows.push_str("|-------|------|--------|------------|----------------|--------|--------|----------|-------|------------------|-------------|---------|\n");

        for agent in &self.agents {
            let comparison = self
                .comparisons
                .iter()
                .find(|c| c.agent == agent.name)
                .map(|c| c.p_value)
                .unwrap_or(1.0);

            rows.push_str(&format!(
                "| {name} | {kind:?} | {rounds} | {avg:.3} | {delta:+.3} | [{ci_low:.3}, {ci_high:.3}] | {bust:.1}% | {flip7:.1}% | {win:.1}% | {latency:.2} | {over_budget} | {pval:.3} |\n",
                name = agent.name,
                kind = agent.kind,
                rounds = agent.rounds,
                avg = agent.avg_points,
                delta = agent.delta_vs_baseline,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                bust = rate(agent.busts, agent.rounds) * 100.0,
                flip7 = rate(agent.flip7s, agent.rounds) * 100.0,
                win = rate(agent.wins, agent.rounds) * 100.0,
                latency = agent.average_ms_per_decision,
                over_budget = if agent.over_budget { "Yes" } else { "No" },
                pval = comparison,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("delta_points.png");
        let baseline = self.baseline.clone();
        let agents_snapshot = self.agents.clone();

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let mut agents = agents_snapshot;
            agents.sort_by(|a, b| a.delta_vs_baseline.total_cmp(&b.delta_vs_baseline));

            let y_range_min = agents
                .iter()
                .map(|a| a.delta_vs_baseline)
                .fold(0.0f64, |acc, v| acc.min(v));
            let y_range_max = agents
                .iter()
                .map(|a| a.delta_vs_baseline)
                .fold(0.0f64, |acc, v| acc.max(v));
            let margin = ((y_range_max - y_range_min).abs() * 0.1).max(0.2);

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption(
                    "Points per round vs baseline (higher is better)",
                    ("sans-serif", 22),
                )
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 60)
                .build_cartesian_2d(
                    0..agents.len(),
                    (y_range_min - margin)..(y_range_max + margin),
                )
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Δ points vs baseline")
                .x_desc("Agent")
                .x_label_formatter(&|idx| {
                    agents
                        .get(*idx)
                        .map(|agent| agent.name.clone())
                        .unwrap_or_default()
                })
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(agents.iter().enumerate().map(|(idx, agent)| {
                    let color = if agent.name == baseline {
                        &BLUE
                    } else if agent.delta_vs_baseline >= 0.0 {
                        &GREEN
                    } else {
                        &RED
                    };
                    Rectangle::new(
                        [(idx, 0.0), (idx + 1, agent.delta_vs_baseline)],
                        color.filled(),
                    )
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub params: serde_yaml::Value,
    pub rounds: usize,
    pub avg_points: f64,
    pub ci95: (f64, f64),
    pub wins: usize,
    pub busts: usize,
    pub flip7s: usize,
    pub average_ms_per_decision: f64,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
    #[serde(skip)]
    pub over_budget: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub agent: String,
    pub p_value: f64,
    pub sample_size: usize,
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_interval_brackets_the_mean() {
        let (low, high) = confidence_interval(&[10.0, 20.0, 30.0]);
        assert!(low < 20.0 && 20.0 < high);
        assert_eq!(confidence_interval(&[7.0]), (7.0, 7.0));
        assert_eq!(confidence_interval(&[]), (0.0, 0.0));
    }

    #[test]
    fn wilcoxon_ignores_zero_differences() {
        let mut comp = ComparisonAccumulator::new();
        comp.record(0.0);
        comp.record(0.0);
        assert_eq!(comp.wilcoxon_signed_rank(), (1.0, 0));
    }

    #[test]
    fn wilcoxon_flags_consistent_improvement() {
        let mut comp = ComparisonAccumulator::new();
        for diff in 1..=30 {
            comp.record(f64::from(diff));
        }
        let (p, n) = comp.wilcoxon_signed_rank();
        assert_eq!(n, 30);
        assert!(p < 0.001, "p = {p}");
    }

    #[test]
    fn wilcoxon_symmetric_differences_are_not_significant() {
        let mut comp = ComparisonAccumulator::new();
        for diff in 1..=20 {
            comp.record(f64::from(diff));
            comp.record(-f64::from(diff));
        }
        let (p, n) = comp.wilcoxon_signed_rank();
        assert_eq!(n, 40);
        assert!(p > 0.9, "p = {p}");
    }
}
