use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::logging::{DECISION_TARGET, ROUND_TARGET};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize)]
pub struct TelemetrySummary {
    pub decisions: DecisionTelemetrySummary,
    pub rounds: RoundTelemetrySummary,
}

/// Aggregated `flip7_bot::decision` events.
#[derive(Debug, Default, Serialize)]
pub struct DecisionTelemetrySummary {
    pub count: usize,
    pub avg_bust_probability: Option<f64>,
    pub avg_confidence: Option<f64>,
    pub action_counts: BTreeMap<String, usize>,
    pub policy_counts: BTreeMap<String, usize>,
    pub recommendation_counts: BTreeMap<String, usize>,
}

/// Aggregated `flip7_bench::round` events.
#[derive(Debug, Default, Serialize)]
pub struct RoundTelemetrySummary {
    pub count: usize,
    pub ending_counts: BTreeMap<String, usize>,
}

#[derive(Debug)]
struct Average {
    sum: f64,
    count: usize,
}

impl Average {
    fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    if !path.exists() {
        return Ok(TelemetrySummary::default());
    }

    let file = File::open(path).map_err(|source| TelemetryError::Io {
        context: "opening telemetry log",
        source,
    })?;
    let reader = BufReader::new(file);

    let mut decisions = DecisionTelemetrySummary::default();
    let mut bust_avg = Average::new();
    let mut confidence_avg = Average::new();
    let mut rounds = RoundTelemetrySummary::default();

    for line in reader.lines() {
        let line = line.map_err(|source| TelemetryError::Io {
            context: "reading telemetry line",
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let payload: Value = serde_json::from_str(&line)?;
        let target = payload
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let fields = payload
            .get("fields")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        match target {
            DECISION_TARGET => {
                decisions.count += 1;

                if let Some(p) = fields.get("bust_probability").and_then(Value::as_f64) {
                    bust_avg.add(p);
                }
                if let Some(c) = fields.get("confidence").and_then(Value::as_f64) {
                    confidence_avg.add(c);
                }

                bump(&mut decisions.action_counts, label(&fields, "action"));
                bump(&mut decisions.policy_counts, label(&fields, "policy"));
                if fields.contains_key("recommendation") {
                    bump(
                        &mut decisions.recommendation_counts,
                        label(&fields, "recommendation"),
                    );
                }
            }
            ROUND_TARGET => {
                rounds.count += 1;
                bump(&mut rounds.ending_counts, label(&fields, "ending"));
            }
            _ => {}
        }
    }

    decisions.avg_bust_probability = bust_avg.mean();
    decisions.avg_confidence = confidence_avg.mean();

    Ok(TelemetrySummary { decisions, rounds })
}

fn label<'a>(fields: &'a Map<String, Value>, key: &str) -> &'a str {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("<unset>")
}

fn bump(counts: &mut BTreeMap<String, usize>, key: &str) {
    *counts.entry(key.to_string()).or_insert(0) += 1;
}

pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }

    let summary = summarise_telemetry(telemetry_path)?;
    let json_path = output_dir.join("telemetry_summary.json");
    let md_path = output_dir.join("telemetry_summary.md");

    std::fs::write(&json_path, serde_json::to_vec_pretty(&summary)?).map_err(|source| {
        TelemetryError::Io {
            context: "writing telemetry summary json",
            source,
        }
    })?;

    let markdown = render_markdown(&summary, telemetry_path);
    std::fs::write(&md_path, markdown).map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary markdown",
        source,
    })?;

    Ok(Some(TelemetryOutputs {
        summary,
        json_path,
        markdown_path: md_path,
    }))
}

pub fn append_highlights_to_markdown(
    summary_path: &Path,
    outputs: &TelemetryOutputs,
) -> Result<(), TelemetryError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(summary_path)
        .map_err(|source| TelemetryError::Io {
            context: "opening summary markdown for telemetry append",
            source,
        })?;

    let decisions = &outputs.summary.decisions;
    let mut section = String::new();
    section.push_str("\n## Telemetry Highlights\n");
    section.push_str(&format!("- Decision events captured: {}\n", decisions.count));
    if let Some(value) = decisions.avg_bust_probability {
        section.push_str(&format!("- Avg bust probability at decision: {:.3}\n", value));
    }
    if let Some(value) = decisions.avg_confidence {
        section.push_str(&format!("- Avg advisor confidence: {:.3}\n", value));
    }
    push_counts(&mut section, "- Actions:\n", "  ", &decisions.action_counts);
    push_counts(
        &mut section,
        "- Recommendations:\n",
        "  ",
        &decisions.recommendation_counts,
    );

    section.push_str("\n### Round Endings\n");
    if outputs.summary.rounds.ending_counts.is_empty() {
        section.push_str("- <none>\n");
    } else {
        push_counts(&mut section, "", "", &outputs.summary.rounds.ending_counts);
    }

    write!(file, "{section}").map_err(|source| TelemetryError::Io {
        context: "writing telemetry highlights",
        source,
    })?;

    Ok(())
}

fn push_counts(out: &mut String, heading: &str, indent: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    out.push_str(heading);
    for (label, count) in counts {
        out.push_str(&format!("{indent}- {label}: {count}\n"));
    }
}

fn render_markdown(summary: &TelemetrySummary, telemetry_path: &Path) -> String {
    let mut output = String::new();
    output.push_str("# Telemetry Summary\n\n");
    output.push_str(&format!("- Source: `{}`\n", telemetry_path.display()));
    output.push('\n');

    let decisions = &summary.decisions;
    output.push_str("## Decisions\n");
    output.push_str(&format!("- Events: {}\n", decisions.count));
    if let Some(value) = decisions.avg_bust_probability {
        output.push_str(&format!("- Avg bust probability: {:.3}\n", value));
    }
    if let Some(value) = decisions.avg_confidence {
        output.push_str(&format!("- Avg confidence: {:.3}\n", value));
    }
    push_counts(&mut output, "- Actions:\n", "  ", &decisions.action_counts);
    push_counts(&mut output, "- Policies:\n", "  ", &decisions.policy_counts);
    push_counts(
        &mut output,
        "- Recommendations:\n",
        "  ",
        &decisions.recommendation_counts,
    );
    output.push('\n');

    output.push_str("## Rounds\n");
    output.push_str(&format!("- Events: {}\n", summary.rounds.count));
    push_counts(&mut output, "- Endings:\n", "  ", &summary.rounds.ending_counts);
    output
}

#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}
