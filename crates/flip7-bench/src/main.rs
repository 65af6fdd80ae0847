use std::path::PathBuf;

use clap::Parser;

use flip7_bench::config::{BenchmarkConfig, ResolvedOutputs};
use flip7_bench::logging::init_logging;
use flip7_bench::simulation::SimulationRunner;

/// Head-to-head simulator for Flip 7 HIT/STAY policies.
#[derive(Debug, Parser)]
#[command(
    name = "flip7-bench",
    author,
    version,
    about = "Deterministic Flip 7 round simulator"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of rounds to deal.
    #[arg(long, value_name = "ROUNDS")]
    rounds: Option<usize>,

    /// Override the RNG seed for deck shuffles.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no rounds are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(rounds) = cli.rounds {
        config.deals.rounds = rounds;
    }

    if let Some(seed) = cli.seed {
        config.deals.seed = Some(seed);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let rounds = config.deals.rounds;

    println!(
        "Loaded configuration '{run_id}' with {agent_count} agent{} ({rounds} rounds)",
        if agent_count == 1 { "" } else { "s" }
    );

    let runner = SimulationRunner::new(config.clone(), outputs.clone())?;

    if cli.validate_only {
        println!("Validation-only mode: simulation skipped.");
        return Ok(());
    }

    let _logging_guard = init_logging(&config.logging, &outputs)?;

    let summary = runner.run()?;
    println!(
        "Simulation complete for '{run_id}': {} rounds → {} rows at {}",
        summary.rounds_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Points delta plot: {}", plot_path.display());
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }
    if let Some(outputs) = summary.telemetry_outputs.as_ref() {
        println!("Telemetry summary (JSON): {}", outputs.json_path.display());
        println!(
            "Telemetry summary (Markdown): {}",
            outputs.markdown_path.display()
        );
        let decisions = &outputs.summary.decisions;
        if let Some(avg_bust) = decisions.avg_bust_probability {
            println!(
                "  Decisions: {} events, avg bust probability {:.3}",
                decisions.count, avg_bust
            );
        } else {
            println!("  Decisions: {} events captured", decisions.count);
        }
        if !outputs.summary.rounds.ending_counts.is_empty() {
            println!("  Round endings: {:?}", outputs.summary.rounds.ending_counts);
        }
    }

    Ok(())
}
