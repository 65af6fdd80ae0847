use std::fs::{self, File};

use anyhow::{Context, Result};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LogLevel, LoggingConfig, ResolvedOutputs};

/// Emitted by `flip7_bot` policies, one per HIT/STAY choice.
pub const DECISION_TARGET: &str = "flip7_bot::decision";
/// Emitted by the runner once per agent and deal.
pub const ROUND_TARGET: &str = "flip7_bench::round";

/// Flushes `telemetry.jsonl` when dropped.
pub struct LoggingGuard {
    _worker: WorkerGuard,
}

/// Filter used when `RUST_LOG` is unset: the two telemetry targets at the
/// configured level, everything else only from `warn`.
pub fn default_directives(level: LogLevel) -> String {
    let level = level.as_str();
    format!("warn,{DECISION_TARGET}={level},{ROUND_TARGET}={level}")
}

fn event_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Install a JSON subscriber writing to the run's telemetry file.
///
/// Returns `None` when structured logging is off. Only the first call in a
/// process installs the subscriber; later runs keep writing to the first file.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.structured {
        return Ok(None);
    }

    fs::create_dir_all(&outputs.dir)
        .with_context(|| format!("creating output directory {}", outputs.dir.display()))?;
    let file = File::create(&outputs.telemetry).with_context(|| {
        format!(
            "creating telemetry file at {}",
            outputs.telemetry.display()
        )
    })?;

    let (writer, worker) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(event_filter(logging.level))
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(Some(LoggingGuard { _worker: worker }))
}
