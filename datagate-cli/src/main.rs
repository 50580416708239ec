use clap::Parser;
use datagate_core::domain::Options;
use datagate_core::ingest;
use datagate_core::logging::{BufferedEventLogger, NoopEventLogger, SharedEventLogger};
use datagate_core::metrics::{InMemoryMetrics, Metrics};
use datagate_core::orchestrator::Orchestrator;
use datagate_core::progress::{ProgressEvent, ProgressSink, Reporter, SharedProgressSink};
use datagate_core::validators::{self, GATE_NAMES};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "datagate", about = "Run gate checks against a chat dataset")]
pub struct Cli {
    /// Path to the dataset: a JSON array of {"messages": [...]} samples.
    pub dataset: String,

    /// TOML file selecting gates and their options. All local gates with
    /// defaults when omitted.
    #[arg(long)]
    pub config: Option<String>,

    /// Per-check timeout in seconds. A check that exceeds it is reported as
    /// cancelled.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Stream per-check progress to stderr.
    #[arg(long)]
    pub progress: bool,

    /// Dump run events and metrics to stderr after the report.
    #[arg(long)]
    pub verbose: bool,
}

#[derive(serde::Deserialize)]
struct GatePlan {
    gates: Vec<GateToml>,
}

#[derive(serde::Deserialize)]
struct GateToml {
    name: String,
    #[serde(default)]
    options: HashMap<String, toml::Value>,
}

struct StderrProgressSink;

impl ProgressSink for StderrProgressSink {
    fn emit(&self, event: ProgressEvent) -> anyhow::Result<()> {
        match (&event.stage, event.current, event.total) {
            (Some(stage), _, _) => eprintln!("[{}] {stage}", event.validator_name),
            (None, Some(current), Some(total)) => {
                eprintln!("[{}] {current}/{total}", event.validator_name)
            }
            _ => {}
        }
        Ok(())
    }
}

fn gate_plan(config: Option<&str>) -> anyhow::Result<Vec<(String, Options)>> {
    let Some(path) = config else {
        return Ok(GATE_NAMES
            .iter()
            .map(|name| (name.to_string(), Options::new()))
            .collect());
    };
    let raw = std::fs::read_to_string(path)?;
    let plan: GatePlan = toml::from_str(&raw)?;
    plan.gates
        .into_iter()
        .map(|gate| -> anyhow::Result<(String, Options)> {
            let mut options = Options::new();
            for (key, value) in gate.options {
                options = options.with(key, serde_json::to_value(value)?);
            }
            Ok((gate.name, options))
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.dataset)?;
    let dataset = ingest::dataset_from_str(&raw)?;

    let buffered = Arc::new(BufferedEventLogger::new(4096, 256));
    let logger: SharedEventLogger = if cli.verbose {
        buffered.clone()
    } else {
        Arc::new(NoopEventLogger)
    };
    let sink: Option<SharedProgressSink> = if cli.progress {
        Some(Arc::new(StderrProgressSink))
    } else {
        None
    };

    let mut checks = Vec::new();
    for (name, options) in gate_plan(cli.config.as_deref())? {
        let reporter = Reporter::new(name.clone(), sink.clone(), logger.clone());
        checks.push(validators::create_validator(&name, options, reporter)?);
    }

    let metrics = Arc::new(InMemoryMetrics::new());
    let mut orchestrator = Orchestrator::new(checks, metrics.clone(), logger);
    if let Some(secs) = cli.timeout_secs {
        orchestrator = orchestrator.with_check_timeout(Duration::from_secs(secs));
    }

    let report = orchestrator.run(&dataset).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if cli.verbose {
        let (_, events) = buffered.events_since(0);
        for event in events {
            eprintln!("{}", serde_json::to_string(&event)?);
        }
        eprintln!("{}", serde_json::to_string(&metrics.snapshot())?);
    }

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}
