//! Trial supply simulator CLI
//!
//! Thin collaborator around the core: injects the single "activate
//! site" trigger, runs the pipeline to quiescence, and prints the
//! timeline and derived metrics. All decision logic lives in the core.

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trial_supply_simulator_core_rs::{
    FixtureSet, Orchestrator, SimulationConfig, SimulationError, TimelineEvent,
};

#[derive(Debug, Parser)]
#[command(name = "trial-supply-sim")]
#[command(about = "Deterministic clinical-trial supply chain simulation")]
struct Args {
    /// Site to activate
    #[arg(long, default_value = "SITE-01")]
    site: String,

    /// Study identifier stamped on all messages
    #[arg(long, default_value = "STUDY-ALPHA")]
    study: String,

    /// Logical day of the activation trigger
    #[arg(long, default_value_t = 0)]
    start_day: usize,

    /// Replace the canonical batch catalog with a seeded random one
    #[arg(long)]
    random_batches: Option<u64>,

    /// Number of batches when --random-batches is given
    #[arg(long, default_value_t = 8)]
    batch_count: usize,

    /// Emit the full run (events, metrics, snapshots) as JSON
    #[arg(long)]
    json: bool,
}

fn config_from(args: &Args) -> SimulationConfig {
    let fixtures = match args.random_batches {
        Some(seed) => FixtureSet::randomized(seed, args.batch_count),
        None => FixtureSet::default(),
    };
    SimulationConfig {
        study_id: args.study.clone(),
        start_day: args.start_day,
        fixtures,
        ..SimulationConfig::default()
    }
}

fn format_event(event: &TimelineEvent) -> String {
    let target = match event.target() {
        Some(agent) => agent.display_name(),
        None => "-",
    };
    format!(
        "#{:02}  day {}  [{}]  {} -> {}  {}",
        event.id(),
        event.day(),
        event.protocol().as_str(),
        event.source().display_name(),
        target,
        event.kind(),
    )
}

fn run(args: &Args) -> Result<(), SimulationError> {
    let mut orchestrator = Orchestrator::new(config_from(args))?;
    let report = orchestrator.activate_site(&args.site)?;
    info!(steps = report.steps, events = report.events_published, "run quiesced");

    if args.json {
        let output = serde_json::json!({
            "events": orchestrator.timeline().all_events(),
            "metrics": report.metrics.as_map(),
            "agents": orchestrator.snapshots(),
            "query_counts": orchestrator.systems().query_counters().counts,
            "digest": orchestrator.timeline().digest(),
        });
        println!("{}", serde_json::to_string_pretty(&output).expect("run output serializes"));
        return Ok(());
    }

    println!("Timeline ({} events):", orchestrator.timeline().len());
    for event in orchestrator.timeline().all_events() {
        println!("  {}", format_event(event));
    }

    println!("\nMetrics:");
    for (name, value) in report.metrics.as_map() {
        println!("  {:<24} {}", name, value);
    }

    println!("\nTimeline digest: {}", orchestrator.timeline().digest());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("simulation failed: {}", err);
        std::process::exit(1);
    }
}
