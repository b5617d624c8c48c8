//! Quantum 8-Ball Simulator CLI
//!
//! Ask the simulated 8-ball a question, or run the scenario catalogue.

use clap::Parser;
use qball_core::{RunConfig, STARTUP_EXIT_CODE};
use qball_sim::scenarios::ScenarioId;
use qball_sim::{
    AccessoryPresence, FaultPlan, RemoteFault, ScenarioResult, ScenarioRunner, SimError, SimExport,
    CHECK_FAILURE_EXIT_CODE,
};
use std::path::PathBuf;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Quantum 8-Ball deterministic simulation CLI
#[derive(Parser, Debug)]
#[command(name = "qball-sim")]
#[command(about = "Run the Quantum 8-Ball against a simulated robot", long_about = None)]
struct Args {
    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of consecutive seeds to run
    #[arg(long, default_value = "1")]
    seeds: usize,

    /// Register size (1 = yes/no, 3 = Magic 8-Ball)
    #[arg(short, long)]
    qubits: Option<usize>,

    /// JSON run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scenario to run (random, affirmative, negative, accessory_timeout, connect_failure, ..., all)
    #[arg(short = 'S', long, default_value = "random")]
    scenario: String,

    /// Decode real images from this directory
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Write run transcripts to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,

    // Fault flags (apply to the `random` scenario)
    /// Robot cannot be reached
    #[arg(long)]
    connect_fails: bool,

    /// Robot cannot drive off its charger
    #[arg(long)]
    undock_fails: bool,

    /// Light cube behavior
    #[arg(long, value_enum, default_value = "present")]
    accessory: AccessoryPresence,

    /// Docking maneuver that succeeds (1-based)
    #[arg(long, default_value = "1", conflicts_with = "dock_never")]
    dock_on: u32,

    /// Every docking maneuver fails
    #[arg(long)]
    dock_never: bool,

    /// Text-to-speech fails
    #[arg(long)]
    speech_fails: bool,

    /// Animation the robot cannot play (repeatable)
    #[arg(long = "fail-animation")]
    fail_animations: Vec<String>,

    /// Return-to-dock and pose reset fail
    #[arg(long)]
    terminal_fails: bool,

    /// Polls before display control is granted
    #[arg(long, default_value = "0")]
    display_lag: u32,

    /// Mean simulated device latency in ms (0 disables)
    #[arg(long, default_value = "40")]
    latency_ms: f64,

    /// Remote provider misbehavior
    #[arg(long, value_enum, default_value = "none")]
    remote_fault: RemoteFault,
}

impl Args {
    fn fault_plan(&self) -> FaultPlan {
        FaultPlan {
            connect_fails: self.connect_fails,
            undock_fails: self.undock_fails,
            accessory: self.accessory,
            dock_succeeds_on: if self.dock_never { None } else { Some(self.dock_on) },
            speech_fails: self.speech_fails,
            failing_animations: self.fail_animations.clone(),
            terminal_fails: self.terminal_fails,
            display_control_lag: self.display_lag,
            latency_mean_ms: self.latency_ms,
            latency_std_ms: self.latency_ms * 0.375,
        }
    }

    /// File config, then CLI overrides.
    fn run_config(&self) -> Result<RunConfig, SimError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_json_file(path)?,
            None => RunConfig::default(),
        };
        if let Some(qubits) = self.qubits {
            config.qubits = qubits;
        }
        if let Some(assets) = &self.assets {
            config.asset_dir = assets.clone();
            config.assets().ensure_exists()?;
        }
        config.validate()?;
        Ok(config)
    }
}

fn startup_failure(err: impl std::fmt::Display) -> ! {
    error!("Startup failed: {}", err);
    std::process::exit(STARTUP_EXIT_CODE);
}

fn log_result(result: &ScenarioResult) {
    let report = &result.report;
    if let (Some(measured), Some(phrase)) = (&report.measurement, &report.phrase) {
        info!("🎱 {} → \"{}\"", measured, phrase);
    }
    for recovered in &report.recovered {
        info!("  ↳ recovered: {}", recovered);
    }
    if result.passed {
        info!(
            "✓ {} (seed={}) PASSED exit={} in {}ms",
            result.scenario.name(),
            result.seed,
            report.exit_code(),
            report.elapsed_ms
        );
    } else {
        error!(
            "✗ {} (seed={}) FAILED: {}",
            result.scenario.name(),
            result.seed,
            result.failure_reason.as_deref().unwrap_or("unknown")
        );
    }
}

#[tokio::main(flavor = "current_thread", start_paused = true)]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("Quantum 8-Ball Simulator v0.1.0");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let config = args.run_config().unwrap_or_else(|e| startup_failure(e));

    // Parse scenarios
    let scenarios: Vec<ScenarioId> = if args.scenario == "all" {
        ScenarioId::all()
    } else {
        vec![args.scenario.parse().unwrap_or_else(|e| startup_failure(e))]
    };
    let demo_mode = scenarios == [ScenarioId::Random];

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(1)
    } else {
        args.seed
    };

    let mut export = SimExport::new(base_seed, config.qubits);
    let mut all_results: Vec<ScenarioResult> = Vec::new();

    for seed_offset in 0..args.seeds {
        let seed = base_seed.wrapping_add(seed_offset as u64);
        let runner = ScenarioRunner::new(seed, config.clone())
            .unwrap_or_else(|e| startup_failure(e))
            .with_faults(args.fault_plan())
            .with_remote_fault(args.remote_fault)
            .with_fs_assets(args.assets.is_some());

        for scenario in &scenarios {
            let result = runner.run(*scenario).await;
            if !args.json {
                log_result(&result);
            }
            export.add_run(&result);
            all_results.push(result);
        }
    }

    let total = all_results.len();
    let failed_count = all_results.iter().filter(|r| !r.passed).count();

    if args.json {
        // JSON output for CI parsing
        let summary = serde_json::json!({
            "total": total,
            "passed": total - failed_count,
            "failed": failed_count,
            "results": all_results.iter().map(|r| {
                serde_json::json!({
                    "scenario": r.scenario.name(),
                    "seed": r.seed,
                    "passed": r.passed,
                    "exit_code": r.report.exit_code(),
                    "measurement": r.report.measurement,
                    "phrase": r.report.phrase,
                    "recovered": r.report.recovered.len(),
                    "elapsed_ms": r.report.elapsed_ms,
                    "failure_reason": r.failure_reason,
                })
            }).collect::<Vec<_>>(),
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to render summary: {}", e),
        }
    } else if !demo_mode {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        if failed_count == 0 {
            info!("✅ All {} scenario runs passed!", total);
        } else {
            error!("❌ {}/{} scenario runs failed!", failed_count, total);
        }
    }

    if let Some(path) = &args.export {
        match export.write_to_file(path) {
            Ok(()) => info!("Exported {} run transcripts to {}", export.runs.len(), path.display()),
            Err(source) => {
                let err = SimError::Export {
                    path: path.clone(),
                    source,
                };
                error!("{}", err);
                std::process::exit(STARTUP_EXIT_CODE);
            }
        }
    }

    // Exit with proper code
    if failed_count > 0 {
        std::process::exit(CHECK_FAILURE_EXIT_CODE);
    }
    if demo_mode {
        let code = all_results
            .iter()
            .map(|r| r.report.exit_code())
            .find(|c| *c != 0)
            .unwrap_or(0);
        std::process::exit(code);
    }
}
