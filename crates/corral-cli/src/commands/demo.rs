//! `corral demo` — Run the sample WebServer/Database workload.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Args;
use corral_common::config::CorralConfig;
use corral_common::types::ContainerId;
use corral_runtime::kernel::Kernel;
use corral_runtime::observe::Observer;
use corral_runtime::signal::stop_channel;
use corral_runtime::simulator::{JitterSource, RandomJitter, ResourceSimulator};

use crate::output::{BOLD, ConsoleObserver, DIM, GREEN, RESET, YELLOW, format_megabytes};
use crate::workload::SimulatedWorkload;

/// Sample containers: id, name, memory in MB.
const CONTAINERS: [(&str, &str, u64); 2] = [("c1", "WebServer", 512), ("c2", "Database", 1024)];

/// Sample processes: container id, process name, workload seconds.
const PROCESSES: [(&str, &str, f64); 4] = [
    ("c1", "HTTP Server", 2.0),
    ("c1", "Worker", 3.0),
    ("c2", "DB Engine", 4.0),
    ("c2", "Backup", 5.0),
];

/// Sample messages: sender id, receiver id, text.
const MESSAGES: [(&str, &str, &str); 2] = [
    ("c1", "c2", "Query: SELECT * FROM users;"),
    ("c2", "c1", "Response: 42 records returned."),
];

/// Arguments for the `demo` command.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Number of monitor cycles (overrides the configuration).
    #[arg(long)]
    pub cycles: Option<u32>,

    /// Delay between monitor cycles in milliseconds (overrides the configuration).
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Do not run the background resource simulator.
    #[arg(long)]
    pub no_simulator: bool,

    /// Multiplier applied to every workload duration.
    #[arg(long, default_value_t = 1.0)]
    pub time_scale: f64,

    /// Seed for the jitter source, for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Executes the `demo` command.
///
/// # Errors
///
/// Returns an error if the arguments are invalid, the runtime cannot be
/// built, or a sample container cannot be registered.
pub fn execute(args: DemoArgs, mut config: CorralConfig) -> anyhow::Result<()> {
    if !args.time_scale.is_finite() || args.time_scale <= 0.0 {
        return Err(anyhow::anyhow!(
            "--time-scale must be a positive number, got {}",
            args.time_scale
        ));
    }
    for (_, name, secs) in PROCESSES {
        let _ = workload_duration(name, secs, args.time_scale)?;
    }
    if let Some(cycles) = args.cycles {
        config.monitor.cycles = cycles;
    }
    if let Some(interval_ms) = args.interval_ms {
        config.monitor.interval_ms = interval_ms;
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(&args, &config))
}

async fn run(args: &DemoArgs, config: &CorralConfig) -> anyhow::Result<()> {
    let started = Instant::now();
    print_header();

    let observer: Arc<dyn Observer> = Arc::new(ConsoleObserver);
    let kernel = Arc::new(Kernel::new(observer));
    let mut jitter = args
        .seed
        .map_or_else(RandomJitter::from_entropy, RandomJitter::seeded);

    register_samples(&kernel, &mut jitter, args.time_scale)?;

    let _ = kernel.start_all();
    for (from, to, text) in MESSAGES {
        if let Err(e) = kernel.send_message(&ContainerId::new(from), &ContainerId::new(to), text) {
            tracing::warn!(error = %e, "message not delivered");
        }
    }

    let (handle, signal) = stop_channel();
    ctrlc::set_handler(move || handle.request())
        .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

    let simulator = if args.no_simulator {
        None
    } else {
        Some(ResourceSimulator::new(&config.simulator).spawn(
            Arc::clone(&kernel),
            Box::new(jitter),
            Some(signal.clone()),
        ))
    };

    let report = kernel
        .monitor_until(config.monitor.interval(), config.monitor.cycles, signal)
        .await;
    if report.cancelled {
        eprintln!("  {YELLOW}Interrupted{RESET} after {} monitor cycle(s).", report.cycles);
    }

    let _ = kernel.stop_all();
    kernel.finish();

    if let Some(simulator) = simulator {
        let rounds = simulator.await?;
        tracing::debug!(rounds, "resource simulator joined");
    }
    let exits = kernel.join_all().await;

    eprintln!();
    eprintln!(
        "  {GREEN}{BOLD}Finished{RESET} in {:.1}s, {} process task(s) joined.",
        started.elapsed().as_secs_f64(),
        exits.len()
    );
    for row in kernel.snapshot() {
        eprintln!(
            "    {DIM}{} [{}]: {}{RESET}",
            row.name,
            row.id,
            format_megabytes(row.memory_mb)
        );
    }
    Ok(())
}

fn register_samples(
    kernel: &Kernel,
    jitter: &mut dyn JitterSource,
    time_scale: f64,
) -> anyhow::Result<()> {
    for (id, name, memory_mb) in CONTAINERS {
        let _ = kernel.create_container(id, name, memory_mb)?;
    }
    for (id, name, secs) in PROCESSES {
        let container = kernel
            .container(&ContainerId::new(id))
            .ok_or_else(|| anyhow::anyhow!("sample container {id} missing"))?;
        let duration = workload_duration(name, secs, time_scale)?;
        container.add_process(SimulatedWorkload::process(name, jitter.priority(), duration))?;
    }
    Ok(())
}

fn workload_duration(name: &str, secs: f64, time_scale: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(secs * time_scale)
        .map_err(|e| anyhow::anyhow!("--time-scale {time_scale} is out of range for {name}: {e}"))
}

fn print_header() {
    eprintln!();
    eprintln!("  {BOLD}Corral{RESET} {DIM}v{}{RESET}", env!("CARGO_PKG_VERSION"));
    eprintln!();
}
