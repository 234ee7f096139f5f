//! Periodic kernel monitoring.
//!
//! Each cycle emits a header, takes one atomic snapshot of every
//! container under the registry lock, emits one row per container, then
//! sleeps outside of any lock.

use std::time::Duration;

use corral_common::types::ContainerId;
use serde::Serialize;

use crate::kernel::Kernel;
use crate::observe::Observation;
use crate::signal::StopSignal;

/// Counters of one container at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerSnapshot {
    /// Container identifier.
    pub id: ContainerId,
    /// Container name.
    pub name: String,
    /// Simulated memory in megabytes.
    pub memory_mb: u64,
    /// Simulated CPU load percentage.
    pub cpu_load: f64,
    /// Number of processes in the `Running` state.
    pub running: usize,
}

/// Outcome of a monitor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorReport {
    /// Number of snapshot cycles emitted.
    pub cycles: u32,
    /// Whether the stop signal ended the run.
    pub cancelled: bool,
}

/// Runs `cycles` snapshot cycles spaced by `interval`.
///
/// When `stop` is given and raised, the loop ends before the next
/// snapshot, waking from its sleep if needed.
pub async fn run(
    kernel: &Kernel,
    interval: Duration,
    cycles: u32,
    mut stop: Option<StopSignal>,
) -> MonitorReport {
    let mut report = MonitorReport {
        cycles: 0,
        cancelled: false,
    };

    for cycle in 0..cycles {
        if stop.as_ref().is_some_and(StopSignal::is_requested) {
            report.cancelled = true;
            break;
        }

        kernel.emit(&Observation::MonitorHeader);
        let rows = kernel.snapshot();
        tracing::debug!(cycle, containers = rows.len(), "monitor snapshot");
        for row in rows {
            kernel.emit(&Observation::MonitorRow(row));
        }
        report.cycles += 1;

        if let Some(signal) = stop.as_mut() {
            tokio::select! {
                () = tokio::time::sleep(interval) => {}
                () = signal.requested() => {
                    report.cancelled = true;
                    break;
                }
            }
        } else {
            tokio::time::sleep(interval).await;
        }
    }

    tracing::info!(cycles = report.cycles, cancelled = report.cancelled, "monitor finished");
    report
}
