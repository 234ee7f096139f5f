//! Simulated process workloads used by the demo.

use std::time::Duration;

use async_trait::async_trait;
use corral_common::error::Result;
use corral_runtime::observe::Observation;
use corral_runtime::process::{Process, ProcessContext, Runnable};

/// Pretends to serve traffic for a fixed duration.
///
/// Announces its start and natural completion. A stop request ends the
/// wait early without a completion line.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedWorkload {
    duration: Duration,
}

impl SimulatedWorkload {
    /// Creates a workload lasting `duration`.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Wraps a workload into a process.
    #[must_use]
    pub fn process(name: &str, priority: u8, duration: Duration) -> Process {
        Process::new(name, priority, Self::new(duration))
    }
}

#[async_trait]
impl Runnable for SimulatedWorkload {
    async fn execute(&self, mut ctx: ProcessContext) -> Result<()> {
        ctx.emit(&Observation::ProcessStarted {
            name: ctx.name().to_string(),
        });
        tokio::select! {
            () = tokio::time::sleep(self.duration) => {
                ctx.emit(&Observation::ProcessCompleted {
                    name: ctx.name().to_string(),
                });
            }
            () = ctx.stop_requested() => {
                tracing::debug!(process = %ctx.name(), "workload interrupted");
            }
        }
        Ok(())
    }
}
