//! Containers: owned process groups with simulated resource counters.
//!
//! Each container has a single lock guarding its processes, counters and
//! task handles. Actions never run under that lock; the supervising task
//! only re-acquires it to record the final transition.

use std::fmt;
use std::sync::Arc;

use corral_common::constants::CPU_LOAD_CEILING;
use corral_common::error::{CorralError, Result};
use corral_common::types::{ContainerId, ProcessState};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::monitor::ContainerSnapshot;
use crate::observe::{Observation, Observer};
use crate::process::{Process, ProcessContext, ProcessExit, ProcessInfo, Runnable};

struct Shared {
    memory_mb: u64,
    cpu_load: f64,
    processes: Vec<Process>,
    tasks: Vec<JoinHandle<ProcessExit>>,
}

/// A named group of processes.
pub struct Container {
    id: ContainerId,
    name: String,
    shared: Arc<Mutex<Shared>>,
    observer: Arc<dyn Observer>,
}

impl Container {
    /// Creates an empty container with zero CPU load.
    #[must_use]
    pub fn new(
        id: ContainerId,
        name: impl Into<String>,
        memory_mb: u64,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            shared: Arc::new(Mutex::new(Shared {
                memory_mb,
                cpu_load: 0.0,
                processes: Vec::new(),
                tasks: Vec::new(),
            })),
            observer,
        }
    }

    /// Unique identifier.
    #[must_use]
    pub const fn id(&self) -> &ContainerId {
        &self.id
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulated memory in megabytes.
    #[must_use]
    pub fn memory_mb(&self) -> u64 {
        self.shared.lock().memory_mb
    }

    /// Simulated CPU load percentage.
    #[must_use]
    pub fn cpu_load(&self) -> f64 {
        self.shared.lock().cpu_load
    }

    /// Appends a process, forcing it into the `Running` state.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::DuplicateProcess`] if a process with the
    /// same name already belongs to this container.
    pub fn add_process(&self, mut process: Process) -> Result<()> {
        let mut shared = self.shared.lock();
        if shared.processes.iter().any(|p| p.name() == process.name()) {
            return Err(CorralError::DuplicateProcess {
                container: self.id.clone(),
                name: process.name().to_string(),
            });
        }
        process.adopt();
        tracing::debug!(container = %self.id, process = %process.name(), "process added");
        shared.processes.push(process);
        Ok(())
    }

    /// Dispatches every running, not yet dispatched process onto its own
    /// task and returns immediately.
    ///
    /// Returns the number of processes dispatched.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime, since each dispatch
    /// uses [`tokio::spawn`].
    pub fn start_processes(&self) -> usize {
        let mut shared = self.shared.lock();
        let mut spawned = Vec::new();
        for (index, process) in shared.processes.iter_mut().enumerate() {
            if let Some((action, ctx)) = process.dispatch(&self.observer) {
                tracing::debug!(container = %self.id, process = %process.name(), "dispatching");
                spawned.push(self.supervise(index, action, ctx));
            }
        }
        let count = spawned.len();
        shared.tasks.extend(spawned);
        count
    }

    /// Moves every running process to `Stopped` and raises its stop
    /// signal. Actions already executing are not aborted.
    ///
    /// Returns the number of processes stopped.
    pub fn stop_processes(&self) -> usize {
        let mut shared = self.shared.lock();
        let stopped = shared
            .processes
            .iter_mut()
            .map(Process::stop)
            .filter(|stopped| *stopped)
            .count();
        tracing::debug!(container = %self.id, stopped, "processes stopped");
        stopped
    }

    /// Waits for every dispatched task and reports how each ended.
    ///
    /// Handles are consumed: a second call only reports processes
    /// dispatched in between.
    pub async fn join(&self) -> Vec<ProcessExit> {
        let tasks = std::mem::take(&mut self.shared.lock().tasks);
        let mut exits = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(exit) => exits.push(exit),
                Err(e) => tracing::warn!(container = %self.id, error = %e, "supervisor task lost"),
            }
        }
        exits
    }

    /// Number of processes currently in the `Running` state.
    #[must_use]
    pub fn running_count(&self) -> usize {
        self.shared
            .lock()
            .processes
            .iter()
            .filter(|p| p.state() == ProcessState::Running)
            .count()
    }

    /// Snapshots every process, in insertion order.
    #[must_use]
    pub fn processes(&self) -> Vec<ProcessInfo> {
        self.shared.lock().processes.iter().map(Process::info).collect()
    }

    /// Returns the state of the named process.
    #[must_use]
    pub fn process_state(&self, name: &str) -> Option<ProcessState> {
        self.shared
            .lock()
            .processes
            .iter()
            .find(|p| p.name() == name)
            .map(Process::state)
    }

    /// Takes a consistent snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> ContainerSnapshot {
        let shared = self.shared.lock();
        ContainerSnapshot {
            id: self.id.clone(),
            name: self.name.clone(),
            memory_mb: shared.memory_mb,
            cpu_load: shared.cpu_load,
            running: shared
                .processes
                .iter()
                .filter(|p| p.state() == ProcessState::Running)
                .count(),
        }
    }

    /// Overwrites the simulated CPU load, clamped to `0..=100`.
    pub fn set_cpu_load(&self, load: f64) {
        self.shared.lock().cpu_load = load.clamp(0.0, CPU_LOAD_CEILING);
    }

    /// Shifts the simulated memory by `delta_mb`, saturating at zero.
    /// Returns the new value.
    pub fn adjust_memory(&self, delta_mb: i64) -> u64 {
        let mut shared = self.shared.lock();
        shared.memory_mb = shared.memory_mb.saturating_add_signed(delta_mb);
        shared.memory_mb
    }

    fn supervise(
        &self,
        index: usize,
        action: Arc<dyn Runnable>,
        ctx: ProcessContext,
    ) -> JoinHandle<ProcessExit> {
        let shared = Arc::clone(&self.shared);
        let observer = Arc::clone(&self.observer);
        let container = self.id.clone();
        let name = ctx.name().to_string();

        tokio::spawn(async move {
            let task = tokio::spawn(async move { action.execute(ctx).await });
            let (next, failure) = match task.await {
                Ok(Ok(())) => (ProcessState::Completed, None),
                Ok(Err(CorralError::ActionFailed { message, .. })) => {
                    (ProcessState::Failed, Some(message))
                }
                Ok(Err(e)) => (ProcessState::Failed, Some(e.to_string())),
                Err(e) if e.is_panic() => (ProcessState::Failed, Some("action panicked".into())),
                Err(e) => (ProcessState::Failed, Some(e.to_string())),
            };

            let state = {
                let mut shared = shared.lock();
                shared.processes.get_mut(index).map(|p| {
                    let _ = p.transition(next);
                    p.state()
                })
            };
            let state = state.unwrap_or(next);

            if let Some(reason) = failure {
                tracing::warn!(%container, process = %name, %reason, %state, "action failed");
                if state == ProcessState::Failed {
                    observer.emit(&Observation::ProcessFailed {
                        name: name.clone(),
                        reason,
                    });
                }
            } else {
                tracing::debug!(%container, process = %name, %state, "action finished");
            }

            ProcessExit { name, state }
        })
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared = self.shared.lock();
        f.debug_struct("Container")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("memory_mb", &shared.memory_mb)
            .field("cpu_load", &shared.cpu_load)
            .field("processes", &shared.processes)
            .finish_non_exhaustive()
    }
}
