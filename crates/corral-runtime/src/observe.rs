//! Observation sink.
//!
//! Observations are the one-way status lines a kernel run produces. They
//! are distinct from `tracing` diagnostics: an [`Observer`] decides where
//! they end up (console, log, memory).

use std::fmt;

use parking_lot::Mutex;

use crate::monitor::ContainerSnapshot;

/// A single emitted status line.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// A container was registered.
    ContainerCreated {
        /// Container name.
        name: String,
    },
    /// A container is about to dispatch its processes.
    ContainerStarting {
        /// Container name.
        name: String,
    },
    /// A container is about to stop its processes.
    ContainerStopping {
        /// Container name.
        name: String,
    },
    /// Start of a monitor cycle.
    MonitorHeader,
    /// One container row of a monitor cycle.
    MonitorRow(ContainerSnapshot),
    /// A message was passed between two containers.
    MessageSent {
        /// Sender container name.
        from: String,
        /// Receiver container name.
        to: String,
        /// Message text.
        text: String,
    },
    /// A message endpoint did not resolve.
    MessagingError,
    /// A process action began executing.
    ProcessStarted {
        /// Process name.
        name: String,
    },
    /// A process action finished.
    ProcessCompleted {
        /// Process name.
        name: String,
    },
    /// A process action returned an error or panicked.
    ProcessFailed {
        /// Process name.
        name: String,
        /// Failure description.
        reason: String,
    },
    /// Every container has been stopped.
    AllStopped,
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContainerCreated { name } => write!(f, "[Kernel] Created container: {name}"),
            Self::ContainerStarting { name } => write!(f, "[Kernel] Starting container: {name}"),
            Self::ContainerStopping { name } => write!(f, "[Kernel] Stopping container: {name}"),
            Self::MonitorHeader => write!(f, "=== Kernel Monitoring ==="),
            Self::MonitorRow(row) => write!(
                f,
                "Container {} | Memory: {}MB | CPU: {:.2}% | Running Processes: {}",
                row.name, row.memory_mb, row.cpu_load, row.running
            ),
            Self::MessageSent { from, to, text } => write!(f, "[Kernel] {from} -> {to} : {text}"),
            Self::MessagingError => write!(f, "[Kernel] Messaging error: container not found"),
            Self::ProcessStarted { name } => write!(f, "Process {name} started"),
            Self::ProcessCompleted { name } => write!(f, "Process {name} completed"),
            Self::ProcessFailed { name, reason } => write!(f, "Process {name} failed: {reason}"),
            Self::AllStopped => write!(f, "[Kernel] All containers stopped."),
        }
    }
}

/// Destination of observations.
pub trait Observer: Send + Sync {
    /// Receives one observation.
    fn emit(&self, observation: &Observation);
}

/// Forwards observations to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn emit(&self, observation: &Observation) {
        tracing::info!(target: "corral::observe", "{observation}");
    }
}

/// Keeps every observation in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    seen: Mutex<Vec<Observation>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn observations(&self) -> Vec<Observation> {
        self.seen.lock().clone()
    }

    /// Returns the recorded observations rendered as lines.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.seen.lock().iter().map(ToString::to_string).collect()
    }

    /// Counts recorded observations matching `pred`.
    pub fn count(&self, pred: impl Fn(&Observation) -> bool) -> usize {
        self.seen.lock().iter().filter(|o| pred(o)).count()
    }

    /// Drops everything recorded so far.
    pub fn clear(&self) {
        self.seen.lock().clear();
    }
}

impl Observer for RecordingObserver {
    fn emit(&self, observation: &Observation) {
        self.seen.lock().push(observation.clone());
    }
}

#[cfg(test)]
mod tests {
    use corral_common::types::ContainerId;

    use super::*;

    #[test]
    fn kernel_lines_render_exactly() {
        let cases = [
            (
                Observation::ContainerCreated {
                    name: "WebServer".into(),
                },
                "[Kernel] Created container: WebServer",
            ),
            (
                Observation::ContainerStarting {
                    name: "Database".into(),
                },
                "[Kernel] Starting container: Database",
            ),
            (
                Observation::ContainerStopping {
                    name: "Database".into(),
                },
                "[Kernel] Stopping container: Database",
            ),
            (Observation::MonitorHeader, "=== Kernel Monitoring ==="),
            (
                Observation::MessageSent {
                    from: "WebServer".into(),
                    to: "Database".into(),
                    text: "ping".into(),
                },
                "[Kernel] WebServer -> Database : ping",
            ),
            (
                Observation::MessagingError,
                "[Kernel] Messaging error: container not found",
            ),
            (Observation::AllStopped, "[Kernel] All containers stopped."),
        ];
        for (observation, line) in cases {
            assert_eq!(observation.to_string(), line);
        }
    }

    #[test]
    fn monitor_row_uses_two_decimals() {
        let row = Observation::MonitorRow(ContainerSnapshot {
            id: ContainerId::new("c1"),
            name: "WebServer".into(),
            memory_mb: 512,
            cpu_load: 37.5,
            running: 2,
        });
        assert_eq!(
            row.to_string(),
            "Container WebServer | Memory: 512MB | CPU: 37.50% | Running Processes: 2"
        );
    }

    #[test]
    fn process_lines_render_exactly() {
        let started = Observation::ProcessStarted {
            name: "HTTP Server".into(),
        };
        let completed = Observation::ProcessCompleted {
            name: "HTTP Server".into(),
        };
        assert_eq!(started.to_string(), "Process HTTP Server started");
        assert_eq!(completed.to_string(), "Process HTTP Server completed");
    }

    #[test]
    fn recorder_keeps_order_and_clears() {
        let recorder = RecordingObserver::new();
        recorder.emit(&Observation::MonitorHeader);
        recorder.emit(&Observation::AllStopped);

        assert_eq!(
            recorder.lines(),
            vec!["=== Kernel Monitoring ===", "[Kernel] All containers stopped."]
        );
        let headers = recorder.count(|o| matches!(o, Observation::MonitorHeader));
        assert_eq!(headers, 1);

        recorder.clear();
        assert!(recorder.observations().is_empty());
    }
}
