//! Kernel registry and cross-container orchestration.
//!
//! # Lock order
//!
//! The registry lock is always taken first and a container's own lock
//! second. Container operations never call back into the kernel, so no
//! path acquires the two in the opposite order. New operations must keep
//! this order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use corral_common::error::{CorralError, Result};
use corral_common::types::ContainerId;
use parking_lot::Mutex;
use serde::Serialize;

use crate::container::Container;
use crate::monitor::{self, ContainerSnapshot, MonitorReport};
use crate::observe::{Observation, Observer, TracingObserver};
use crate::process::ProcessExit;
use crate::signal::StopSignal;

/// A logical message passed between two containers.
///
/// Messages are observational only: nothing is delivered into the
/// destination container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: uuid::Uuid,
    /// Sender container name.
    pub from: String,
    /// Receiver container name.
    pub to: String,
    /// Message text.
    pub text: String,
    /// ISO-8601 send timestamp.
    pub sent_at: String,
}

/// Top-level registry of containers.
pub struct Kernel {
    containers: Mutex<BTreeMap<ContainerId, Arc<Container>>>,
    observer: Arc<dyn Observer>,
}

impl Kernel {
    /// Creates an empty kernel emitting into `observer`.
    #[must_use]
    pub fn new(observer: Arc<dyn Observer>) -> Self {
        Self {
            containers: Mutex::new(BTreeMap::new()),
            observer,
        }
    }

    /// Emits an observation through the kernel's sink.
    pub fn emit(&self, observation: &Observation) {
        self.observer.emit(observation);
    }

    /// Registers a new container with zero CPU load and no processes.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::DuplicateId`] if `id` is already registered;
    /// the existing container is left untouched.
    pub fn create_container(
        &self,
        id: impl Into<ContainerId>,
        name: impl Into<String>,
        memory_mb: u64,
    ) -> Result<Arc<Container>> {
        let id = id.into();
        let mut containers = self.containers.lock();
        if containers.contains_key(&id) {
            tracing::warn!(%id, "container id already registered");
            return Err(CorralError::DuplicateId { id });
        }

        let container = Arc::new(Container::new(
            id.clone(),
            name,
            memory_mb,
            Arc::clone(&self.observer),
        ));
        let _ = containers.insert(id.clone(), Arc::clone(&container));
        tracing::info!(%id, name = %container.name(), memory_mb, "container created");
        self.emit(&Observation::ContainerCreated {
            name: container.name().to_string(),
        });
        Ok(container)
    }

    /// Looks up a container by id.
    #[must_use]
    pub fn container(&self, id: &ContainerId) -> Option<Arc<Container>> {
        self.containers.lock().get(id).cloned()
    }

    /// Number of registered containers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.lock().len()
    }

    /// Returns whether no container is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.lock().is_empty()
    }

    /// Dispatches the processes of every container.
    ///
    /// Returns the total number of processes dispatched.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime, as
    /// [`Container::start_processes`] does.
    pub fn start_all(&self) -> usize {
        let containers = self.containers.lock();
        let mut dispatched = 0;
        for container in containers.values() {
            self.emit(&Observation::ContainerStarting {
                name: container.name().to_string(),
            });
            dispatched += container.start_processes();
        }
        tracing::info!(containers = containers.len(), dispatched, "all containers started");
        dispatched
    }

    /// Stops the running processes of every container.
    ///
    /// Returns the total number of processes stopped.
    pub fn stop_all(&self) -> usize {
        let containers = self.containers.lock();
        let mut stopped = 0;
        for container in containers.values() {
            self.emit(&Observation::ContainerStopping {
                name: container.name().to_string(),
            });
            stopped += container.stop_processes();
        }
        tracing::info!(containers = containers.len(), stopped, "all containers stopped");
        stopped
    }

    /// Emits the final shutdown line.
    pub fn finish(&self) {
        self.emit(&Observation::AllStopped);
    }

    /// Takes one atomic snapshot of every container, in id order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ContainerSnapshot> {
        self.containers
            .lock()
            .values()
            .map(|c| c.snapshot())
            .collect()
    }

    /// Runs `f` over every container while holding the registry lock.
    ///
    /// `f` must not call back into this kernel.
    pub fn for_each_container(&self, mut f: impl FnMut(&Container)) {
        for container in self.containers.lock().values() {
            f(container);
        }
    }

    /// Runs the monitor loop for `cycles` cycles spaced by `interval`.
    pub async fn monitor(&self, interval: Duration, cycles: u32) -> MonitorReport {
        monitor::run(self, interval, cycles, None).await
    }

    /// Runs the monitor loop until `cycles` is reached or `stop` is raised.
    pub async fn monitor_until(
        &self,
        interval: Duration,
        cycles: u32,
        stop: StopSignal,
    ) -> MonitorReport {
        monitor::run(self, interval, cycles, Some(stop)).await
    }

    /// Passes a logical message from one container to another.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::ContainerNotFound`] naming the first
    /// endpoint that is not registered. Only the messaging error line is
    /// emitted in that case.
    pub fn send_message(
        &self,
        from_id: &ContainerId,
        to_id: &ContainerId,
        text: impl Into<String>,
    ) -> Result<Message> {
        let containers = self.containers.lock();
        let (from, to) = match (containers.get(from_id), containers.get(to_id)) {
            (Some(from), Some(to)) => (from, to),
            (from, _) => {
                let missing = if from.is_none() { from_id } else { to_id };
                tracing::warn!(from = %from_id, to = %to_id, %missing, "message endpoint missing");
                self.emit(&Observation::MessagingError);
                return Err(CorralError::ContainerNotFound {
                    id: missing.clone(),
                });
            }
        };

        let message = Message {
            id: uuid::Uuid::new_v4(),
            from: from.name().to_string(),
            to: to.name().to_string(),
            text: text.into(),
            sent_at: chrono::Utc::now().to_rfc3339(),
        };
        tracing::debug!(id = %message.id, from = %from_id, to = %to_id, "message sent");
        self.emit(&Observation::MessageSent {
            from: message.from.clone(),
            to: message.to.clone(),
            text: message.text.clone(),
        });
        Ok(message)
    }

    /// Waits for every dispatched process task of every container.
    pub async fn join_all(&self) -> Vec<ProcessExit> {
        let containers: Vec<_> = self.containers.lock().values().cloned().collect();
        let mut exits = Vec::new();
        for container in containers {
            exits.extend(container.join().await);
        }
        exits
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(Arc::new(TracingObserver))
    }
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("containers", &*self.containers.lock())
            .finish_non_exhaustive()
    }
}
