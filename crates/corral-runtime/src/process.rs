//! Processes and the runnable capability they execute.
//!
//! A [`Process`] is created in the `Running` state and leaves it exactly
//! once: to `Completed` when its action returns, to `Failed` when the
//! action errors or panics, or to `Stopped` when its container is asked
//! to stop. Any later transition request is rejected.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use corral_common::constants::PRIORITY_LEVELS;
use corral_common::error::{CorralError, Result};
use corral_common::types::ProcessState;
use serde::Serialize;

use crate::observe::{Observation, Observer};
use crate::signal::{StopHandle, StopSignal, stop_channel};

/// Unit of work executed by a process.
///
/// Implementors should poll [`ProcessContext::is_stop_requested`] or
/// await [`ProcessContext::stop_requested`] to honour cooperative
/// cancellation; the kernel never aborts a running action.
#[async_trait]
pub trait Runnable: Send + Sync {
    /// Runs the action to completion.
    ///
    /// # Errors
    ///
    /// An error marks the owning process as `Failed`.
    async fn execute(&self, ctx: ProcessContext) -> Result<()>;
}

/// Everything an action receives from the kernel.
pub struct ProcessContext {
    name: String,
    stop: StopSignal,
    observer: Arc<dyn Observer>,
}

impl ProcessContext {
    /// Name of the process being executed.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the owning container asked this process to stop.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.stop.is_requested()
    }

    /// Resolves once the owning container asks this process to stop.
    pub async fn stop_requested(&mut self) {
        self.stop.requested().await;
    }

    /// Emits an observation through the kernel's sink.
    pub fn emit(&self, observation: &Observation) {
        self.observer.emit(observation);
    }

    /// Builds an [`CorralError::ActionFailed`] for this process.
    #[must_use]
    pub fn fail(&self, message: impl Into<String>) -> CorralError {
        CorralError::action_failed(self.name.clone(), message)
    }
}

impl fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessContext")
            .field("name", &self.name)
            .field("stop_requested", &self.stop.is_requested())
            .finish_non_exhaustive()
    }
}

/// A named unit of work owned by a container.
pub struct Process {
    name: String,
    priority: u8,
    action: Arc<dyn Runnable>,
    state: ProcessState,
    dispatched: bool,
    stop: StopHandle,
}

impl Process {
    /// Creates a process in the `Running` state.
    ///
    /// `priority` is informational and clamped to `0..PRIORITY_LEVELS`.
    #[must_use]
    pub fn new(name: impl Into<String>, priority: u8, action: impl Runnable + 'static) -> Self {
        Self::with_action(name, priority, Arc::new(action))
    }

    /// Creates a process around an already shared action.
    #[must_use]
    pub fn with_action(name: impl Into<String>, priority: u8, action: Arc<dyn Runnable>) -> Self {
        let (stop, _) = stop_channel();
        Self {
            name: name.into(),
            priority: priority.min(PRIORITY_LEVELS - 1),
            action,
            state: ProcessState::Running,
            dispatched: false,
            stop,
        }
    }

    /// Process name, unique within its container.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Informational priority.
    #[must_use]
    pub const fn priority(&self) -> u8 {
        self.priority
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ProcessState {
        self.state
    }

    /// Returns a read-only snapshot of this process.
    #[must_use]
    pub fn info(&self) -> ProcessInfo {
        ProcessInfo {
            name: self.name.clone(),
            priority: self.priority,
            state: self.state,
        }
    }

    /// Applies a lifecycle transition. Returns `false`, leaving the state
    /// unchanged, when the move is not allowed.
    pub(crate) fn transition(&mut self, next: ProcessState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::debug!(
                process = %self.name,
                from = %self.state,
                to = %next,
                "transition rejected"
            );
            return false;
        }
        tracing::debug!(process = %self.name, from = %self.state, to = %next, "transition");
        self.state = next;
        true
    }

    /// Resets a process being adopted by a container.
    pub(crate) fn adopt(&mut self) {
        self.state = ProcessState::Running;
        self.dispatched = false;
    }

    /// Moves a running process to `Stopped` and raises its stop signal.
    pub(crate) fn stop(&mut self) -> bool {
        if !self.transition(ProcessState::Stopped) {
            return false;
        }
        self.stop.request();
        true
    }

    /// Marks the process as dispatched and hands out what its task needs.
    ///
    /// Returns `None` when the process is not running or was already
    /// dispatched.
    pub(crate) fn dispatch(
        &mut self,
        observer: &Arc<dyn Observer>,
    ) -> Option<(Arc<dyn Runnable>, ProcessContext)> {
        if self.state != ProcessState::Running || self.dispatched {
            return None;
        }
        self.dispatched = true;
        let ctx = ProcessContext {
            name: self.name.clone(),
            stop: self.stop.signal(),
            observer: Arc::clone(observer),
        };
        Some((Arc::clone(&self.action), ctx))
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("state", &self.state)
            .field("dispatched", &self.dispatched)
            .finish_non_exhaustive()
    }
}

/// Read-only view of a process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessInfo {
    /// Process name.
    pub name: String,
    /// Informational priority.
    pub priority: u8,
    /// Lifecycle state at snapshot time.
    pub state: ProcessState,
}

/// Final outcome of one dispatched process, as observed by `join`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    /// Process name.
    pub name: String,
    /// State after the action's task ended.
    pub state: ProcessState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::RecordingObserver;

    struct Noop;

    #[async_trait]
    impl Runnable for Noop {
        async fn execute(&self, _ctx: ProcessContext) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn new_process_is_running() {
        let p = Process::new("worker", 3, Noop);
        assert_eq!(p.state(), ProcessState::Running);
        assert_eq!(p.priority(), 3);
        assert_eq!(p.name(), "worker");
    }

    #[test]
    fn priority_is_clamped() {
        let p = Process::new("worker", 200, Noop);
        assert_eq!(p.priority(), PRIORITY_LEVELS - 1);
    }

    #[test]
    fn completed_cannot_be_stopped() {
        let mut p = Process::new("worker", 0, Noop);
        assert!(p.transition(ProcessState::Completed));
        assert!(!p.stop());
        assert_eq!(p.state(), ProcessState::Completed);
    }

    #[test]
    fn stopped_cannot_complete() {
        let mut p = Process::new("worker", 0, Noop);
        assert!(p.stop());
        assert!(!p.transition(ProcessState::Completed));
        assert_eq!(p.state(), ProcessState::Stopped);
    }

    #[test]
    fn stop_raises_the_context_signal() {
        let observer: Arc<dyn Observer> = Arc::new(RecordingObserver::new());
        let mut p = Process::new("worker", 0, Noop);
        let (_, ctx) = p.dispatch(&observer).expect("dispatchable");
        assert!(!ctx.is_stop_requested());

        assert!(p.stop());
        assert!(ctx.is_stop_requested());
    }

    #[test]
    fn dispatch_happens_once() {
        let observer: Arc<dyn Observer> = Arc::new(RecordingObserver::new());
        let mut p = Process::new("worker", 0, Noop);
        assert!(p.dispatch(&observer).is_some());
        assert!(p.dispatch(&observer).is_none());
    }

    #[test]
    fn stopped_process_is_not_dispatched() {
        let observer: Arc<dyn Observer> = Arc::new(RecordingObserver::new());
        let mut p = Process::new("worker", 0, Noop);
        assert!(p.stop());
        assert!(p.dispatch(&observer).is_none());
    }

    #[test]
    fn context_fail_names_the_process() {
        let observer: Arc<dyn Observer> = Arc::new(RecordingObserver::new());
        let mut p = Process::new("Backup", 0, Noop);
        let (_, ctx) = p.dispatch(&observer).expect("dispatchable");
        let err = ctx.fail("tape missing");
        assert_eq!(err.to_string(), "process Backup failed: tape missing");
    }
}
