//! Background resource simulator.
//!
//! Perturbs every container's CPU load and memory on a fixed schedule so
//! the monitor has something to show. Jitter values come from an
//! injected [`JitterSource`].

use std::sync::Arc;
use std::time::Duration;

use corral_common::config::SimulatorConfig;
use corral_common::constants::{CPU_LOAD_CEILING, PRIORITY_LEVELS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;

use crate::kernel::Kernel;
use crate::signal::StopSignal;

/// Source of the pseudo-random values used by the simulation.
pub trait JitterSource: Send {
    /// Returns a CPU load percentage in `[0, 100)`.
    fn cpu_load(&mut self) -> f64;

    /// Returns a memory delta in `[-bound, bound)` megabytes.
    fn memory_delta(&mut self, bound: u32) -> i64;

    /// Returns a process priority in `0..PRIORITY_LEVELS`.
    fn priority(&mut self) -> u8;
}

/// [`JitterSource`] backed by a seedable RNG.
#[derive(Debug)]
pub struct RandomJitter {
    rng: StdRng,
}

impl RandomJitter {
    /// Seeds from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeds deterministically.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomJitter {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl JitterSource for RandomJitter {
    fn cpu_load(&mut self) -> f64 {
        self.rng.gen_range(0.0..CPU_LOAD_CEILING)
    }

    fn memory_delta(&mut self, bound: u32) -> i64 {
        let bound = i64::from(bound.max(1));
        self.rng.gen_range(-bound..bound)
    }

    fn priority(&mut self) -> u8 {
        self.rng.gen_range(0..PRIORITY_LEVELS)
    }
}

/// Periodic CPU/memory perturbation over every registered container.
#[derive(Debug, Clone)]
pub struct ResourceSimulator {
    iterations: u32,
    interval: Duration,
    memory_jitter_mb: u32,
}

impl ResourceSimulator {
    /// Creates a simulator from its configuration section.
    #[must_use]
    pub const fn new(config: &SimulatorConfig) -> Self {
        Self {
            iterations: config.iterations,
            interval: config.interval(),
            memory_jitter_mb: config.memory_jitter_mb,
        }
    }

    /// Applies one round to every container under the registry lock.
    pub fn step(&self, kernel: &Kernel, jitter: &mut dyn JitterSource) {
        kernel.for_each_container(|container| {
            container.set_cpu_load(jitter.cpu_load());
            let memory = container.adjust_memory(jitter.memory_delta(self.memory_jitter_mb));
            tracing::trace!(id = %container.id(), memory, "resources perturbed");
        });
    }

    /// Runs every round, sleeping between them. Returns the number of
    /// rounds applied.
    pub async fn run(
        &self,
        kernel: &Kernel,
        mut jitter: Box<dyn JitterSource>,
        mut stop: Option<StopSignal>,
    ) -> u32 {
        let mut applied = 0;
        for _ in 0..self.iterations {
            if stop.as_ref().is_some_and(StopSignal::is_requested) {
                break;
            }
            self.step(kernel, jitter.as_mut());
            applied += 1;

            if let Some(signal) = stop.as_mut() {
                tokio::select! {
                    () = tokio::time::sleep(self.interval) => {}
                    () = signal.requested() => break,
                }
            } else {
                tokio::time::sleep(self.interval).await;
            }
        }
        tracing::debug!(applied, "resource simulator finished");
        applied
    }

    /// Runs the simulator on its own task.
    pub fn spawn(
        self,
        kernel: Arc<Kernel>,
        jitter: Box<dyn JitterSource>,
        stop: Option<StopSignal>,
    ) -> JoinHandle<u32> {
        tokio::spawn(async move { self.run(&kernel, jitter, stop).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::{Observer, RecordingObserver};
    use crate::signal::stop_channel;

    struct Fixed {
        load: f64,
        delta: i64,
    }

    impl JitterSource for Fixed {
        fn cpu_load(&mut self) -> f64 {
            self.load
        }

        fn memory_delta(&mut self, _bound: u32) -> i64 {
            self.delta
        }

        fn priority(&mut self) -> u8 {
            0
        }
    }

    fn kernel() -> Arc<Kernel> {
        let observer: Arc<dyn Observer> = Arc::new(RecordingObserver::new());
        let kernel = Arc::new(Kernel::new(observer));
        let _ = kernel.create_container("c1", "WebServer", 512).expect("c1");
        let _ = kernel.create_container("c2", "Database", 1024).expect("c2");
        kernel
    }

    fn config(iterations: u32) -> SimulatorConfig {
        SimulatorConfig {
            iterations,
            interval_ms: 1,
            memory_jitter_mb: 25,
        }
    }

    #[test]
    fn random_values_stay_in_range() {
        let mut jitter = RandomJitter::seeded(7);
        for _ in 0..1000 {
            let load = jitter.cpu_load();
            assert!((0.0..100.0).contains(&load));
            let delta = jitter.memory_delta(25);
            assert!((-25..25).contains(&delta));
            assert!(jitter.priority() < PRIORITY_LEVELS);
        }
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let mut a = RandomJitter::seeded(42);
        let mut b = RandomJitter::seeded(42);
        for _ in 0..10 {
            assert_eq!(a.memory_delta(25), b.memory_delta(25));
        }
    }

    #[test]
    fn step_rewrites_every_container() {
        let kernel = kernel();
        let sim = ResourceSimulator::new(&config(1));
        let mut jitter = Fixed {
            load: 42.0,
            delta: -12,
        };
        sim.step(&kernel, &mut jitter);

        let rows = kernel.snapshot();
        assert_eq!(rows[0].memory_mb, 500);
        assert_eq!(rows[1].memory_mb, 1012);
        assert!(rows.iter().all(|r| (r.cpu_load - 42.0).abs() < f64::EPSILON));
    }

    #[tokio::test]
    async fn spawned_run_applies_every_iteration() {
        let kernel = kernel();
        let sim = ResourceSimulator::new(&config(4));
        let jitter = Box::new(Fixed {
            load: 10.0,
            delta: 5,
        });

        let applied = sim
            .spawn(Arc::clone(&kernel), jitter, None)
            .await
            .expect("join");

        assert_eq!(applied, 4);
        assert_eq!(kernel.snapshot()[0].memory_mb, 532);
    }

    #[tokio::test]
    async fn stop_signal_ends_run() {
        let kernel = kernel();
        let sim = ResourceSimulator::new(&config(100));
        let (handle, signal) = stop_channel();
        handle.request();

        let applied = sim
            .run(&kernel, Box::new(RandomJitter::seeded(1)), Some(signal))
            .await;
        assert_eq!(applied, 0);
        assert_eq!(kernel.snapshot()[0].memory_mb, 512);
    }
}
