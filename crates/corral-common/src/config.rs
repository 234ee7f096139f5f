//! Global configuration model for the Corral kernel.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{CorralError, Result};

/// Root configuration for a kernel run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorralConfig {
    /// Monitor loop settings.
    pub monitor: MonitorConfig,
    /// Resource simulator settings.
    pub simulator: SimulatorConfig,
}

/// Settings of the periodic monitor loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between two snapshots, in milliseconds.
    pub interval_ms: u64,
    /// Number of snapshot cycles to run.
    pub cycles: u32,
}

impl MonitorConfig {
    /// Returns the snapshot interval as a [`Duration`].
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: constants::DEFAULT_MONITOR_INTERVAL_MS,
            cycles: constants::DEFAULT_MONITOR_CYCLES,
        }
    }
}

/// Settings of the background resource simulator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Number of perturbation rounds.
    pub iterations: u32,
    /// Delay between two rounds, in milliseconds.
    pub interval_ms: u64,
    /// Memory deltas are drawn from `[-memory_jitter_mb, memory_jitter_mb)`.
    pub memory_jitter_mb: u32,
}

impl SimulatorConfig {
    /// Returns the round interval as a [`Duration`].
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            iterations: constants::DEFAULT_SIMULATOR_ITERATIONS,
            interval_ms: constants::DEFAULT_SIMULATOR_INTERVAL_MS,
            memory_jitter_mb: constants::DEFAULT_MEMORY_JITTER_MB,
        }
    }
}

impl CorralConfig {
    /// Loads a configuration from a JSON file. Missing fields take
    /// their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON,
    /// or holds invalid values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CorralError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`CorralError::Config`] when the memory jitter bound is zero.
    pub fn validate(&self) -> Result<()> {
        if self.simulator.memory_jitter_mb == 0 {
            return Err(CorralError::Config {
                message: "simulator.memory_jitter_mb must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
