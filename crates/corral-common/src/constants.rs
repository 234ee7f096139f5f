//! System-wide constants and defaults.

/// Default delay between two monitor snapshots, in milliseconds.
pub const DEFAULT_MONITOR_INTERVAL_MS: u64 = 1000;

/// Default number of monitor cycles.
pub const DEFAULT_MONITOR_CYCLES: u32 = 5;

/// Default number of resource simulator rounds.
pub const DEFAULT_SIMULATOR_ITERATIONS: u32 = 5;

/// Default delay between two resource simulator rounds, in milliseconds.
pub const DEFAULT_SIMULATOR_INTERVAL_MS: u64 = 1000;

/// Default bound of the memory jitter: deltas are drawn from `[-b, b)`.
pub const DEFAULT_MEMORY_JITTER_MB: u32 = 25;

/// Exclusive upper bound of simulated CPU load percentages.
pub const CPU_LOAD_CEILING: f64 = 100.0;

/// Number of distinct process priority levels (`0..PRIORITY_LEVELS`).
pub const PRIORITY_LEVELS: u8 = 10;

