//! Console output for kernel observations.
//!
//! Observations go to stdout, one line each, so they can be piped or
//! diffed. Diagnostics stay on stderr through `tracing`.

use std::io::Write;

use corral_runtime::observe::{Observation, Observer};

pub(crate) const BOLD: &str = "\x1b[1m";
pub(crate) const DIM: &str = "\x1b[2m";
pub(crate) const GREEN: &str = "\x1b[32m";
pub(crate) const YELLOW: &str = "\x1b[33m";
pub(crate) const RESET: &str = "\x1b[0m";

/// Writes every observation to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleObserver;

impl Observer for ConsoleObserver {
    fn emit(&self, observation: &Observation) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = writeln!(stdout, "{observation}") {
            tracing::warn!(error = %e, "failed to write observation");
        }
    }
}

/// Formats a megabyte count for the demo summary (e.g. "1.0 GiB").
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn format_megabytes(mb: u64) -> String {
    const GIB: u64 = 1024;

    if mb >= GIB {
        format!("{:.1} GiB", mb as f64 / GIB as f64)
    } else {
        format!("{mb} MiB")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_megabytes_displays_mib() {
        assert_eq!(format_megabytes(512), "512 MiB");
    }

    #[test]
    fn format_megabytes_displays_gib() {
        assert_eq!(format_megabytes(1024), "1.0 GiB");
        assert_eq!(format_megabytes(1536), "1.5 GiB");
    }
}
