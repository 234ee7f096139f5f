//! Unified error types for the Corral workspace.
//!
//! Kernel operations that can fail return [`CorralError`]. Messaging
//! failures are reported through this type as well, but callers are free
//! to treat them as non-fatal.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ContainerId;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum CorralError {
    /// A container with the same id is already registered.
    #[error("container id already registered: {id}")]
    DuplicateId {
        /// The colliding container id.
        id: ContainerId,
    },

    /// A process with the same name already exists in the container.
    #[error("process {name} already exists in container {container}")]
    DuplicateProcess {
        /// Container that rejected the process.
        container: ContainerId,
        /// The colliding process name.
        name: String,
    },

    /// A container referenced by id is not in the registry.
    #[error("container not found: {id}")]
    ContainerNotFound {
        /// Identifier that failed to resolve.
        id: ContainerId,
    },

    /// A process action finished with an error.
    #[error("process {process} failed: {message}")]
    ActionFailed {
        /// Name of the failing process.
        process: String,
        /// Description of the failure.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl CorralError {
    /// Builds an [`CorralError::ActionFailed`] for the named process.
    #[must_use]
    pub fn action_failed(process: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ActionFailed {
            process: process.into(),
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, CorralError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_names_the_id() {
        let err = CorralError::DuplicateId {
            id: ContainerId::new("c1"),
        };
        assert_eq!(err.to_string(), "container id already registered: c1");
    }

    #[test]
    fn action_failed_helper_fills_fields() {
        let err = CorralError::action_failed("Worker", "disk full");
        assert_eq!(err.to_string(), "process Worker failed: disk full");
    }

    #[test]
    fn serde_errors_convert() {
        let source = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: CorralError = source.into();
        assert!(matches!(err, CorralError::Serialization { .. }));
    }
}
