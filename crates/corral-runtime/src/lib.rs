//! In-process orchestration kernel for the Corral workspace.
//!
//! A [`Kernel`](kernel::Kernel) owns a registry of
//! [`Container`](container::Container)s, each holding a group of
//! [`Process`](process::Process)es. The kernel starts and stops them,
//! passes logical messages between containers and periodically reports
//! their state through an [`Observer`](observe::Observer).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use corral_runtime::kernel::Kernel;
//! use corral_runtime::observe::TracingObserver;
//!
//! # async fn demo() -> corral_common::error::Result<()> {
//! let kernel = Kernel::new(Arc::new(TracingObserver));
//! let _web = kernel.create_container("c1", "WebServer", 512)?;
//! let _ = kernel.start_all();
//! let _ = kernel.monitor(Duration::from_secs(1), 3).await;
//! let _ = kernel.stop_all();
//! # Ok(())
//! # }
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod container;
pub mod kernel;
pub mod monitor;
pub mod observe;
pub mod process;
pub mod signal;
pub mod simulator;
