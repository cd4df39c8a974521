//! Subprocess-based diagnostics for the harness
//!
//! - [`config`] - Programs, search paths and timeouts
//! - [`mounts`] - Mount point accessibility checks via `df`
//! - [`descriptors`] - Open descriptor listing via `lsof` and handle counts

pub mod config;
pub mod descriptors;
pub mod mounts;

pub use config::DiagnosticsConfig;
pub use descriptors::ProcessIntrospector;
pub use mounts::{find_duplicate_mount_point, MountChecker, MountLineTracker};
