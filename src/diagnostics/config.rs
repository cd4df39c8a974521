use crate::error::{FsError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the subprocess-based diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
	/// Whether mount checks run at all; off on Windows, where they always pass
	pub mount_check_enabled: bool,
	/// Disk-free reporter producing one line per mount point after a header
	pub disk_free_program: String,
	pub disk_free_args: Vec<String>,
	/// How long the disk-free process may run before it counts as hung
	#[serde(with = "humantime_serde")]
	pub command_timeout: Duration,
	/// Hard limit for the strict mount check worker
	#[serde(with = "humantime_serde")]
	pub worker_timeout: Duration,
	/// Directories searched, in order, for an executable `lsof`
	pub lsof_search_dirs: Vec<PathBuf>,
	#[serde(with = "humantime_serde")]
	pub lsof_timeout: Duration,
}

impl Default for DiagnosticsConfig {
	fn default() -> Self {
		Self {
			mount_check_enabled: !cfg!(windows),
			disk_free_program: "df".to_string(),
			disk_free_args: Vec::new(),
			command_timeout: Duration::from_secs(90),
			worker_timeout: Duration::from_secs(120),
			lsof_search_dirs: vec![PathBuf::from("/usr/bin"), PathBuf::from("/usr/sbin")],
			lsof_timeout: Duration::from_secs(10),
		}
	}
}

impl DiagnosticsConfig {
	/// Validate the configuration and return errors if invalid
	pub fn validate(&self) -> Result<()> {
		if self.mount_check_enabled && self.disk_free_program.trim().is_empty() {
			return Err(FsError::configuration_error(
				"disk_free_program",
				"must not be empty when mount checks are enabled",
			));
		}

		if self.worker_timeout < self.command_timeout {
			return Err(FsError::configuration_error(
				"worker_timeout",
				&format!(
					"{:?} is shorter than command_timeout {:?}",
					self.worker_timeout, self.command_timeout
				),
			));
		}

		Ok(())
	}
}
