//! Mount point accessibility checks
//!
//! A filesystem that has gone away (a stale NFS mount, a dead FUSE daemon)
//! makes `df` hang or fail. Both checks run the configured disk-free program
//! and treat a hang or a non-zero exit as "not accessible".

use super::config::DiagnosticsConfig;
use crate::error::{FsError, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

const STRICT_CHECK: &str = "mount point check";

/// Tracks consecutive lines of disk-free output, skipping the header.
///
/// Lines are compared as raw bytes since mount paths need not be UTF-8.
#[derive(Debug, Default)]
pub struct MountLineTracker {
	header_seen: bool,
	previous: Option<Vec<u8>>,
}

impl MountLineTracker {
	pub fn new() -> Self {
		Self::default()
	}

	/// Feed the next output line, without its line terminator. Returns the
	/// line (lossily decoded) if it repeats the previous one.
	pub fn observe(&mut self, line: &[u8]) -> Option<String> {
		if !self.header_seen {
			self.header_seen = true;
			return None;
		}
		if self.previous.as_deref() == Some(line) {
			return Some(String::from_utf8_lossy(line).into_owned());
		}
		self.previous = Some(line.to_vec());
		None
	}
}

/// First line of disk-free output (header excluded) that repeats the line before it
pub fn find_duplicate_mount_point<I, S>(lines: I) -> Option<String>
where
	I: IntoIterator<Item = S>,
	S: AsRef<[u8]>,
{
	let mut tracker = MountLineTracker::new();
	lines.into_iter().find_map(|line| tracker.observe(line.as_ref()))
}

/// Checks that all mounted filesystems respond
#[derive(Debug, Clone, Default)]
pub struct MountChecker {
	config: DiagnosticsConfig,
}

impl MountChecker {
	pub fn new(config: DiagnosticsConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &DiagnosticsConfig {
		&self.config
	}

	/// Run the disk-free program with inherited output and report whether it
	/// finished successfully within the command timeout.
	///
	/// Always `true` when mount checks are disabled.
	pub async fn check_file_systems_accessible(&self) -> Result<bool> {
		if !self.config.mount_check_enabled {
			return Ok(true);
		}

		let program = &self.config.disk_free_program;
		info!("--- {} output ---", program);
		let mut child = Command::new(program)
			.args(&self.config.disk_free_args)
			.stdin(Stdio::null())
			.stdout(Stdio::inherit())
			.stderr(Stdio::inherit())
			.spawn()
			.map_err(|e| FsError::io(&format!("spawn {program}"), e))?;

		wait_accessible(&mut child, program, self.config.command_timeout).await
	}

	/// Like [`check_file_systems_accessible`](Self::check_file_systems_accessible),
	/// and additionally fails on duplicate consecutive mount points.
	///
	/// The check runs on its own task bounded by the worker timeout. A hung
	/// disk-free process yields `Ok(false)`; a duplicate mount point, a failure
	/// inside the worker, or a worker missing its deadline yields an error.
	pub async fn check_all_mount_points_accessible(&self) -> Result<bool> {
		if !self.config.mount_check_enabled {
			return Ok(true);
		}

		let config = self.config.clone();
		let worker = tokio::spawn(async move { scan_mount_points(&config).await });
		join_worker(worker, self.config.worker_timeout).await
	}
}

/// Wait for the strict check's worker task, mapping a panic or a missed
/// deadline to an error
async fn join_worker(worker: JoinHandle<Result<bool>>, limit: Duration) -> Result<bool> {
	match timeout(limit, worker).await {
		Ok(Ok(result)) => result,
		Ok(Err(join_err)) => {
			error!("Mount point check worker failed: {}", join_err);
			Err(FsError::WorkerPanicked {
				operation: STRICT_CHECK.to_string(),
				details: join_err.to_string(),
			})
		}
		Err(_) => {
			error!("Mount point check worker did not finish within {:?}", limit);
			Err(FsError::timeout(STRICT_CHECK, limit))
		}
	}
}

async fn scan_mount_points(config: &DiagnosticsConfig) -> Result<bool> {
	let program = &config.disk_free_program;
	let mut child = Command::new(program)
		.args(&config.disk_free_args)
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::inherit())
		.spawn()
		.map_err(|e| FsError::io(&format!("spawn {program}"), e))?;

	let stdout = child.stdout.take().ok_or_else(|| {
		FsError::io(
			&format!("read {program} output"),
			std::io::Error::other("stdout was not captured"),
		)
	})?;

	let mut reader = BufReader::new(stdout);
	let mut tracker = MountLineTracker::new();
	let mut line = Vec::new();
	loop {
		line.clear();
		let read = reader
			.read_until(b'\n', &mut line)
			.await
			.map_err(|e| FsError::io(&format!("read {program} output"), e))?;
		if read == 0 {
			break;
		}
		if let Some(mount_point) = tracker.observe(trim_line_end(&line)) {
			return Err(FsError::configuration_error(
				"mount_point",
				&format!("duplicate mount point {mount_point} detected"),
			));
		}
	}

	wait_accessible(&mut child, program, config.command_timeout).await
}

fn trim_line_end(line: &[u8]) -> &[u8] {
	let line = line.strip_suffix(b"\n").unwrap_or(line);
	line.strip_suffix(b"\r").unwrap_or(line)
}

async fn wait_accessible(child: &mut Child, program: &str, limit: Duration) -> Result<bool> {
	match timeout(limit, child.wait()).await {
		Ok(Ok(status)) if status.success() => {
			debug!("{} finished successfully", program);
			Ok(true)
		}
		Ok(Ok(status)) => {
			warn!("{} process exited with {} != 0", program, status);
			Ok(false)
		}
		Ok(Err(e)) => Err(FsError::io(&format!("wait for {program}"), e)),
		Err(_) => {
			warn!("{} command apparently hung", program);
			Ok(false)
		}
	}
}
