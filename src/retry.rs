//! Retry policy for deletions that can transiently fail
//!
//! Some platforms report a file as busy while another process (a virus
//! scanner, an indexer, a child that has not yet exited) still holds a handle
//! to it. On those platforms deletions are retried with a fixed delay; on
//! others the policy is zero and the first failure is terminal.

use crate::error::{FsError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[cfg(windows)]
const PLATFORM_RETRY_DELAY: Duration = Duration::from_millis(500);
#[cfg(windows)]
const PLATFORM_MAX_ATTEMPTS: u32 = 15;

#[cfg(not(windows))]
const PLATFORM_RETRY_DELAY: Duration = Duration::ZERO;
#[cfg(not(windows))]
const PLATFORM_MAX_ATTEMPTS: u32 = 0;

/// How long to wait between attempts and how many extra attempts to make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	/// Delay slept between attempts
	#[serde(with = "humantime_serde")]
	pub delay: Duration,
	/// Number of retries after the first attempt; 0 makes the first failure terminal
	pub max_attempts: u32,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self::platform_default()
	}
}

impl RetryPolicy {
	pub const fn new(delay: Duration, max_attempts: u32) -> Self {
		Self { delay, max_attempts }
	}

	/// The policy for the current platform: 500ms x 15 on Windows, none elsewhere
	pub const fn platform_default() -> Self {
		Self::new(PLATFORM_RETRY_DELAY, PLATFORM_MAX_ATTEMPTS)
	}

	/// A single attempt, no waiting
	pub const fn none() -> Self {
		Self::new(Duration::ZERO, 0)
	}

	/// Whether a failed attempt may be followed by another one
	pub fn retries(&self) -> bool {
		self.max_attempts > 0
	}

	/// Upper bound on the time spent sleeping for a single entry
	pub fn max_total_delay(&self) -> Duration {
		self.delay.saturating_mul(self.max_attempts)
	}

	/// Validate the policy
	pub fn validate(&self) -> Result<()> {
		if self.max_attempts > 0 && self.max_total_delay() > Duration::from_secs(3600) {
			return Err(FsError::configuration_error(
				"retry",
				&format!(
					"total retry delay {:?} exceeds one hour",
					self.max_total_delay()
				),
			));
		}
		Ok(())
	}
}

/// A builder for creating retry policies
#[derive(Debug)]
pub struct RetryPolicyBuilder {
	policy: RetryPolicy,
}

impl RetryPolicyBuilder {
	/// Create a new builder starting from the platform default
	pub fn new() -> Self {
		Self { policy: RetryPolicy::platform_default() }
	}

	/// Set the maximum number of retry attempts
	pub fn max_attempts(mut self, max_attempts: u32) -> Self {
		self.policy.max_attempts = max_attempts;
		self
	}

	/// Set the delay between attempts
	pub fn delay(mut self, delay: Duration) -> Self {
		self.policy.delay = delay;
		self
	}

	/// Build the policy
	pub fn build(self) -> RetryPolicy {
		self.policy
	}
}

impl Default for RetryPolicyBuilder {
	fn default() -> Self {
		Self::new()
	}
}
