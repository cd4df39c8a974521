use super::backend::{FileSystemBackend, StdFileSystem};
use crate::error::{FailureList, FsError, Result};
use crate::interrupt::Interrupt;
use crate::retry::RetryPolicy;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, warn};

/// Deletes single entries, retrying transient failures per a [`RetryPolicy`]
#[derive(Debug, Clone, Default)]
pub struct RetryingDeleter<B = StdFileSystem> {
	backend: B,
	policy: RetryPolicy,
	interrupt: Interrupt,
}

impl RetryingDeleter<StdFileSystem> {
	/// Create a deleter over the real filesystem
	pub fn new(policy: RetryPolicy) -> Self {
		Self::with_backend(StdFileSystem, policy)
	}
}

impl<B: FileSystemBackend> RetryingDeleter<B> {
	pub fn with_backend(backend: B, policy: RetryPolicy) -> Self {
		Self { backend, policy, interrupt: Interrupt::new() }
	}

	/// Use `interrupt` to cancel backoff sleeps
	pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
		self.interrupt = interrupt;
		self
	}

	pub fn policy(&self) -> &RetryPolicy {
		&self.policy
	}

	pub fn interrupt(&self) -> &Interrupt {
		&self.interrupt
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Delete `path`, retrying if necessary.
	///
	/// # Errors
	///
	/// - [`FsError::NotFound`] if the entry does not exist
	/// - [`FsError::DirectoryNotEmpty`] if it is a directory with contents
	/// - [`FsError::Interrupted`] if the interrupt was raised during a backoff
	/// - the first transient failure, with later ones suppressed, once the
	///   policy's attempts are used up
	pub fn delete_with_retry(&self, path: &Path) -> Result<()> {
		let start_time = Instant::now();
		let mut attempts = 0u32;
		let mut failures: Option<FailureList> = None;

		loop {
			let err = match self.backend.remove(path) {
				Ok(()) => match self.await_absence(path, &mut attempts) {
					Ok(()) => {
						if attempts > 0 {
							debug!(
								"Deleted {} after {} attempts in {:?}",
								path.display(),
								attempts + 1,
								start_time.elapsed()
							);
						}
						return Ok(());
					}
					Err(err @ FsError::StillExists { .. }) => {
						warn!("Gave up waiting for {} to disappear", path.display());
						return Err(record(failures, err).into_error());
					}
					Err(err) => return Err(err),
				},
				Err(io_err) => FsError::from_io("remove", path, io_err),
			};

			if !err.is_retryable() {
				debug!("Delete of {} failed with non-retryable error: {}", path.display(), err);
				return Err(err);
			}

			attempts += 1;
			let list = record(failures.take(), err);
			if attempts > self.policy.max_attempts {
				warn!(
					"Delete of {} failed after {} attempts over {:?}, giving up",
					path.display(),
					attempts,
					start_time.elapsed()
				);
				return Err(list.into_error());
			}

			warn!(
				"Delete of {} failed (attempt {}), retrying in {:?}",
				path.display(),
				attempts,
				self.policy.delay
			);
			failures = Some(list);
			self.backoff(path)?;
		}
	}

	/// Delete `path` if it exists, retrying if necessary.
	///
	/// The existence check is not atomic with the delete: if something else
	/// removes the entry in between, this fails with [`FsError::NotFound`].
	pub fn delete_if_exists_with_retry(&self, path: &Path) -> Result<()> {
		if !self.backend.exists(path) {
			debug!("Skipping delete of absent {}", path.display());
			return Ok(());
		}
		self.delete_with_retry(path)
	}

	/// Poll until the removed entry is confirmed absent. Polls share the
	/// attempt budget with failed removals.
	fn await_absence(&self, path: &Path, attempts: &mut u32) -> Result<()> {
		while !self.backend.not_exists(path) {
			*attempts += 1;
			if *attempts > self.policy.max_attempts {
				return Err(FsError::StillExists { path: path.to_path_buf(), waits: *attempts });
			}
			self.backoff(path)?;
		}
		Ok(())
	}

	fn backoff(&self, path: &Path) -> Result<()> {
		self.interrupt.sleep(self.policy.delay).map_err(|_| {
			warn!("Interrupted while deleting {}", path.display());
			FsError::Interrupted { path: path.to_path_buf() }
		})
	}
}

fn record(failures: Option<FailureList>, err: FsError) -> FailureList {
	match failures {
		Some(mut list) => {
			list.suppress(err);
			list
		}
		None => FailureList::new(err),
	}
}
