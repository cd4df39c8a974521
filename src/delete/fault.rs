//! Fault injection for exercising retry behaviour
//!
//! [`FaultInjectingFs`] wraps another backend and makes selected entries
//! behave like files held open by another process: removals fail with a
//! "resource busy" error, entries linger after removal, or cannot be
//! inspected at all.

use super::backend::{EntryType, FileSystemBackend, StdFileSystem};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Misbehaviour configured for one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
	/// Removal fails this many times, then succeeds
	Transient(u32),
	/// Removal never succeeds
	Permanent,
	/// Removal succeeds but the entry is reported as present for this many polls
	Linger(u32),
	/// Removal fails this many times, then succeeds but the entry is reported
	/// as present for the given number of polls
	TransientThenLinger(u32, u32),
	/// The entry is reported as existing although it is gone, as if removed
	/// by someone else right after the check
	Vanished,
	/// Inspecting the entry fails before any removal is attempted
	Inaccessible,
}

#[derive(Debug, Default)]
struct State {
	faults: HashMap<PathBuf, Fault>,
	removal_attempts: HashMap<PathBuf, u32>,
	absence_polls: HashMap<PathBuf, u32>,
}

/// Backend that injects [`Fault`]s in front of a real backend
#[derive(Debug, Default)]
pub struct FaultInjectingFs<B = StdFileSystem> {
	inner: B,
	state: Mutex<State>,
}

impl<B: FileSystemBackend> FaultInjectingFs<B> {
	pub fn new(inner: B) -> Self {
		Self { inner, state: Mutex::new(State::default()) }
	}

	/// Register a fault for `path`, replacing any earlier one
	pub fn inject(&self, path: impl Into<PathBuf>, fault: Fault) -> &Self {
		self.state().faults.insert(path.into(), fault);
		self
	}

	/// Number of removals attempted on `path`
	pub fn removal_attempts(&self, path: &Path) -> u32 {
		self.state().removal_attempts.get(path).copied().unwrap_or(0)
	}

	/// Number of removals attempted on any path
	pub fn total_removal_attempts(&self) -> u32 {
		self.state().removal_attempts.values().sum()
	}

	fn state(&self) -> MutexGuard<'_, State> {
		self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	fn busy(path: &Path, attempt: u32) -> io::Error {
		io::Error::new(
			io::ErrorKind::ResourceBusy,
			format!("simulated busy handle on {} (attempt {attempt})", path.display()),
		)
	}
}

impl<B: FileSystemBackend> FileSystemBackend for FaultInjectingFs<B> {
	fn entry_type(&self, path: &Path) -> io::Result<EntryType> {
		if self.state().faults.get(path) == Some(&Fault::Inaccessible) {
			return Err(io::Error::new(
				io::ErrorKind::PermissionDenied,
				format!("simulated access failure on {}", path.display()),
			));
		}
		self.inner.entry_type(path)
	}

	fn remove(&self, path: &Path) -> io::Result<()> {
		let (attempt, fault) = {
			let mut state = self.state();
			let attempt = state.removal_attempts.entry(path.to_path_buf()).or_insert(0);
			*attempt += 1;
			let attempt = *attempt;
			(attempt, state.faults.get(path).copied())
		};

		match fault {
			Some(Fault::Permanent) => Err(Self::busy(path, attempt)),
			Some(Fault::Transient(times) | Fault::TransientThenLinger(times, _)) if attempt <= times => {
				Err(Self::busy(path, attempt))
			}
			_ => self.inner.remove(path),
		}
	}

	fn exists(&self, path: &Path) -> bool {
		self.state().faults.get(path) == Some(&Fault::Vanished) || self.inner.exists(path)
	}

	fn not_exists(&self, path: &Path) -> bool {
		let mut state = self.state();
		if let Some(Fault::Linger(polls) | Fault::TransientThenLinger(_, polls)) =
			state.faults.get(path).copied()
		{
			let seen = state.absence_polls.entry(path.to_path_buf()).or_insert(0);
			*seen += 1;
			if *seen <= polls {
				return false;
			}
		}
		drop(state);
		self.inner.not_exists(path)
	}

	fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
		self.inner.read_dir(path)
	}
}
