//! Cooperative cancellation for blocking deletions
//!
//! A deletion thread sleeps between attempts. Raising the [`Interrupt`] from
//! another thread (a signal handler, a test timeout) wakes that sleep at once
//! and makes the deletion give up instead of retrying.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Returned by [`Interrupt::sleep`] when the wait was cut short
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Shared interrupt flag. Clones observe the same flag.
///
/// Once raised the flag stays set until [`Interrupt::clear`] is called, so
/// every later sleep on the same token fails immediately.
#[derive(Debug, Clone, Default)]
pub struct Interrupt {
	inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
	raised: Mutex<bool>,
	wakeup: Condvar,
}

impl Interrupt {
	pub fn new() -> Self {
		Self::default()
	}

	/// Raise the interrupt, waking any thread sleeping on it
	pub fn interrupt(&self) {
		*self.lock() = true;
		self.inner.wakeup.notify_all();
	}

	pub fn is_interrupted(&self) -> bool {
		*self.lock()
	}

	/// Reset the flag so the token can be reused
	pub fn clear(&self) {
		*self.lock() = false;
	}

	/// Block for `duration` unless interrupted first.
	///
	/// An already raised interrupt fails even for a zero duration.
	pub fn sleep(&self, duration: Duration) -> Result<(), Interrupted> {
		let deadline = Instant::now() + duration;
		let mut raised = self.lock();
		loop {
			if *raised {
				return Err(Interrupted);
			}
			let now = Instant::now();
			if now >= deadline {
				return Ok(());
			}
			raised = match self.inner.wakeup.wait_timeout(raised, deadline - now) {
				Ok((guard, _)) => guard,
				Err(poisoned) => poisoned.into_inner().0,
			};
		}
	}

	fn lock(&self) -> MutexGuard<'_, bool> {
		// The flag is a plain bool; a panic elsewhere cannot leave it inconsistent
		self.inner.raised.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::thread;

	#[test]
	fn test_sleep_completes_without_interrupt() {
		let interrupt = Interrupt::new();
		let start = Instant::now();
		assert_eq!(interrupt.sleep(Duration::from_millis(20)), Ok(()));
		assert!(start.elapsed() >= Duration::from_millis(20));
	}

	#[test]
	fn test_raised_interrupt_fails_zero_sleep() {
		let interrupt = Interrupt::new();
		interrupt.interrupt();
		assert_eq!(interrupt.sleep(Duration::ZERO), Err(Interrupted));

		interrupt.clear();
		assert!(!interrupt.is_interrupted());
		assert_eq!(interrupt.sleep(Duration::ZERO), Ok(()));
	}

	#[test]
	fn test_interrupt_wakes_sleeper() {
		let interrupt = Interrupt::new();
		let sleeper = interrupt.clone();
		let start = Instant::now();
		let handle = thread::spawn(move || sleeper.sleep(Duration::from_secs(30)));

		thread::sleep(Duration::from_millis(50));
		interrupt.interrupt();

		assert_eq!(handle.join().unwrap(), Err(Interrupted));
		assert!(start.elapsed() < Duration::from_secs(10));
	}
}
