//! Retrying deletion of files and directory trees
//!
//! # Module Organization
//!
//! - [`backend`] - The filesystem seam and its `std::fs` implementation
//! - [`fault`] - A backend that injects busy-file failures
//! - [`single`] - Single-entry deletion with retry and absence confirmation
//! - [`tree`] - Post-order tree deletion collecting failures
//!
//! The free functions below use the platform default [`RetryPolicy`].

pub mod backend;
pub mod fault;
pub mod single;
pub mod tree;

pub use backend::{EntryType, FileSystemBackend, StdFileSystem};
pub use fault::{Fault, FaultInjectingFs};
pub use single::RetryingDeleter;
pub use tree::{FailureSummary, ReportSummary, TreeDeleter, TreeDeletionReport};

use crate::error::{FsError, Result};
use crate::retry::RetryPolicy;
use std::path::Path;

/// Delete a file or empty directory, retrying if necessary
pub fn delete_file_with_retry(path: impl AsRef<Path>) -> Result<()> {
	RetryingDeleter::new(RetryPolicy::platform_default()).delete_with_retry(path.as_ref())
}

/// Delete a file or empty directory if it exists, retrying if necessary
pub fn delete_file_if_exists_with_retry(path: impl AsRef<Path>) -> Result<()> {
	RetryingDeleter::new(RetryPolicy::platform_default())
		.delete_if_exists_with_retry(path.as_ref())
}

/// Delete a directory tree, returning the first failure with the rest suppressed
pub fn delete_file_tree_with_retry(dir: impl AsRef<Path>) -> Result<()> {
	tree_deleter().delete_tree_strict(dir.as_ref())
}

/// Delete a directory tree, returning every failure in visitation order
pub fn delete_file_tree_unchecked(dir: impl AsRef<Path>) -> Vec<FsError> {
	tree_deleter().delete_tree(dir.as_ref()).into_failures()
}

fn tree_deleter() -> TreeDeleter {
	TreeDeleter::new(RetryingDeleter::new(RetryPolicy::platform_default()))
}
