use super::backend::{FileSystemBackend, StdFileSystem};
use super::single::RetryingDeleter;
use crate::error::{DeletionFailureKind, FailureList, FsError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Failures collected while deleting a tree, in the order they happened.
///
/// An empty report means every entry was removed.
#[derive(Debug, Default)]
pub struct TreeDeletionReport {
	failures: Vec<FsError>,
}

impl TreeDeletionReport {
	pub fn is_success(&self) -> bool {
		self.failures.is_empty()
	}

	pub fn is_empty(&self) -> bool {
		self.failures.is_empty()
	}

	pub fn len(&self) -> usize {
		self.failures.len()
	}

	pub fn failures(&self) -> &[FsError] {
		&self.failures
	}

	pub fn iter(&self) -> std::slice::Iter<'_, FsError> {
		self.failures.iter()
	}

	/// Whether the walk stopped early because the interrupt was raised
	pub fn was_interrupted(&self) -> bool {
		self.failures.last().is_some_and(FsError::is_interrupted)
	}

	pub fn failure_kinds(&self) -> Vec<Option<DeletionFailureKind>> {
		self.failures.iter().map(FsError::kind).collect()
	}

	pub fn into_failures(self) -> Vec<FsError> {
		self.failures
	}

	/// The first failure with the others suppressed, or `Ok(())` when empty
	pub fn into_result(self) -> Result<()> {
		match FailureList::from_failures(self.failures) {
			Some(list) => Err(list.into_error()),
			None => Ok(()),
		}
	}

	/// Serializable view of the report
	pub fn summary(&self, root: &Path) -> ReportSummary {
		ReportSummary {
			root: root.to_path_buf(),
			success: self.is_success(),
			interrupted: self.was_interrupted(),
			failures: self
				.failures
				.iter()
				.map(|err| FailureSummary {
					path: err.path().map(Path::to_path_buf),
					kind: err.kind(),
					message: err.to_string(),
				})
				.collect(),
		}
	}

	fn push(&mut self, err: FsError) {
		self.failures.push(err);
	}
}

impl IntoIterator for TreeDeletionReport {
	type Item = FsError;
	type IntoIter = std::vec::IntoIter<FsError>;

	fn into_iter(self) -> Self::IntoIter {
		self.failures.into_iter()
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
	pub root: PathBuf,
	pub success: bool,
	pub interrupted: bool,
	pub failures: Vec<FailureSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureSummary {
	pub path: Option<PathBuf>,
	pub kind: Option<DeletionFailureKind>,
	pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Walk {
	Continue,
	Terminate,
}

/// Deletes directory trees bottom-up with a [`RetryingDeleter`].
///
/// Children are deleted before their parent. A failure on one entry does
/// not stop the walk; an interrupt does.
#[derive(Debug, Clone, Default)]
pub struct TreeDeleter<B = StdFileSystem> {
	deleter: RetryingDeleter<B>,
}

impl<B: FileSystemBackend> TreeDeleter<B> {
	pub fn new(deleter: RetryingDeleter<B>) -> Self {
		Self { deleter }
	}

	pub fn deleter(&self) -> &RetryingDeleter<B> {
		&self.deleter
	}

	/// Delete `root` and everything below it, collecting failures
	pub fn delete_tree(&self, root: &Path) -> TreeDeletionReport {
		let mut report = TreeDeletionReport::default();
		if self.visit(root, &mut report) == Walk::Terminate {
			warn!("Deletion of tree {} interrupted", root.display());
		}

		if report.is_success() {
			debug!("Deleted tree {}", root.display());
		} else {
			info!(
				"Deletion of tree {} finished with {} failures",
				root.display(),
				report.len()
			);
		}
		report
	}

	/// Like [`delete_tree`](Self::delete_tree), but an absent `root` (per the
	/// backend, so a dangling symlink still counts as present) is not a failure
	pub fn delete_tree_if_exists(&self, root: &Path) -> TreeDeletionReport {
		if !self.deleter.backend().exists(root) {
			debug!("Skipping delete of absent tree {}", root.display());
			return TreeDeletionReport::default();
		}
		self.delete_tree(root)
	}

	/// Delete `root` and everything below it.
	///
	/// Returns the first failure encountered, with any later failures attached
	/// as suppressed.
	pub fn delete_tree_strict(&self, root: &Path) -> Result<()> {
		self.delete_tree(root).into_result()
	}

	fn visit(&self, path: &Path, report: &mut TreeDeletionReport) -> Walk {
		let backend = self.deleter.backend();
		let entry_type = match backend.entry_type(path) {
			Ok(entry_type) => entry_type,
			Err(e) => {
				report.push(FsError::from_io("stat", path, e));
				return Walk::Continue;
			}
		};

		if entry_type.is_dir() {
			let children = match backend.read_dir(path) {
				Ok(children) => children,
				Err(e) => {
					report.push(FsError::from_io("read_dir", path, e));
					return Walk::Continue;
				}
			};
			for child in &children {
				if self.visit(child, report) == Walk::Terminate {
					return Walk::Terminate;
				}
			}
		}

		self.delete_entry(path, report)
	}

	fn delete_entry(&self, path: &Path, report: &mut TreeDeletionReport) -> Walk {
		match self.deleter.delete_with_retry(path) {
			Ok(()) => Walk::Continue,
			Err(err) => {
				debug!("Failed to delete {}: {}", path.display(), err);
				let walk = if err.is_interrupted() {
					Walk::Terminate
				} else {
					Walk::Continue
				};
				report.push(err);
				walk
			}
		}
	}
}
