use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Error types for cleanup and diagnostics operations
///
/// Deletion failures fall into the four [`DeletionFailureKind`]s; the
/// remaining variants come from configuration and the subprocess diagnostics.
#[derive(Error, Debug)]
pub enum FsError {
	#[error("No such file or directory: {}", path.display())]
	NotFound { path: PathBuf },

	#[error("Directory not empty: {}", path.display())]
	DirectoryNotEmpty { path: PathBuf },

	#[error("IO error: {operation} failed on {} - {source}", path.display())]
	Io {
		operation: String,
		path: PathBuf,
		#[source]
		source: io::Error,
	},

	#[error("File still exists after {waits} waits: {}", path.display())]
	StillExists { path: PathBuf, waits: u32 },

	#[error("Interrupted while deleting {}", path.display())]
	Interrupted { path: PathBuf },

	#[error(transparent)]
	Multiple(Box<FailureList>),

	#[error("System configuration error: {parameter} - {reason}")]
	ConfigurationError { parameter: String, reason: String },

	#[error("Operation timeout: {operation} exceeded {timeout:?}")]
	Timeout { operation: String, timeout: Duration },

	#[error("Worker panicked: {operation} - {details}")]
	WorkerPanicked { operation: String, details: String },

	#[error("Unsupported on this platform: {operation}")]
	Unsupported { operation: String },

	#[error("Configuration loading error: {0}")]
	Config(#[from] Box<figment::Error>),
}

/// Classification of a failed deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionFailureKind {
	NotFound,
	DirectoryNotEmpty,
	IoFailure,
	Interrupted,
}

impl fmt::Display for DeletionFailureKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			DeletionFailureKind::NotFound => "not_found",
			DeletionFailureKind::DirectoryNotEmpty => "directory_not_empty",
			DeletionFailureKind::IoFailure => "io_failure",
			DeletionFailureKind::Interrupted => "interrupted",
		};
		f.write_str(name)
	}
}

impl FsError {
	/// Classify an I/O error raised by `operation` on `path`.
	///
	/// "Not found" and "directory not empty" become their structural variants;
	/// everything else is treated as a transient I/O failure.
	pub fn from_io(operation: &str, path: &Path, err: io::Error) -> Self {
		match err.kind() {
			io::ErrorKind::NotFound => FsError::NotFound { path: path.to_path_buf() },
			io::ErrorKind::DirectoryNotEmpty => {
				FsError::DirectoryNotEmpty { path: path.to_path_buf() }
			}
			_ => FsError::Io {
				operation: operation.to_string(),
				path: path.to_path_buf(),
				source: err,
			},
		}
	}

	/// The deletion failure kind, if this error came from a deletion
	pub fn kind(&self) -> Option<DeletionFailureKind> {
		match self {
			FsError::NotFound { .. } => Some(DeletionFailureKind::NotFound),
			FsError::DirectoryNotEmpty { .. } => Some(DeletionFailureKind::DirectoryNotEmpty),
			FsError::Io { .. } | FsError::StillExists { .. } => {
				Some(DeletionFailureKind::IoFailure)
			}
			FsError::Interrupted { .. } => Some(DeletionFailureKind::Interrupted),
			FsError::Multiple(list) => list.primary().kind(),
			_ => None,
		}
	}

	/// Check if a deletion failing with this error should be attempted again
	pub fn is_retryable(&self) -> bool {
		matches!(self, FsError::Io { .. })
	}

	/// Check if this error belongs to the I/O failure category.
	///
	/// Interruptions are reported in the I/O category for callers that only
	/// distinguish I/O from configuration problems.
	pub fn is_io_class(&self) -> bool {
		self.kind().is_some()
	}

	pub fn is_interrupted(&self) -> bool {
		self.kind() == Some(DeletionFailureKind::Interrupted)
	}

	/// Check if this error is related to configuration issues
	pub fn is_configuration_error(&self) -> bool {
		matches!(self, FsError::ConfigurationError { .. } | FsError::Config(_))
	}

	/// The path this error refers to, if any
	pub fn path(&self) -> Option<&Path> {
		match self {
			FsError::NotFound { path }
			| FsError::DirectoryNotEmpty { path }
			| FsError::Io { path, .. }
			| FsError::StillExists { path, .. }
			| FsError::Interrupted { path } => Some(path),
			FsError::Multiple(list) => list.primary().path(),
			_ => None,
		}
	}

	/// Get error category for logging
	pub fn category(&self) -> &'static str {
		match self {
			FsError::NotFound { .. } => "not_found",
			FsError::DirectoryNotEmpty { .. } => "directory_not_empty",
			FsError::Io { .. } => "io",
			FsError::StillExists { .. } => "io",
			FsError::Interrupted { .. } => "interrupted",
			FsError::Multiple(list) => list.primary().category(),
			FsError::ConfigurationError { .. } => "configuration",
			FsError::Timeout { .. } => "timeout",
			FsError::WorkerPanicked { .. } => "worker",
			FsError::Unsupported { .. } => "unsupported",
			FsError::Config(_) => "configuration",
		}
	}

	/// Create a configuration error
	pub fn configuration_error(parameter: &str, reason: &str) -> Self {
		FsError::ConfigurationError {
			parameter: parameter.to_string(),
			reason: reason.to_string(),
		}
	}

	/// Create a timeout error
	pub fn timeout(operation: &str, timeout: Duration) -> Self {
		FsError::Timeout { operation: operation.to_string(), timeout }
	}

	/// Create an unsupported-platform error
	pub fn unsupported(operation: &str) -> Self {
		FsError::Unsupported { operation: operation.to_string() }
	}

	/// Create an I/O error that is not tied to a single path
	pub fn io(operation: &str, source: io::Error) -> Self {
		FsError::Io {
			operation: operation.to_string(),
			path: PathBuf::new(),
			source,
		}
	}
}

/// A primary failure with later failures attached as suppressed context.
///
/// The primary is always the first failure seen; later failures never
/// replace it.
#[derive(Debug)]
pub struct FailureList {
	primary: FsError,
	suppressed: Vec<FsError>,
}

impl FailureList {
	pub fn new(primary: FsError) -> Self {
		Self { primary, suppressed: Vec::new() }
	}

	/// Build from failures in the order they occurred. Returns `None` when empty.
	pub fn from_failures(failures: impl IntoIterator<Item = FsError>) -> Option<Self> {
		let mut iter = failures.into_iter();
		let mut list = FailureList::new(iter.next()?);
		list.suppressed.extend(iter);
		Some(list)
	}

	/// Attach a later failure
	pub fn suppress(&mut self, error: FsError) {
		self.suppressed.push(error);
	}

	pub fn primary(&self) -> &FsError {
		&self.primary
	}

	pub fn suppressed(&self) -> &[FsError] {
		&self.suppressed
	}

	/// Number of failures, primary included. Never zero.
	#[allow(clippy::len_without_is_empty)]
	pub fn len(&self) -> usize {
		1 + self.suppressed.len()
	}

	pub fn into_parts(self) -> (FsError, Vec<FsError>) {
		(self.primary, self.suppressed)
	}

	/// Collapse into a single error: the bare primary when nothing was suppressed.
	pub fn into_error(self) -> FsError {
		if self.suppressed.is_empty() {
			self.primary
		} else {
			FsError::Multiple(Box::new(self))
		}
	}
}

impl fmt::Display for FailureList {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.primary)?;
		if !self.suppressed.is_empty() {
			write!(f, " ({} suppressed)", self.suppressed.len())?;
		}
		Ok(())
	}
}

impl std::error::Error for FailureList {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		Some(&self.primary)
	}
}

impl From<figment::Error> for FsError {
	fn from(err: figment::Error) -> Self {
		FsError::Config(Box::new(err))
	}
}

pub type Result<T> = std::result::Result<T, FsError>;
