pub mod config;
pub mod delete;
pub mod diagnostics;
mod error;
pub mod interrupt;
pub mod retry;

pub use config::HarnessConfig;
pub use delete::{
	delete_file_if_exists_with_retry, delete_file_tree_unchecked, delete_file_tree_with_retry,
	delete_file_with_retry, FileSystemBackend, RetryingDeleter, StdFileSystem, TreeDeleter,
	TreeDeletionReport,
};
pub use diagnostics::{DiagnosticsConfig, MountChecker, ProcessIntrospector};
pub use error::{DeletionFailureKind, FailureList, FsError, Result};
pub use interrupt::Interrupt;
pub use retry::{RetryPolicy, RetryPolicyBuilder};
