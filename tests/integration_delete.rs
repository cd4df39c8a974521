// Integration tests for single-entry deletion through the public API

use harness_fs::delete::{Fault, FaultInjectingFs};
use harness_fs::{
	delete_file_if_exists_with_retry, delete_file_with_retry, DeletionFailureKind, FsError,
	Interrupt, RetryPolicy, RetryingDeleter, StdFileSystem,
};
use std::thread;
use std::time::{Duration, Instant};

mod common;

#[test]
fn test_if_exists_on_absent_path_is_noop() {
	let temp_dir = common::setup_temp_dir();
	let missing = temp_dir.path().join("never_created.txt");

	delete_file_if_exists_with_retry(&missing).unwrap();
	delete_file_if_exists_with_retry(&missing).unwrap();
}

#[test]
fn test_if_exists_twice_after_delete() {
	let temp_dir = common::setup_temp_dir();
	let file = temp_dir.path().join("file.txt");
	common::create_test_file(&file, "content").unwrap();

	delete_file_if_exists_with_retry(&file).unwrap();
	assert!(!file.exists());
	delete_file_if_exists_with_retry(&file).unwrap();
}

#[test]
fn test_strict_delete_of_absent_path() {
	let temp_dir = common::setup_temp_dir();
	let missing = temp_dir.path().join("never_created.txt");

	match delete_file_with_retry(&missing).unwrap_err() {
		FsError::NotFound { path } => assert_eq!(path, missing),
		other => panic!("Expected NotFound error, got: {other:?}"),
	}
}

#[test]
fn test_non_empty_directory_keeps_contents() {
	let temp_dir = common::setup_temp_dir();
	let files = common::create_test_files(temp_dir.path(), 3).unwrap();

	let err = delete_file_with_retry(temp_dir.path()).unwrap_err();
	assert_eq!(err.kind(), Some(DeletionFailureKind::DirectoryNotEmpty));
	for file in &files {
		assert!(file.exists(), "{} should survive", file.display());
	}
}

#[test]
fn test_empty_directory_deleted() {
	let temp_dir = common::setup_temp_dir();
	let dir = temp_dir.path().join("empty");
	std::fs::create_dir(&dir).unwrap();

	delete_file_with_retry(&dir).unwrap();
	assert!(!dir.exists());
}

#[test]
fn test_transient_failures_below_limit() {
	let temp_dir = common::setup_temp_dir();
	let file = temp_dir.path().join("busy.txt");

	for transient in 0..4 {
		common::create_test_file(&file, "content").unwrap();
		let backend = FaultInjectingFs::new(StdFileSystem);
		backend.inject(&file, Fault::Transient(transient));
		let deleter = RetryingDeleter::with_backend(&backend, common::fast_policy(4));

		deleter.delete_with_retry(&file).unwrap();
		assert_eq!(backend.removal_attempts(&file), transient + 1);
		assert!(!file.exists());
	}
}

#[test]
fn test_always_failing_makes_max_plus_one_attempts() {
	let temp_dir = common::setup_temp_dir();
	let file = temp_dir.path().join("locked.txt");
	common::create_test_file(&file, "content").unwrap();

	let backend = FaultInjectingFs::new(StdFileSystem);
	backend.inject(&file, Fault::Permanent);
	let deleter = RetryingDeleter::with_backend(&backend, common::fast_policy(5));

	let err = deleter.delete_with_retry(&file).unwrap_err();
	assert_eq!(backend.removal_attempts(&file), 6);

	let FsError::Multiple(list) = err else {
		panic!("Expected Multiple error");
	};
	assert!(list.primary().to_string().contains("(attempt 1)"));
	assert_eq!(list.suppressed().len(), 5);
	assert!(file.exists());
}

#[test]
fn test_interrupt_stops_retrying_promptly() {
	let temp_dir = common::setup_temp_dir();
	let file = temp_dir.path().join("locked.txt");
	common::create_test_file(&file, "content").unwrap();

	let backend = FaultInjectingFs::new(StdFileSystem);
	backend.inject(&file, Fault::Permanent);
	let interrupt = Interrupt::new();
	let deleter =
		RetryingDeleter::with_backend(backend, RetryPolicy::new(Duration::from_secs(5), 15))
			.with_interrupt(interrupt.clone());

	let start = Instant::now();
	let worker = thread::spawn(move || {
		let result = deleter.delete_with_retry(&file);
		(result, deleter.backend().total_removal_attempts())
	});
	thread::sleep(Duration::from_millis(100));
	interrupt.interrupt();

	let (result, attempts) = worker.join().unwrap();
	let err = result.unwrap_err();
	assert!(err.is_interrupted());
	assert_eq!(err.kind(), Some(DeletionFailureKind::Interrupted));
	assert_eq!(attempts, 1);
	assert!(start.elapsed() < Duration::from_secs(4));
}
