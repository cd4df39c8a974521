// Open handle counting. Kept in its own test binary so no other test opens
// files concurrently.
#![cfg(target_os = "linux")]

use harness_fs::ProcessIntrospector;
use std::fs::File;

mod common;

#[test]
fn test_open_handle_count_tracks_open_files() {
	let temp_dir = common::setup_temp_dir();
	let files = common::create_test_files(temp_dir.path(), 5).unwrap();
	let introspector = ProcessIntrospector::default();

	let before = introspector.open_handle_count().unwrap();
	let handles: Vec<File> = files.iter().map(|f| File::open(f).unwrap()).collect();
	let during = introspector.open_handle_count().unwrap();
	drop(handles);
	let after = introspector.open_handle_count().unwrap();

	assert!(before > 0);
	assert!(during >= before + 5, "before: {before}, during: {during}");
	assert!(after + 5 <= during, "during: {during}, after: {after}");
}
