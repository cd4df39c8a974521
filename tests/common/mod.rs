//! Common test utilities for the harness-fs library

#![allow(dead_code)]

use harness_fs::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn setup_temp_dir() -> TempDir {
	TempDir::new().expect("Failed to create temp directory")
}

/// Create a test file with content
pub fn create_test_file(path: &Path, content: &str) -> std::io::Result<()> {
	std::fs::write(path, content)
}

/// Create multiple test files in `dir`
pub fn create_test_files(dir: &Path, count: usize) -> std::io::Result<Vec<PathBuf>> {
	let mut files = Vec::new();
	for i in 0..count {
		let file_path = dir.join(format!("test_file_{i}.txt"));
		create_test_file(&file_path, &format!("Content for file {i}"))?;
		files.push(file_path);
	}
	Ok(files)
}

/// A tree of 3 files, 1 subdirectory and the root directory itself:
/// `root/{one.txt, two.txt, nested/{three.txt}}`
pub struct SmallTree {
	pub root: PathBuf,
	pub files: Vec<PathBuf>,
	pub subdir: PathBuf,
}

impl SmallTree {
	pub fn create(parent: &Path) -> std::io::Result<Self> {
		let root = parent.join("root");
		let subdir = root.join("nested");
		std::fs::create_dir_all(&subdir)?;

		let files = vec![root.join("one.txt"), root.join("two.txt"), subdir.join("three.txt")];
		for file in &files {
			create_test_file(file, "content")?;
		}
		Ok(Self { root, files, subdir })
	}

	/// The nested file
	pub fn nested_file(&self) -> &Path {
		&self.files[2]
	}

	/// Every entry of the tree, root included
	pub fn entries(&self) -> Vec<PathBuf> {
		let mut entries = self.files.clone();
		entries.push(self.subdir.clone());
		entries.push(self.root.clone());
		entries
	}
}

/// Build a deep chain of nested directories, each holding `files_per_level` files
pub fn create_deep_tree(parent: &Path, depth: usize, files_per_level: usize) -> std::io::Result<PathBuf> {
	let root = parent.join("deep");
	let mut current = root.clone();
	for level in 0..depth {
		std::fs::create_dir_all(&current)?;
		create_test_files(&current, files_per_level)?;
		current = current.join(format!("level_{level}"));
	}
	Ok(root)
}

/// Fast retrying policy for tests
pub fn fast_policy(max_attempts: u32) -> RetryPolicy {
	RetryPolicy::new(Duration::from_millis(1), max_attempts)
}

/// Write an executable shell script and return its path
#[cfg(unix)]
pub fn create_script(dir: &Path, name: &str, body: &str) -> std::io::Result<PathBuf> {
	use std::os::unix::fs::PermissionsExt;

	let path = dir.join(name);
	std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
	std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
	Ok(path)
}
