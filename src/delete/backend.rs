use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Type of a filesystem entry, read without following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
	File,
	Directory,
	Symlink,
	Other,
}

impl EntryType {
	pub fn is_dir(self) -> bool {
		matches!(self, EntryType::Directory)
	}

	fn from_file_type(file_type: fs::FileType) -> Self {
		if file_type.is_symlink() {
			EntryType::Symlink
		} else if file_type.is_dir() {
			EntryType::Directory
		} else if file_type.is_file() {
			EntryType::File
		} else {
			EntryType::Other
		}
	}
}

/// The filesystem operations the deleters are built on.
///
/// `exists` and `not_exists` are not negations of each other: when the
/// entry's status cannot be determined both return `false`.
pub trait FileSystemBackend: Send + Sync {
	/// Type of the entry at `path`; symlinks are reported as such
	fn entry_type(&self, path: &Path) -> io::Result<EntryType>;

	/// Remove a single entry: an empty directory, a file, or a link
	fn remove(&self, path: &Path) -> io::Result<()>;

	/// True only if the entry is known to exist
	fn exists(&self, path: &Path) -> bool;

	/// True only if the entry is known not to exist
	fn not_exists(&self, path: &Path) -> bool;

	/// Direct children of a directory, sorted by name
	fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// [`FileSystemBackend`] over `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileSystem;

impl FileSystemBackend for StdFileSystem {
	fn entry_type(&self, path: &Path) -> io::Result<EntryType> {
		Ok(EntryType::from_file_type(fs::symlink_metadata(path)?.file_type()))
	}

	fn remove(&self, path: &Path) -> io::Result<()> {
		let file_type = fs::symlink_metadata(path)?.file_type();
		if file_type.is_dir() {
			return fs::remove_dir(path);
		}
		#[cfg(windows)]
		{
			use std::os::windows::fs::FileTypeExt;
			if file_type.is_symlink_dir() {
				return fs::remove_dir(path);
			}
		}
		fs::remove_file(path)
	}

	fn exists(&self, path: &Path) -> bool {
		fs::symlink_metadata(path).is_ok()
	}

	fn not_exists(&self, path: &Path) -> bool {
		matches!(fs::symlink_metadata(path), Err(e) if e.kind() == io::ErrorKind::NotFound)
	}

	fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
		let mut children = fs::read_dir(path)?
			.map(|entry| entry.map(|e| e.path()))
			.collect::<io::Result<Vec<_>>>()?;
		children.sort();
		Ok(children)
	}
}

impl<B: FileSystemBackend + ?Sized> FileSystemBackend for &B {
	fn entry_type(&self, path: &Path) -> io::Result<EntryType> {
		(**self).entry_type(path)
	}

	fn remove(&self, path: &Path) -> io::Result<()> {
		(**self).remove(path)
	}

	fn exists(&self, path: &Path) -> bool {
		(**self).exists(path)
	}

	fn not_exists(&self, path: &Path) -> bool {
		(**self).not_exists(path)
	}

	fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
		(**self).read_dir(path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn test_entry_types() {
		let temp_dir = TempDir::new().expect("Failed to create temp directory");
		let file = temp_dir.path().join("file.txt");
		fs::write(&file, "content").unwrap();

		let backend = StdFileSystem;
		assert_eq!(backend.entry_type(temp_dir.path()).unwrap(), EntryType::Directory);
		assert_eq!(backend.entry_type(&file).unwrap(), EntryType::File);
		assert_eq!(
			backend.entry_type(&temp_dir.path().join("missing")).unwrap_err().kind(),
			io::ErrorKind::NotFound
		);
	}

	#[test]
	fn test_exists_and_not_exists() {
		let temp_dir = TempDir::new().expect("Failed to create temp directory");
		let file = temp_dir.path().join("file.txt");
		let backend = StdFileSystem;

		assert!(!backend.exists(&file));
		assert!(backend.not_exists(&file));

		fs::write(&file, "content").unwrap();
		assert!(backend.exists(&file));
		assert!(!backend.not_exists(&file));
	}

	#[test]
	fn test_remove_file_and_empty_dir() {
		let temp_dir = TempDir::new().expect("Failed to create temp directory");
		let dir = temp_dir.path().join("dir");
		let file = dir.join("file.txt");
		fs::create_dir(&dir).unwrap();
		fs::write(&file, "content").unwrap();

		let backend = StdFileSystem;
		assert_eq!(
			backend.remove(&dir).unwrap_err().kind(),
			io::ErrorKind::DirectoryNotEmpty
		);
		backend.remove(&file).unwrap();
		backend.remove(&dir).unwrap();
		assert!(backend.not_exists(&dir));
	}

	#[cfg(unix)]
	#[test]
	fn test_remove_symlink_keeps_target() {
		let temp_dir = TempDir::new().expect("Failed to create temp directory");
		let target = temp_dir.path().join("target");
		let link = temp_dir.path().join("link");
		fs::create_dir(&target).unwrap();
		fs::write(target.join("kept.txt"), "content").unwrap();
		std::os::unix::fs::symlink(&target, &link).unwrap();

		let backend = StdFileSystem;
		assert_eq!(backend.entry_type(&link).unwrap(), EntryType::Symlink);
		backend.remove(&link).unwrap();
		assert!(backend.not_exists(&link));
		assert!(target.join("kept.txt").exists());
	}

	#[test]
	fn test_read_dir_sorted() {
		let temp_dir = TempDir::new().expect("Failed to create temp directory");
		for name in ["c.txt", "a.txt", "b.txt"] {
			fs::write(temp_dir.path().join(name), name).unwrap();
		}

		let children = StdFileSystem.read_dir(temp_dir.path()).unwrap();
		let names: Vec<_> = children
			.iter()
			.map(|p| p.file_name().unwrap().to_string_lossy().to_string())
			.collect();
		assert_eq!(names, vec!["a.txt", "b.txt", "c.txt"]);
	}
}
