//! Open file descriptor and handle introspection for the current process

use super::config::DiagnosticsConfig;
use crate::error::{FsError, Result};
use once_cell::sync::OnceCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

static HANDLE_COUNTER: OnceCell<HandleCounter> = OnceCell::new();

/// Where open handles are counted from. Resolved once per process.
#[derive(Debug)]
enum HandleCounter {
	#[cfg(windows)]
	Native,
	/// A directory with one entry per open descriptor
	FdDirectory(PathBuf),
	#[cfg_attr(windows, allow(dead_code))]
	Unsupported,
}

impl HandleCounter {
	fn get() -> &'static HandleCounter {
		HANDLE_COUNTER.get_or_init(|| {
			let counter = Self::resolve();
			info!("Resolved open handle counter: {:?}", counter);
			counter
		})
	}

	#[cfg(windows)]
	fn resolve() -> Self {
		HandleCounter::Native
	}

	#[cfg(not(windows))]
	fn resolve() -> Self {
		["/proc/self/fd", "/dev/fd"]
			.into_iter()
			.map(Path::new)
			.find(|dir| dir.is_dir())
			.map(|dir| HandleCounter::FdDirectory(dir.to_path_buf()))
			.unwrap_or(HandleCounter::Unsupported)
	}

	fn count(&self) -> Result<u64> {
		match self {
			#[cfg(windows)]
			HandleCounter::Native => native::process_handle_count(),
			HandleCounter::FdDirectory(dir) => {
				let entries = fs::read_dir(dir)
					.map_err(|e| FsError::from_io("read_dir", dir, e))?
					.count();
				// The listing itself holds one descriptor
				Ok(entries.saturating_sub(1) as u64)
			}
			HandleCounter::Unsupported => Err(FsError::unsupported("open handle count")),
		}
	}
}

#[cfg(windows)]
mod native {
	use crate::error::{FsError, Result};
	use windows_sys::Win32::System::Threading::{GetCurrentProcess, GetProcessHandleCount};

	pub(super) fn process_handle_count() -> Result<u64> {
		let mut count: u32 = 0;
		// SAFETY: the current-process pseudo handle needs no closing and `count`
		// outlives the call.
		let ok = unsafe { GetProcessHandleCount(GetCurrentProcess(), &mut count) };
		if ok == 0 {
			return Err(FsError::io("GetProcessHandleCount", std::io::Error::last_os_error()));
		}
		Ok(u64::from(count))
	}
}

/// Reports on the open files and handles of the current process
#[derive(Debug, Clone, Default)]
pub struct ProcessIntrospector {
	config: DiagnosticsConfig,
}

impl ProcessIntrospector {
	pub fn new(config: DiagnosticsConfig) -> Self {
		Self { config }
	}

	/// First executable `lsof` in the configured search directories
	pub fn find_lsof(&self) -> Option<PathBuf> {
		self.config
			.lsof_search_dirs
			.iter()
			.map(|dir| dir.join("lsof"))
			.find(|candidate| is_executable(candidate))
	}

	/// Write the `lsof` listing for this process to `sink`.
	///
	/// Does nothing when no `lsof` is installed. Output from both of the
	/// listing's streams is copied to `sink` as it arrives. A process that
	/// outlives the lsof timeout is logged and left running.
	pub async fn list_open_file_descriptors<W>(&self, sink: &mut W) -> Result<()>
	where
		W: Write + Send + ?Sized,
	{
		let Some(lsof) = self.find_lsof() else {
			debug!("No lsof found in {:?}, skipping", self.config.lsof_search_dirs);
			return Ok(());
		};

		let write_err = |e| FsError::io("write descriptor listing", e);
		writeln!(sink, "Open File Descriptors:").map_err(write_err)?;

		let pid = std::process::id();
		let mut child = Command::new(&lsof)
			.arg("-p")
			.arg(pid.to_string())
			.stdin(Stdio::null())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| FsError::from_io("spawn", &lsof, e))?;

		let read_err = |e| FsError::from_io("read output of", &lsof, e);
		if let (Some(mut stdout), Some(mut stderr)) = (child.stdout.take(), child.stderr.take()) {
			let mut out_buf = [0u8; 8192];
			let mut err_buf = [0u8; 8192];
			let (mut out_open, mut err_open) = (true, true);
			while out_open || err_open {
				tokio::select! {
					read = stdout.read(&mut out_buf), if out_open => {
						match read.map_err(read_err)? {
							0 => out_open = false,
							n => sink.write_all(&out_buf[..n]).map_err(write_err)?,
						}
					}
					read = stderr.read(&mut err_buf), if err_open => {
						match read.map_err(read_err)? {
							0 => err_open = false,
							n => sink.write_all(&err_buf[..n]).map_err(write_err)?,
						}
					}
				}
			}
		}

		match timeout(self.config.lsof_timeout, child.wait()).await {
			Ok(Ok(status)) => debug!("lsof finished with {}", status),
			Ok(Err(e)) => return Err(FsError::from_io("wait for", &lsof, e)),
			Err(_) => warn!("lsof did not exit within {:?}", self.config.lsof_timeout),
		}

		writeln!(sink).map_err(write_err)?;
		Ok(())
	}

	/// Number of open handles (Windows) or file descriptors (Unix) of this process
	pub fn open_handle_count(&self) -> Result<u64> {
		HandleCounter::get().count()
	}
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
	use std::os::unix::fs::PermissionsExt;
	fs::metadata(path)
		.map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
		.unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
	path.is_file()
}
