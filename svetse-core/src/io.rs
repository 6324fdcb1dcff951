use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub(crate) fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds a sibling path by appending a suffix to the full file name.
///
/// Example:
/// `data/brain.bin` + `"prefix3"` → `data/brain.bin.prefix3`
pub(crate) fn sibling_path<P: AsRef<Path>>(path: P, suffix: &str) -> io::Result<PathBuf> {
	let path = path.as_ref();
	let file_name = path
		.file_name()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Path has no filename"))?;

	let mut name = OsString::from(file_name);
	name.push(".");
	name.push(suffix);
	Ok(path.with_file_name(name))
}

/// Replaces the content of `path` with `bytes`.
///
/// The data is written and synced to a fresh temporary file in the same
/// directory, then renamed over the target, so readers only ever see the old
/// or the new file. Each call gets its own temporary file.
pub(crate) fn write_atomic<P: AsRef<Path>>(path: P, bytes: &[u8]) -> io::Result<()> {
	let path = path.as_ref();
	let parent = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};

	let mut file = NamedTempFile::new_in(parent)?;
	file.write_all(bytes)?;
	file.as_file().sync_all()?;
	file.persist(path).map_err(|e| e.error)?;
	Ok(())
}
