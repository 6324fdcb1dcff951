use std::fs::{self, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{error, info, warn};

use crate::error::{Result, SvetseError};
use crate::io::{sibling_path, write_atomic};
use crate::model::chain::Chain;
use crate::model::snapshot::Snapshot;

/// Default interval between two snapshots.
pub const SAVE_INTERVAL: Duration = Duration::from_secs(10);

/// The bot's durable memory: a snapshot file and the chain restored from it.
///
/// # Behavior
/// - Opening never fails because of the file's *content*: a missing, empty,
///   corrupt or incompatible snapshot yields a fresh chain.
/// - Opening fails if the location itself cannot be opened or created.
/// - Saving rewrites the whole file atomically.
#[derive(Debug)]
pub struct Brain {
	path: PathBuf,
	chain: Arc<Chain>,
	/// Held for the whole of `save`, so snapshots land on disk in the order
	/// they were taken.
	saving: Mutex<()>,
}

impl Brain {
	/// Opens (or creates) the brain stored at `path`.
	///
	/// A snapshot written with another prefix length is moved aside to
	/// `<path>.prefix<N>` (or `<path>.prefix<N>.<i>` if that is taken) and a
	/// fresh chain is started, so no old model is ever overwritten.
	///
	/// # Errors
	/// `SvetseError::Store` if the file cannot be opened/created, or if an
	/// incompatible snapshot cannot be moved aside.
	pub fn open<P: AsRef<Path>>(path: P, prefix_len: usize) -> Result<Self> {
		let path = path.as_ref().to_path_buf();
		let store_error = |source| SvetseError::Store { path: path.clone(), source };

		let mut file = OpenOptions::new()
			.read(true)
			.write(true)
			.create(true)
			.truncate(false)
			.open(&path)
			.map_err(store_error)?;

		let mut bytes = Vec::new();
		if let Err(e) = file.read_to_end(&mut bytes) {
			warn!("Could not read brain {}: {e}", path.display());
			bytes.clear();
		}
		drop(file);

		let chain = Self::restore(&path, &bytes, prefix_len).map_err(store_error)?;
		Ok(Self { path, chain: Arc::new(chain), saving: Mutex::new(()) })
	}

	fn restore(path: &Path, bytes: &[u8], prefix_len: usize) -> std::io::Result<Chain> {
		if bytes.is_empty() {
			info!("Generating new brain");
			return Ok(Chain::new(prefix_len));
		}

		let snapshot = match Snapshot::from_bytes(bytes) {
			Ok(snapshot) => snapshot,
			Err(e) => {
				warn!("Could not load brain {}: {e}", path.display());
				info!("Generating new brain");
				return Ok(Chain::new(prefix_len));
			}
		};

		if snapshot.prefix_len != prefix_len {
			let backup = backup_path(path, snapshot.prefix_len)?;
			fs::rename(path, &backup)?;
			warn!(
				"Brain {} was built with prefix {}, configured prefix is {}; moved it to {}",
				path.display(),
				snapshot.prefix_len,
				prefix_len,
				backup.display()
			);
			info!("Generating new brain");
			return Ok(Chain::new(prefix_len));
		}

		let chain = Chain::from_snapshot(snapshot);
		info!("Loaded brain {} ({} prefixes)", path.display(), chain.len());
		Ok(chain)
	}

	/// Shared handle on the chain.
	pub fn chain(&self) -> Arc<Chain> {
		Arc::clone(&self.chain)
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Writes a full snapshot of the chain to disk.
	///
	/// The chain is copied under its read lock, then encoded and written
	/// without holding it. Concurrent saves run one after the other.
	pub fn save(&self) -> Result<()> {
		let _saving = self.saving.lock().unwrap_or_else(PoisonError::into_inner);
		let bytes = self.chain.snapshot().to_bytes()?;
		write_atomic(&self.path, &bytes)?;
		Ok(())
	}
}

/// First free `<path>.prefix<N>[.<i>]` name.
fn backup_path(path: &Path, prefix_len: usize) -> std::io::Result<PathBuf> {
	let base = format!("prefix{prefix_len}");
	let mut candidate = sibling_path(path, &base)?;
	let mut index = 1;
	while candidate.exists() {
		candidate = sibling_path(path, &format!("{base}.{index}"))?;
		index += 1;
	}
	Ok(candidate)
}

/// Background thread saving a [`Brain`] on a fixed interval.
///
/// A failed save is logged and retried on the next tick; learning and
/// replying keep working from memory meanwhile.
pub struct PersistenceWorker {
	stop: mpsc::Sender<()>,
	handle: JoinHandle<()>,
}

impl PersistenceWorker {
	/// Starts the worker.
	///
	/// # Errors
	/// Returns an error if the thread cannot be spawned.
	pub fn spawn(brain: Arc<Brain>, interval: Duration) -> Result<Self> {
		let (stop, stop_rx) = mpsc::channel::<()>();

		let handle = thread::Builder::new().name("svetse-persist".to_owned()).spawn(move || {
			loop {
				match stop_rx.recv_timeout(interval) {
					Err(RecvTimeoutError::Timeout) => {
						info!("Saving brain...");
						if let Err(e) = brain.save() {
							error!("Could not save brain to disk: {e}");
						}
					}
					Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
				}
			}

			info!("Saving brain before exit...");
			if let Err(e) = brain.save() {
				error!("Could not save brain to disk: {e}");
			}
		})?;

		Ok(Self { stop, handle })
	}

	/// Wakes the worker, lets it write a final snapshot and waits for it.
	pub fn stop(self) {
		let _ = self.stop.send(());
		if self.handle.join().is_err() {
			error!("Persistence worker panicked");
		}
	}
}
