use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::info;

use super::chain::Chain;
use crate::error::Result;
use crate::io::read_file;

/// Teaches a whole text file to `chain`, one line per message.
///
/// # Behavior
/// - Each line is learned on its own, from the empty prefix, exactly like a
///   chat line handed to the learn worker.
/// - Lines are split into chunks (based on CPU cores * factor).
/// - Spawns threads to build a partial chain for each chunk.
/// - Partial chains are merged in chunk order, so successor lists end up in
///   the same order as if the lines had been learned one after the other.
///
/// # Returns
/// The number of lines read.
///
/// # Errors
/// File I/O errors, or a prefix mismatch during the merge (not expected, all
/// partial chains use `chain.prefix_len()`).
pub fn train_file<P: AsRef<Path>>(chain: &Chain, path: P) -> Result<usize> {
	let lines = read_file(&path)?;
	if lines.is_empty() {
		return Ok(0);
	}

	let cpus = num_cpus::get();
	let factor = 8;
	let chunks = cpus * factor;
	let chunk_size = lines.len().div_ceil(chunks);
	let prefix_len = chain.prefix_len();

	let (tx, rx) = mpsc::channel();
	for (index, chunk) in lines.chunks(chunk_size).enumerate() {
		let tx = tx.clone();
		let chunk: Vec<String> = chunk.to_vec();

		thread::spawn(move || {
			let partial = Chain::new(prefix_len);
			for line in &chunk {
				partial.learn(line);
			}
			// The receiver outlives every sender; a failed send only means
			// the caller already gave up.
			let _ = tx.send((index, partial.snapshot()));
		});
	}
	drop(tx);

	let mut partials: Vec<_> = rx.iter().collect();
	partials.sort_by_key(|(index, _)| *index);
	for (_, partial) in partials {
		chain.absorb(partial)?;
	}

	info!("Trained on {} lines from {}", lines.len(), path.as_ref().display());
	Ok(lines.len())
}
