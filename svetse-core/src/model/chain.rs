use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::Serialize;

use super::prefix::Prefix;
use super::snapshot::Snapshot;
use crate::error::{Result, SvetseError};

/// Word-level Markov chain shared by every worker of the bot.
///
/// The chain maps the key of a [`Prefix`] to the list of words observed right
/// after it. Successors are stored with repetition: a word seen three times
/// after a prefix appears three times in its list, which is what makes uniform
/// sampling frequency-weighted.
///
/// # Concurrency
/// The map lives behind an internal `RwLock`. Learning takes the write lock
/// for each single append, generation takes the read lock for each single
/// lookup; neither holds it across a whole stream. The raw map is never handed
/// out.
///
/// # Invariants
/// - `prefix_len` never changes
/// - Every key is the key of a `Prefix` of length `prefix_len`
/// - Successor lists are append-only
#[derive(Debug)]
pub struct Chain {
	prefix_len: usize,
	entries: RwLock<HashMap<String, Vec<String>>>,
}

/// Size of a chain, as reported to operators.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainStats {
	pub prefix_len: usize,
	/// Number of distinct prefixes.
	pub prefixes: usize,
	/// Number of learned (prefix, successor) events.
	pub transitions: usize,
}

impl Chain {
	/// Creates an empty chain with prefixes of `prefix_len` words.
	pub fn new(prefix_len: usize) -> Self {
		Self { prefix_len, entries: RwLock::new(HashMap::new()) }
	}

	/// Rebuilds a chain from a snapshot.
	pub fn from_snapshot(snapshot: Snapshot) -> Self {
		Self { prefix_len: snapshot.prefix_len, entries: RwLock::new(snapshot.entries) }
	}

	pub fn prefix_len(&self) -> usize {
		self.prefix_len
	}

	/// Number of distinct prefixes learned so far.
	pub fn len(&self) -> usize {
		self.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.read().is_empty()
	}

	/// Copy of the successor list stored under `key` (empty if unknown).
	pub fn successors(&self, key: &str) -> Vec<String> {
		self.read().get(key).cloned().unwrap_or_default()
	}

	pub fn stats(&self) -> ChainStats {
		let entries = self.read();
		ChainStats {
			prefix_len: self.prefix_len,
			prefixes: entries.len(),
			transitions: entries.values().map(Vec::len).sum(),
		}
	}

	/// Learns from a text stream.
	///
	/// The stream is split into whitespace-delimited words, each lowercased.
	/// Every word is appended to the successors of the current prefix, then
	/// the prefix slides over it. Learning starts from the empty prefix.
	///
	/// Invalid UTF-8 is replaced with U+FFFD and learning goes on. End of
	/// stream and read failures both end learning normally; whatever was read
	/// before stays learned.
	///
	/// Returns the number of words learned.
	pub fn build<R: Read>(&self, reader: R) -> usize {
		let mut reader = BufReader::new(reader);
		let mut prefix = Prefix::new(self.prefix_len);
		let mut line = Vec::new();
		let mut learned = 0;

		loop {
			line.clear();
			match reader.read_until(b'\n', &mut line) {
				Ok(0) => break,
				Ok(_) => (),
				Err(e) => {
					debug!("Stopped reading input: {e}");
					break;
				}
			}

			for word in String::from_utf8_lossy(&line).split_whitespace() {
				let word = word.to_lowercase();
				self.write().entry(prefix.key()).or_default().push(word.clone());
				prefix.shift(&word);
				learned += 1;
			}
		}

		learned
	}

	/// Learns from an in-memory string. See [`Chain::build`].
	pub fn learn(&self, text: &str) -> usize {
		self.build(text.as_bytes())
	}

	/// Generates at most `max_words` words using the thread-local RNG.
	pub fn generate(&self, max_words: usize) -> String {
		self.generate_with(max_words, &mut rand::rng())
	}

	/// Generates at most `max_words` words with the given random source.
	///
	/// Walks the chain from the empty prefix, picking each next word uniformly
	/// among the successors of the current prefix. Stops early when the
	/// current prefix has no known successor; the result may be empty.
	pub fn generate_with<R: Rng + ?Sized>(&self, max_words: usize, rng: &mut R) -> String {
		let mut prefix = Prefix::new(self.prefix_len);
		let mut words: Vec<String> = Vec::new();

		while words.len() < max_words {
			let next = {
				let entries = self.read();
				match entries.get(&prefix.key()).and_then(|choices| choices.choose(&mut *rng)) {
					Some(word) => word.clone(),
					None => break,
				}
			};
			prefix.shift(&next);
			words.push(next);
		}

		words.join(" ")
	}

	/// Copies the whole chain under the read lock.
	pub fn snapshot(&self) -> Snapshot {
		Snapshot { entries: self.read().clone(), prefix_len: self.prefix_len }
	}

	/// Appends every successor list of `snapshot` after the ones already
	/// stored, key by key.
	///
	/// # Errors
	/// Returns `PrefixMismatch` if the prefix lengths differ.
	pub fn absorb(&self, snapshot: Snapshot) -> Result<()> {
		if snapshot.prefix_len != self.prefix_len {
			return Err(SvetseError::PrefixMismatch {
				expected: self.prefix_len,
				found: snapshot.prefix_len,
			});
		}

		let mut entries = self.write();
		for (key, successors) in snapshot.entries {
			entries.entry(key).or_default().extend(successors);
		}
		Ok(())
	}

	/// Merges another chain into this one. See [`Chain::absorb`].
	pub fn merge(&self, other: &Chain) -> Result<()> {
		self.absorb(other.snapshot())
	}

	// Every critical section leaves the map consistent, so a poisoned lock
	// is still safe to use.
	fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<String>>> {
		self.entries.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<String>>> {
		self.entries.write().unwrap_or_else(PoisonError::into_inner)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rand::SeedableRng;
	use rand::rngs::StdRng;
	use std::io;

	#[test]
	fn build_records_successors_in_order() {
		let chain = Chain::new(1);
		assert_eq!(chain.learn("a b a c a b"), 6);

		assert_eq!(chain.successors("a"), vec!["b", "c", "b"]);
		assert_eq!(chain.successors("b"), vec!["a"]);
		assert_eq!(chain.successors("c"), vec!["a"]);
		// The first word is learned against the empty prefix.
		assert_eq!(chain.successors(""), vec!["a"]);
		assert_eq!(chain.len(), 4);
	}

	#[test]
	fn build_lowercases_and_spans_lines() {
		let chain = Chain::new(2);
		chain.learn("Hello\n  WORLD\tagain\n");

		assert_eq!(chain.successors(" "), vec!["hello"]);
		assert_eq!(chain.successors(" hello"), vec!["world"]);
		assert_eq!(chain.successors("hello world"), vec!["again"]);
	}

	#[test]
	fn empty_input_learns_nothing() {
		let chain = Chain::new(2);
		assert_eq!(chain.learn(""), 0);
		assert_eq!(chain.learn("   \n\t "), 0);
		assert!(chain.is_empty());
	}

	struct FailingReader {
		served: bool,
	}

	impl Read for FailingReader {
		fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
			if self.served {
				return Err(io::Error::other("connection reset"));
			}
			self.served = true;
			let data = b"one two\n";
			buf[..data.len()].copy_from_slice(data);
			Ok(data.len())
		}
	}

	#[test]
	fn read_failure_ends_learning() {
		let chain = Chain::new(1);
		assert_eq!(chain.build(FailingReader { served: false }), 2);
		assert_eq!(chain.successors("one"), vec!["two"]);
	}

	#[test]
	fn invalid_utf8_is_replaced_not_fatal() {
		let chain = Chain::new(1);
		let bytes: &[u8] = b"fine words\n\xff\xfe broken\nstill here\n";
		assert_eq!(chain.build(bytes), 6);
		assert_eq!(chain.successors("words"), vec!["\u{FFFD}\u{FFFD}"]);
		assert_eq!(chain.successors("\u{FFFD}\u{FFFD}"), vec!["broken"]);
		assert_eq!(chain.successors("broken"), vec!["still"]);
		assert_eq!(chain.successors("still"), vec!["here"]);
	}

	#[test]
	fn generate_on_empty_chain_is_empty() {
		let chain = Chain::new(2);
		assert_eq!(chain.generate(100), "");
	}

	#[test]
	fn generate_zero_words_is_empty() {
		let chain = Chain::new(1);
		chain.learn("a b c");
		assert_eq!(chain.generate(0), "");
	}

	#[test]
	fn deterministic_path_is_reproduced() {
		let chain = Chain::new(2);
		chain.learn("the quick brown fox jumps");
		assert_eq!(chain.generate(100), "the quick brown fox jumps");
		assert_eq!(chain.generate(3), "the quick brown");
	}

	#[test]
	fn generated_words_follow_the_chain() {
		let chain = Chain::new(1);
		chain.learn("a b a c a b");
		chain.learn("c c a");

		let mut rng = StdRng::seed_from_u64(7);
		for _ in 0..200 {
			let text = chain.generate_with(20, &mut rng);
			let words: Vec<&str> = text.split(' ').filter(|w| !w.is_empty()).collect();
			assert!(words.len() <= 20);

			let mut prefix = Prefix::new(1);
			for word in words {
				assert!(chain.successors(&prefix.key()).iter().any(|s| s == word));
				prefix.shift(word);
			}
		}
	}

	#[test]
	fn seeded_generation_is_repeatable() {
		let chain = Chain::new(1);
		chain.learn("a b a c a b c a c b a");
		let first = chain.generate_with(30, &mut StdRng::seed_from_u64(42));
		let second = chain.generate_with(30, &mut StdRng::seed_from_u64(42));
		assert_eq!(first, second);
	}

	#[test]
	fn snapshot_round_trip() {
		let chain = Chain::new(2);
		chain.learn("to be or not to be that is the question");
		chain.learn("to be is to do");

		let restored = Chain::from_snapshot(chain.snapshot());
		assert_eq!(restored.prefix_len(), 2);
		assert_eq!(restored.snapshot(), chain.snapshot());
		assert_eq!(restored.successors("to be"), vec!["or", "that", "is"]);
	}

	#[test]
	fn merge_appends_after_existing() {
		let first = Chain::new(1);
		first.learn("a b");
		let second = Chain::new(1);
		second.learn("a c");

		first.merge(&second).unwrap();
		assert_eq!(first.successors(""), vec!["a", "a"]);
		assert_eq!(first.successors("a"), vec!["b", "c"]);
	}

	#[test]
	fn absorb_rejects_other_prefix_len() {
		let chain = Chain::new(2);
		let err = chain.absorb(Snapshot::empty(3)).unwrap_err();
		assert!(matches!(err, SvetseError::PrefixMismatch { expected: 2, found: 3 }));
	}

	#[test]
	fn stats_count_prefixes_and_transitions() {
		let chain = Chain::new(1);
		chain.learn("a b a c a b");
		let stats = chain.stats();
		assert_eq!(stats.prefix_len, 1);
		assert_eq!(stats.prefixes, 4);
		assert_eq!(stats.transitions, 6);
	}
}
