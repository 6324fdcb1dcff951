/// Fixed-length window of the most recent words.
///
/// A `Prefix` is the lookup key of the Markov chain. It always holds exactly
/// the number of words it was created with; `shift` slides the window instead
/// of growing it.
///
/// # Invariants
/// - `len()` never changes after construction
/// - Words are stored as given; lowercasing happens at ingestion
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prefix {
	words: Vec<String>,
}

impl Prefix {
	/// Creates the empty prefix: `len` placeholder (empty) words.
	///
	/// Both learning and generation start from this state, so the first
	/// generated word is drawn from what followed empty context.
	pub fn new(len: usize) -> Self {
		Self { words: vec![String::new(); len] }
	}

	/// Drops the oldest word and appends `word` at the end.
	///
	/// A zero-length prefix stays empty.
	pub fn shift(&mut self, word: &str) {
		if self.words.is_empty() {
			return;
		}
		self.words.rotate_left(1);
		if let Some(last) = self.words.last_mut() {
			last.clear();
			last.push_str(word);
		}
	}

	/// Canonical map key: words joined by a single space.
	pub fn key(&self) -> String {
		self.words.join(" ")
	}

	pub fn len(&self) -> usize {
		self.words.len()
	}

	pub fn is_empty(&self) -> bool {
		self.words.is_empty()
	}

	pub fn words(&self) -> &[String] {
		&self.words
	}
}
