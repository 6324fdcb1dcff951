use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Full, owned copy of a chain's state.
///
/// This is the on-disk form of the brain. It is produced under the chain's
/// lock, so it never contains a half-applied update.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
	/// Prefix key → successors in observation order.
	pub entries: HashMap<String, Vec<String>>,
	pub prefix_len: usize,
}

impl Snapshot {
	/// Empty snapshot for a chain with `prefix_len` words per prefix.
	pub fn empty(prefix_len: usize) -> Self {
		Self { entries: HashMap::new(), prefix_len }
	}

	/// Encodes the snapshot with `postcard`.
	pub fn to_bytes(&self) -> Result<Vec<u8>> {
		Ok(postcard::to_stdvec(self)?)
	}

	/// Decodes a snapshot previously written by [`Snapshot::to_bytes`].
	pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
		Ok(postcard::from_bytes(bytes)?)
	}
}
