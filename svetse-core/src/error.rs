use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the svetse engine.
///
/// Chain operations themselves never fail; these cover the store, the
/// configuration and the worker queues.
#[derive(Error, Debug)]
pub enum SvetseError {
	/// The snapshot location could not be opened or created.
	#[error("Could not open brain at {path}: {source}")]
	Store {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Snapshot encoding error: {0}")]
	Encode(#[from] postcard::Error),

	#[error("Prefix length mismatch: expected {expected}, found {found}")]
	PrefixMismatch { expected: usize, found: usize },

	#[error("Invalid configuration: {0}")]
	Config(String),

	#[error("Could not parse configuration: {0}")]
	ConfigParse(#[from] toml::de::Error),

	/// The learn/reply workers have stopped.
	#[error("Coordinator is closed")]
	CoordinatorClosed,
}

pub type Result<T> = std::result::Result<T, SvetseError>;
