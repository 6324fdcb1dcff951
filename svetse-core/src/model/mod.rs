//! Word-level Markov model of the bot.
//!
//! This module provides:
//! - Sliding word windows used as lookup keys (`Prefix`)
//! - The shared, lock-guarded model (`Chain`)
//! - Its serializable form (`Snapshot`)
//! - Bulk training from text files (`corpus`)

/// Shared Markov chain: learning (`build`) and sampling (`generate`).
///
/// Owns its lock; callers never touch the underlying map.
pub mod chain;

/// Fixed-length window of recent words, used as a chain key.
pub mod prefix;

/// Owned, serializable copy of a chain (`postcard` encoded on disk).
pub mod snapshot;

/// Parallel training from a text corpus, one line per message.
pub mod corpus;
