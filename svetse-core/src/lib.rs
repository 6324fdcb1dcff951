//! Self-learning Markov chat engine.
//!
//! This crate provides the core of a chat bot that learns from every line it
//! sees and answers with statistically plausible text:
//! - A word-level Markov chain shared between threads
//! - Learn and reply workers ordering each reply after its triggering text
//! - Periodic, atomic snapshots of the chain to disk
//! - Parallel training from a text corpus
//!
//! Transports (chat networks, HTTP, console) are left to the binaries; they
//! only need a [`coordinator::CoordinatorHandle`].

/// Markov chain, prefixes, snapshots and corpus training.
pub mod model;

/// Learn/reply workers and the handle adapters talk to.
pub mod coordinator;

/// Snapshot file and persistence worker.
pub mod brain;

/// Routing of incoming chat lines (mentions).
pub mod ingress;

pub mod config;

pub mod error;

/// I/O utilities (file loading, path helpers).
///
/// Not exposed
pub(crate) mod io;

pub use brain::{Brain, PersistenceWorker};
pub use config::SvetseConfig;
pub use coordinator::{Coordinator, CoordinatorHandle};
pub use error::{Result, SvetseError};
pub use ingress::Message;
pub use model::chain::{Chain, ChainStats};
