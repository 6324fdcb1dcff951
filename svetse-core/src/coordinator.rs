use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{error, info, warn};

use crate::error::{Result, SvetseError};
use crate::ingress::Message;
use crate::model::chain::Chain;

/// A pending reply: the reply worker answers on `respond_to`.
#[derive(Debug)]
pub(crate) struct ReplyRequest {
	respond_to: Sender<String>,
}

/// Work item of the learn worker.
#[derive(Debug)]
pub(crate) enum LearnJob {
	/// Learn a line of text.
	Text(String),
	/// Empty learn signal. Once the learn worker reaches it, everything
	/// queued before is learned, and the request moves on to the reply worker.
	Sync(ReplyRequest),
	/// Stop after everything queued before.
	Shutdown,
}

/// Owns the learn and reply workers of a shared [`Chain`].
///
/// # Responsibilities
/// - Serialize every `build` call on one learn thread
/// - Serialize every `generate` call on one reply thread
/// - Order each reply after all text submitted before it
///
/// Adapters talk to it through [`CoordinatorHandle`]s. Queues are unbounded:
/// there is no backpressure and no timeout.
pub struct Coordinator {
	handle: CoordinatorHandle,
	learner: JoinHandle<()>,
	replier: JoinHandle<()>,
}

/// Cloneable sending side of a [`Coordinator`].
#[derive(Clone, Debug)]
pub struct CoordinatorHandle {
	learn: Sender<LearnJob>,
}

impl Coordinator {
	/// Spawns the workers. Replies are at most `words` words long.
	///
	/// # Errors
	/// Returns an error if a worker thread cannot be spawned.
	pub fn start(chain: Arc<Chain>, words: usize) -> Result<Self> {
		let (learn_tx, learn_rx) = mpsc::channel::<LearnJob>();
		let (reply_tx, reply_rx) = mpsc::channel::<ReplyRequest>();

		let learn_chain = Arc::clone(&chain);
		let learner = thread::Builder::new()
			.name("svetse-learn".to_owned())
			.spawn(move || learn_worker(&learn_chain, learn_rx, reply_tx))?;

		let replier = thread::Builder::new()
			.name("svetse-reply".to_owned())
			.spawn(move || reply_worker(&chain, words, reply_rx))?;

		Ok(Self { handle: CoordinatorHandle { learn: learn_tx }, learner, replier })
	}

	pub fn handle(&self) -> CoordinatorHandle {
		self.handle.clone()
	}

	/// Stops both workers and waits for them.
	///
	/// Text and reply requests queued before the call are still processed.
	/// Handles that outlive the coordinator get `CoordinatorClosed`.
	pub fn shutdown(self) {
		if self.handle.learn.send(LearnJob::Shutdown).is_err() {
			warn!("Learn worker already stopped");
		}
		drop(self.handle);
		if self.learner.join().is_err() {
			error!("Learn worker panicked");
		}
		if self.replier.join().is_err() {
			error!("Reply worker panicked");
		}
	}
}

impl CoordinatorHandle {
	/// Queues `text` for learning and returns immediately.
	pub fn submit_learn(&self, text: impl Into<String>) {
		if self.learn.send(LearnJob::Text(text.into())).is_err() {
			warn!("Learn worker is gone, dropping text");
		}
	}

	/// Generates a reply once everything submitted before has been learned.
	///
	/// Blocks until the reply worker answers. The reply may be empty.
	///
	/// # Errors
	/// `CoordinatorClosed` if the workers are gone.
	pub fn request_reply(&self) -> Result<String> {
		let (respond_to, response) = mpsc::channel();
		self.learn
			.send(LearnJob::Sync(ReplyRequest { respond_to }))
			.map_err(|_| SvetseError::CoordinatorClosed)?;
		response.recv().map_err(|_| SvetseError::CoordinatorClosed)
	}

	/// Learns `text`, then replies: one learn/reply round trip.
	pub fn respond(&self, text: impl Into<String>) -> Result<String> {
		self.submit_learn(text);
		self.request_reply()
	}

	/// Handles a routed chat message.
	///
	/// Returns the reply for a mention, `None` for plain chatter.
	pub fn dispatch(&self, message: Message) -> Result<Option<String>> {
		match message {
			Message::Learn(text) => {
				self.submit_learn(text);
				Ok(None)
			}
			Message::Respond(text) => self.respond(text).map(Some),
		}
	}
}

fn learn_worker(chain: &Chain, jobs: Receiver<LearnJob>, replies: Sender<ReplyRequest>) {
	for job in jobs {
		match job {
			LearnJob::Text(text) => {
				info!("Learned the following: {text}");
				chain.learn(&text);
			}
			LearnJob::Sync(request) => {
				if replies.send(request).is_err() {
					warn!("Reply worker is gone, dropping reply request");
				}
			}
			LearnJob::Shutdown => break,
		}
	}
	// Dropping `replies` lets the reply worker finish its queue and exit.
}

fn reply_worker(chain: &Chain, words: usize, requests: Receiver<ReplyRequest>) {
	for request in requests {
		let reply = chain.generate(words);
		info!("Replying with: {reply}");
		// The requester may have given up waiting.
		let _ = request.respond_to.send(reply);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reply_reflects_freshly_learned_text() {
		let chain = Arc::new(Chain::new(2));
		let coordinator = Coordinator::start(Arc::clone(&chain), 100).unwrap();
		let handle = coordinator.handle();

		let reply = handle.respond("hello there general kenobi").unwrap();
		assert_eq!(reply, "hello there general kenobi");

		drop(handle);
		coordinator.shutdown();
	}

	#[test]
	fn reply_waits_for_every_earlier_submission() {
		let chain = Arc::new(Chain::new(1));
		let coordinator = Coordinator::start(Arc::clone(&chain), 10).unwrap();
		let handle = coordinator.handle();

		for _ in 0..50 {
			handle.submit_learn("ping pong");
		}
		handle.request_reply().unwrap();
		assert_eq!(chain.successors("ping").len(), 50);

		drop(handle);
		coordinator.shutdown();
	}

	#[test]
	fn reply_is_capped_to_configured_words() {
		let chain = Arc::new(Chain::new(1));
		chain.learn("la la la la la la la la");
		let coordinator = Coordinator::start(Arc::clone(&chain), 3).unwrap();

		let reply = coordinator.handle().request_reply().unwrap();
		assert_eq!(reply.split(' ').count(), 3);

		coordinator.shutdown();
	}

	#[test]
	fn empty_model_replies_empty() {
		let coordinator = Coordinator::start(Arc::new(Chain::new(2)), 100).unwrap();
		assert_eq!(coordinator.handle().request_reply().unwrap(), "");
		coordinator.shutdown();
	}

	#[test]
	fn dispatch_only_replies_to_mentions() {
		let chain = Arc::new(Chain::new(2));
		let coordinator = Coordinator::start(Arc::clone(&chain), 100).unwrap();
		let handle = coordinator.handle();

		assert_eq!(handle.dispatch(Message::Learn("just chatting".into())).unwrap(), None);
		let reply = handle.dispatch(Message::Respond("just chatting".into())).unwrap();
		assert_eq!(reply.as_deref(), Some("just chatting"));
		assert_eq!(chain.successors(" just"), vec!["chatting", "chatting"]);

		drop(handle);
		coordinator.shutdown();
	}

	#[test]
	fn closed_coordinator_is_reported() {
		let (learn, jobs) = mpsc::channel();
		drop(jobs);
		let handle = CoordinatorHandle { learn };

		handle.submit_learn("nobody listens");
		assert!(matches!(handle.request_reply(), Err(SvetseError::CoordinatorClosed)));
	}

	#[test]
	fn shutdown_drains_queued_text() {
		let chain = Arc::new(Chain::new(1));
		let coordinator = Coordinator::start(Arc::clone(&chain), 10).unwrap();
		let handle = coordinator.handle();
		for i in 0..20 {
			handle.submit_learn(format!("word{i} end"));
		}
		coordinator.shutdown();

		assert_eq!(chain.successors("").len(), 20);
		assert!(matches!(handle.request_reply(), Err(SvetseError::CoordinatorClosed)));
	}
}
