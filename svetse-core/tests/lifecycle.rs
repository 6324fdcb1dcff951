use std::sync::Arc;
use std::time::Duration;

use svetse_core::{Brain, Coordinator, Message, PersistenceWorker, SvetseConfig};

#[test]
fn bot_remembers_across_restarts() {
	let dir = tempfile::tempdir().unwrap();
	let config = SvetseConfig {
		brain_path: dir.path().join("brain.bin"),
		..SvetseConfig::default()
	};
	config.validate().unwrap();

	{
		let brain = Arc::new(Brain::open(&config.brain_path, config.prefix).unwrap());
		let persistence = PersistenceWorker::spawn(Arc::clone(&brain), Duration::from_secs(3600)).unwrap();
		let coordinator = Coordinator::start(brain.chain(), config.words).unwrap();
		let handle = coordinator.handle();

		let heard = Message::route("everybody loves raymond", &config.nickname);
		assert_eq!(handle.dispatch(heard).unwrap(), None);

		let addressed = Message::route("SVETSE: everybody loves raymond", &config.nickname);
		let reply = handle.dispatch(addressed).unwrap();
		assert_eq!(reply.as_deref(), Some("everybody loves raymond"));

		drop(handle);
		coordinator.shutdown();
		persistence.stop();
	}

	let brain = Brain::open(&config.brain_path, config.prefix).unwrap();
	let chain = brain.chain();
	assert_eq!(chain.successors(" "), vec!["everybody", "everybody"]);
	assert_eq!(chain.generate(config.words), "everybody loves raymond");
}

#[test]
fn changing_prefix_starts_a_new_brain() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("brain.bin");

	let brain = Brain::open(&path, 2).unwrap();
	brain.chain().learn("some old knowledge");
	brain.save().unwrap();

	let brain = Brain::open(&path, 3).unwrap();
	assert!(brain.chain().is_empty());
	assert!(dir.path().join("brain.bin.prefix2").exists());

	// The moved snapshot is still a valid brain for its own prefix length.
	let old = Brain::open(dir.path().join("brain.bin.prefix2"), 2).unwrap();
	assert_eq!(old.chain().generate(10), "some old knowledge");
}
