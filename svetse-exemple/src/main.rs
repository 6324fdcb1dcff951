use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use svetse_core::model::corpus;
use svetse_core::{Brain, Coordinator, Message, PersistenceWorker, SvetseConfig};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // Defaults: 100 words per reply, prefix of 2 words, ./brain.bin,
    // saved every 10 seconds. Override them in ./svetse.toml
    let config = SvetseConfig::load()?;

    // Restore the brain, or start a new one if the file is empty or unreadable
    let brain = Arc::new(
        Brain::open(&config.brain_path, config.prefix)
            .with_context(|| format!("failed to open brain {}", config.brain_path.display()))?,
    );

    // Optionally teach a whole corpus first (one message per line)
    let corpus_path = Path::new("./data/corpus.txt");
    if corpus_path.exists() {
        let lines = corpus::train_file(&brain.chain(), corpus_path)?;
        println!("Learned {} lines from {}", lines, corpus_path.display());
    }

    let persistence = PersistenceWorker::spawn(Arc::clone(&brain), config.save_interval())?;
    let coordinator = Coordinator::start(brain.chain(), config.words)?;
    let handle = coordinator.handle();

    println!("Talk to {} (prefix your line with '{}:' to get an answer)", config.nickname, config.nickname);

    // Every line is learned; lines mentioning the nickname also get a reply
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        if let Some(reply) = handle.dispatch(Message::route(&line, &config.nickname))? {
            writeln!(stdout, "<{}> {}", config.nickname, reply)?;
        }
        stdout.flush()?;
    }

    let stats = brain.chain().stats();
    println!("Knows {} prefixes, {} transitions", stats.prefixes, stats.transitions);

    coordinator.shutdown();
    persistence.stop();
    Ok(())
}
