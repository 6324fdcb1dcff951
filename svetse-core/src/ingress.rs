/// What an adapter should do with an incoming chat line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
	/// Plain chatter: learn it, say nothing.
	Learn(String),
	/// The bot was addressed: learn the cleaned text, then reply.
	Respond(String),
}

impl Message {
	/// Routes a chat line depending on whether it mentions `nick`.
	pub fn route(text: &str, nick: &str) -> Self {
		match mention(text, nick) {
			Some(cleaned) => Message::Respond(cleaned),
			None => Message::Learn(text.to_owned()),
		}
	}
}

/// Returns the line without the bot's name if it mentions `nick`.
///
/// A leading `"nick: "` or `"nick:"` address is stripped, then every other
/// occurrence of the name is removed. Matching is case-sensitive.
pub fn mention(text: &str, nick: &str) -> Option<String> {
	if nick.is_empty() || !text.contains(nick) {
		return None;
	}

	let addressed_space = format!("{nick}: ");
	let addressed = format!("{nick}:");
	let cleaned = text
		.strip_prefix(addressed_space.as_str())
		.or_else(|| text.strip_prefix(addressed.as_str()))
		.unwrap_or(text);

	Some(cleaned.replace(nick, ""))
}
