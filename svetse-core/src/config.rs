use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::Deserialize;

use crate::error::{Result, SvetseError};

/// Environment variable pointing at a configuration file.
pub const CONFIG_ENV: &str = "SVETSE_CONFIG";

/// Configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "svetse.toml";

/// Runtime configuration of the bot.
///
/// Every field has a default, so an empty (or absent) file is valid.
/// `prefix` is fixed for the lifetime of a brain: changing it makes an
/// existing snapshot incompatible.
#[derive(Debug, Clone, Deserialize)]
pub struct SvetseConfig {
	/// Maximum number of words in a reply.
	#[serde(default = "default_words")]
	pub words: usize,
	/// Prefix length in words.
	#[serde(default = "default_prefix")]
	pub prefix: usize,
	#[serde(default = "default_brain_path")]
	pub brain_path: PathBuf,
	#[serde(default = "default_save_interval_secs")]
	pub save_interval_secs: u64,
	/// Name the bot answers to.
	#[serde(default = "default_nickname")]
	pub nickname: String,
	#[serde(default)]
	pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
	#[serde(default = "default_host")]
	pub host: String,
	#[serde(default = "default_port")]
	pub port: u16,
}

impl Default for SvetseConfig {
	fn default() -> Self {
		Self {
			words: default_words(),
			prefix: default_prefix(),
			brain_path: default_brain_path(),
			save_interval_secs: default_save_interval_secs(),
			nickname: default_nickname(),
			server: ServerConfig::default(),
		}
	}
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self { host: default_host(), port: default_port() }
	}
}

impl SvetseConfig {
	/// Loads the configuration.
	///
	/// Looks at `$SVETSE_CONFIG` first, then `./svetse.toml`; falls back to
	/// defaults when neither exists. The result is validated.
	pub fn load() -> Result<Self> {
		let config = match resolve_config_path() {
			Some(path) => Self::from_file(&path)?,
			None => Self::default(),
		};
		config.validate()?;
		Ok(config)
	}

	/// Parses a TOML file, without validation.
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let raw = fs::read_to_string(path)?;
		let config = Self::from_toml(&raw)?;
		info!("Loaded configuration from {}", path.display());
		Ok(config)
	}

	pub fn from_toml(raw: &str) -> Result<Self> {
		Ok(toml::from_str(raw)?)
	}

	/// Rejects values the engine cannot run with.
	pub fn validate(&self) -> Result<()> {
		if self.prefix == 0 {
			return Err(SvetseError::Config("prefix must be >= 1".to_owned()));
		}
		if self.save_interval_secs == 0 {
			return Err(SvetseError::Config("save_interval_secs must be >= 1".to_owned()));
		}
		if self.nickname.trim().is_empty() {
			return Err(SvetseError::Config("nickname cannot be empty".to_owned()));
		}
		Ok(())
	}

	pub fn save_interval(&self) -> Duration {
		Duration::from_secs(self.save_interval_secs)
	}
}

fn resolve_config_path() -> Option<PathBuf> {
	if let Ok(path) = env::var(CONFIG_ENV) {
		return Some(PathBuf::from(path));
	}

	let local = Path::new(DEFAULT_CONFIG_FILE);
	local.exists().then(|| local.to_path_buf())
}

fn default_words() -> usize {
	100
}

fn default_prefix() -> usize {
	2
}

fn default_brain_path() -> PathBuf {
	PathBuf::from("brain.bin")
}

fn default_save_interval_secs() -> u64 {
	10
}

fn default_nickname() -> String {
	"SVETSE".to_owned()
}

fn default_host() -> String {
	"127.0.0.1".to_owned()
}

fn default_port() -> u16 {
	5000
}
