//! Settings loading for the keystone candidate registry.
//!
//! Produces the [`RegistrySettings`] a [`keystone_registry::CandidateRegistry`] is
//! constructed with. Settings are written in TOML and may be layered:
//!
//! 1. Each file passed to [`load_layered`], in order (missing files are skipped)
//! 2. `KEYSTONE_DEFAULT_PRIORITY` and `KEYSTONE_SELECT` from the environment
//!
//! Later layers override earlier ones key by key.
//!
//! # Schema
//!
//! ```toml
//! default_priority = 0
//!
//! [selections.adapter]
//! cache = "redis"
//! queue = "nats"
//!
//! [selections.service]
//! status = "builtin"
//! ```
//!
//! `KEYSTONE_SELECT` uses comma-separated `domain.key=provider` entries:
//!
//! ```text
//! KEYSTONE_SELECT=adapter.cache=memory,service.status=builtin
//! ```

pub mod error;

use std::collections::BTreeMap;
use std::path::Path;

pub use error::{ConfigError, Result};
pub use keystone_registry::RegistrySettings;
use serde::Deserialize;

/// Environment variable overriding the default priority.
pub const DEFAULT_PRIORITY_ENV: &str = "KEYSTONE_DEFAULT_PRIORITY";
/// Environment variable adding selection overrides.
pub const SELECT_ENV: &str = "KEYSTONE_SELECT";

/// One settings layer. Absent fields leave lower layers untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Priority assumed for candidates registered without one.
	pub default_priority: Option<i32>,
	/// Forced winners: `domain -> key -> provider`.
	pub selections: BTreeMap<String, BTreeMap<String, String>>,
}

impl Config {
	/// Parse a TOML string into a [`Config`].
	pub fn parse(input: &str) -> Result<Self> {
		Ok(toml::from_str(input)?)
	}

	/// Load a layer from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		let config = Self::parse(&content)?;
		tracing::info!(
			path = %path.display(),
			selections = config.selections.values().map(BTreeMap::len).sum::<usize>(),
			"loaded registry settings"
		);
		Ok(config)
	}

	/// Build a layer from [`DEFAULT_PRIORITY_ENV`] and [`SELECT_ENV`].
	pub fn from_env() -> Result<Self> {
		Self::from_env_values(
			std::env::var(DEFAULT_PRIORITY_ENV).ok().as_deref(),
			std::env::var(SELECT_ENV).ok().as_deref(),
		)
	}

	/// Build a layer from raw environment values.
	pub fn from_env_values(default_priority: Option<&str>, select: Option<&str>) -> Result<Self> {
		let default_priority = default_priority
			.map(str::trim)
			.filter(|s| !s.is_empty())
			.map(|raw| {
				raw.parse::<i32>().map_err(|_| ConfigError::InvalidEnv {
					var: DEFAULT_PRIORITY_ENV,
					value: raw.to_string(),
					reason: "expected an integer",
				})
			})
			.transpose()?;
		let selections = select.map(parse_selections).transpose()?.unwrap_or_default();
		Ok(Self {
			default_priority,
			selections,
		})
	}

	/// Merge another layer into this one.
	///
	/// Values from `other` override values in `self`.
	pub fn merge(&mut self, other: Config) {
		if other.default_priority.is_some() {
			self.default_priority = other.default_priority;
		}
		for (domain, keys) in other.selections {
			self.selections.entry(domain).or_default().extend(keys);
		}
	}

	/// Validate and convert into registry settings.
	pub fn into_settings(self) -> Result<RegistrySettings> {
		let settings = RegistrySettings {
			default_priority: self.default_priority.unwrap_or_default(),
			selections: self.selections,
		};
		settings.validate()?;
		Ok(settings)
	}
}

/// Parse `domain.key=provider` entries separated by commas.
///
/// The domain ends at the first `.`; keys may contain further dots.
pub fn parse_selections(raw: &str) -> Result<BTreeMap<String, BTreeMap<String, String>>> {
	let mut selections: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
	for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
		let malformed = || ConfigError::InvalidEnv {
			var: SELECT_ENV,
			value: entry.to_string(),
			reason: "expected domain.key=provider",
		};
		let (slot, provider) = entry.split_once('=').ok_or_else(malformed)?;
		let (domain, key) = slot.trim().split_once('.').ok_or_else(malformed)?;
		selections
			.entry(domain.to_string())
			.or_default()
			.insert(key.to_string(), provider.trim().to_string());
	}
	Ok(selections)
}

/// Load settings from `paths` in order, then the environment.
///
/// Missing files are skipped; unreadable or malformed ones are errors.
pub fn load_layered<P: AsRef<Path>>(paths: &[P]) -> Result<RegistrySettings> {
	let mut config = Config::default();
	for path in paths {
		let path = path.as_ref();
		if !path.exists() {
			tracing::debug!(path = %path.display(), "settings file not found; skipped");
			continue;
		}
		config.merge(Config::load(path)?);
	}
	config.merge(Config::from_env()?);
	config.into_settings()
}
