use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::candidate::PRIORITY_BOUNDS;
use crate::error::CandidateError;
use crate::ident::{check_bounds, check_identifier, check_provider};

/// Registry-wide resolution settings.
///
/// Supplied once at registry construction; selections may later be adjusted through
/// [`crate::CandidateRegistry::set_selection`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySettings {
	/// Priority assumed for candidates registered without one.
	pub default_priority: i32,
	/// Forced winners: `domain -> key -> provider`.
	pub selections: BTreeMap<String, BTreeMap<String, String>>,
}

impl RegistrySettings {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_default_priority(mut self, priority: i32) -> Self {
		self.default_priority = priority;
		self
	}

	pub fn with_selection(
		mut self,
		domain: impl Into<String>,
		key: impl Into<String>,
		provider: impl Into<String>,
	) -> Self {
		self.set_selection(domain, key, provider);
		self
	}

	/// Returns the forced provider for `domain`/`key`, if any.
	pub fn selection(&self, domain: &str, key: &str) -> Option<&str> {
		self.selections.get(domain)?.get(key).map(String::as_str)
	}

	pub fn set_selection(
		&mut self,
		domain: impl Into<String>,
		key: impl Into<String>,
		provider: impl Into<String>,
	) {
		self.selections
			.entry(domain.into())
			.or_default()
			.insert(key.into(), provider.into());
	}

	/// Removes a selection, returning the provider it forced.
	pub fn clear_selection(&mut self, domain: &str, key: &str) -> Option<String> {
		let keys = self.selections.get_mut(domain)?;
		let removed = keys.remove(key);
		if keys.is_empty() {
			self.selections.remove(domain);
		}
		removed
	}

	/// Checks selection identifiers and the default priority bound.
	pub fn validate(&self) -> Result<(), CandidateError> {
		check_bounds(
			"default_priority",
			i64::from(self.default_priority),
			PRIORITY_BOUNDS,
		)?;
		for (domain, keys) in &self.selections {
			check_identifier("domain", domain)?;
			for (key, provider) in keys {
				check_identifier("key", key)?;
				check_provider(provider)?;
			}
		}
		Ok(())
	}
}
