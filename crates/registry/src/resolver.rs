use std::path::Path;

use crate::candidate::{Candidate, PRIORITY_BOUNDS};
use crate::error::CandidateError;
use crate::explain::ResolutionExplanation;
use crate::ident::check_bounds;
use crate::infer::infer_priority;
use crate::metadata::MetadataValue;
use crate::registry::CandidateRegistry;
use crate::settings::RegistrySettings;

/// Facade over a [`CandidateRegistry`] adding package-level bulk registration.
#[derive(Debug, Default)]
pub struct Resolver {
	registry: CandidateRegistry,
}

impl Resolver {
	pub fn new(settings: RegistrySettings) -> Self {
		Self::with_registry(CandidateRegistry::new(settings))
	}

	pub fn with_registry(registry: CandidateRegistry) -> Self {
		Self { registry }
	}

	pub fn registry(&self) -> &CandidateRegistry {
		&self.registry
	}

	pub fn into_registry(self) -> CandidateRegistry {
		self.registry
	}

	pub fn register(&self, candidate: Candidate) -> Candidate {
		self.registry.register(candidate)
	}

	pub fn resolve(&self, domain: &str, key: &str) -> Option<Candidate> {
		self.registry.resolve(domain, key)
	}

	pub fn resolve_provider(&self, domain: &str, key: &str, provider: &str) -> Option<Candidate> {
		self.registry.resolve_provider(domain, key, provider)
	}

	pub fn list_active(&self, domain: &str) -> Vec<Candidate> {
		self.registry.list_active(domain)
	}

	pub fn list_shadowed(&self, domain: &str) -> Vec<Candidate> {
		self.registry.list_shadowed(domain)
	}

	pub fn explain(&self, domain: &str, key: &str) -> ResolutionExplanation {
		self.registry.explain(domain, key)
	}

	/// Registers candidates shipped by `package_name` from `path`.
	///
	/// Candidates without an explicit priority receive `priority`, or the value from
	/// [`infer_priority`] when `priority` is `None`. `package` and `path` metadata are
	/// added unless the candidate already sets them. The batch registers atomically.
	///
	/// Fails without registering anything if `priority` is out of bounds.
	pub fn register_from_pkg(
		&self,
		package_name: &str,
		path: &Path,
		candidates: impl IntoIterator<Item = Candidate>,
		priority: Option<i32>,
	) -> Result<Vec<Candidate>, CandidateError> {
		let priority = match priority {
			Some(p) => check_bounds("priority", i64::from(p), PRIORITY_BOUNDS)?,
			None => infer_priority(package_name, path),
		};
		let path_value = path.to_string_lossy().into_owned();

		let prepared: Vec<Candidate> = candidates
			.into_iter()
			.map(|mut candidate| {
				if candidate.priority().is_none() {
					candidate.set_priority(priority);
				}
				let metadata = candidate.metadata_mut();
				metadata
					.entry("package".to_string())
					.or_insert_with(|| MetadataValue::from(package_name));
				metadata
					.entry("path".to_string())
					.or_insert_with(|| MetadataValue::Str(path_value.clone()));
				candidate
			})
			.collect();

		tracing::debug!(
			package = package_name,
			path = %path.display(),
			priority,
			count = prepared.len(),
			"registering package candidates"
		);
		Ok(self.registry.register_many(prepared))
	}
}
