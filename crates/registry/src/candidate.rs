use std::any::Any;
use std::ops::RangeInclusive;
use std::sync::Arc;

use crate::error::CandidateError;
use crate::ident::{check_bounds, check_identifier, check_provider};
use crate::metadata::{Metadata, MetadataValue};

/// Accepted range for [`Candidate::priority`].
pub const PRIORITY_BOUNDS: RangeInclusive<i32> = -1000..=1000;
/// Accepted range for [`Candidate::stack_level`].
pub const STACK_LEVEL_BOUNDS: RangeInclusive<i32> = -100..=100;

/// In-memory construction handle producing a type-erased instance.
pub type InlineFactory = Arc<dyn Fn() -> Box<dyn Any + Send> + Send + Sync>;

/// Zero-argument health probe. Stored by the registry, never invoked by it.
pub type HealthProbe = Arc<dyn Fn() -> bool + Send + Sync>;

/// How a candidate's implementation gets built.
///
/// The registry only stores and returns factories; invoking `Inline` or loading
/// `Deferred` is the lifecycle layer's job.
#[derive(Clone)]
pub enum Factory {
	/// Callable held in memory.
	Inline(InlineFactory),
	/// Path specifier resolved later by an external loader (e.g. `"crate::cache::Redis"`).
	Deferred(String),
}

impl Factory {
	/// Wraps a closure as an [`Factory::Inline`] handle.
	pub fn inline<F, T>(f: F) -> Self
	where
		F: Fn() -> T + Send + Sync + 'static,
		T: Any + Send,
	{
		Self::Inline(Arc::new(move || Box::new(f()) as Box<dyn Any + Send>))
	}

	/// Creates a [`Factory::Deferred`] handle from a path specifier.
	pub fn deferred(path: impl Into<String>) -> Self {
		Self::Deferred(path.into())
	}

	/// Returns the path specifier of a deferred factory.
	pub fn as_deferred(&self) -> Option<&str> {
		match self {
			Self::Deferred(path) => Some(path),
			Self::Inline(_) => None,
		}
	}
}

impl std::fmt::Debug for Factory {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Inline(_) => f.write_str("Inline(..)"),
			Self::Deferred(path) => f.debug_tuple("Deferred").field(path).finish(),
		}
	}
}

/// Where a candidate came from. Diagnostic only; never used for ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CandidateSource {
	/// Registered directly by application code.
	#[default]
	Manual,
	/// Discovered in a locally installed package.
	LocalPackage,
	/// Discovered through a plugin entry point.
	EntryPoint,
	/// Described by a remote manifest.
	RemoteManifest,
}

impl std::fmt::Display for CandidateSource {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Manual => write!(f, "manual"),
			Self::LocalPackage => write!(f, "local_pkg"),
			Self::EntryPoint => write!(f, "entry_point"),
			Self::RemoteManifest => write!(f, "remote_manifest"),
		}
	}
}

/// One implementation offered for a `(domain, key)` slot.
///
/// Only [`CandidateBuilder::build`] creates candidates, so every value is validated.
/// The registry hands out clones; nothing returned aliases registry state.
#[derive(Clone)]
pub struct Candidate {
	pub(crate) domain: String,
	pub(crate) key: String,
	pub(crate) provider: String,
	pub(crate) factory: Factory,
	pub(crate) priority: Option<i32>,
	pub(crate) stack_level: Option<i32>,
	pub(crate) source: CandidateSource,
	pub(crate) metadata: Metadata,
	pub(crate) health: Option<HealthProbe>,
	pub(crate) sequence: Option<u64>,
}

impl Candidate {
	/// Starts building a candidate for `domain`/`key` offered by `provider`.
	pub fn builder(
		domain: impl Into<String>,
		key: impl Into<String>,
		provider: impl Into<String>,
		factory: Factory,
	) -> CandidateBuilder {
		CandidateBuilder {
			domain: domain.into(),
			key: key.into(),
			provider: provider.into(),
			factory,
			priority: None,
			stack_level: None,
			source: CandidateSource::default(),
			metadata: Metadata::new(),
			health: None,
		}
	}

	pub fn domain(&self) -> &str {
		&self.domain
	}

	pub fn key(&self) -> &str {
		&self.key
	}

	pub fn provider(&self) -> &str {
		&self.provider
	}

	pub fn factory(&self) -> &Factory {
		&self.factory
	}

	/// Explicit priority, if one was supplied.
	pub fn priority(&self) -> Option<i32> {
		self.priority
	}

	/// Explicit stack level, if one was supplied.
	pub fn stack_level(&self) -> Option<i32> {
		self.stack_level
	}

	pub fn source(&self) -> CandidateSource {
		self.source
	}

	pub fn metadata(&self) -> &Metadata {
		&self.metadata
	}

	/// Mutable access to metadata. Metadata never affects ranking, so no re-validation
	/// is needed.
	pub fn metadata_mut(&mut self) -> &mut Metadata {
		&mut self.metadata
	}

	pub fn health(&self) -> Option<&HealthProbe> {
		self.health.as_ref()
	}

	/// Registry sequence, assigned on registration. `None` for unregistered values.
	pub fn sequence(&self) -> Option<u64> {
		self.sequence
	}

	pub(crate) fn set_priority(&mut self, priority: i32) {
		self.priority = Some(priority);
	}
}

impl std::fmt::Debug for Candidate {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Candidate")
			.field("domain", &self.domain)
			.field("key", &self.key)
			.field("provider", &self.provider)
			.field("factory", &self.factory)
			.field("priority", &self.priority)
			.field("stack_level", &self.stack_level)
			.field("source", &self.source)
			.field("metadata", &self.metadata)
			.field("health", &self.health.is_some())
			.field("sequence", &self.sequence)
			.finish()
	}
}

/// Validating constructor for [`Candidate`].
pub struct CandidateBuilder {
	domain: String,
	key: String,
	provider: String,
	factory: Factory,
	priority: Option<i32>,
	stack_level: Option<i32>,
	source: CandidateSource,
	metadata: Metadata,
	health: Option<HealthProbe>,
}

impl CandidateBuilder {
	pub fn priority(mut self, priority: i32) -> Self {
		self.priority = Some(priority);
		self
	}

	pub fn stack_level(mut self, stack_level: i32) -> Self {
		self.stack_level = Some(stack_level);
		self
	}

	pub fn source(mut self, source: CandidateSource) -> Self {
		self.source = source;
		self
	}

	pub fn metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
		self.metadata.insert(key.into(), value.into());
		self
	}

	pub fn health<F>(mut self, probe: F) -> Self
	where
		F: Fn() -> bool + Send + Sync + 'static,
	{
		self.health = Some(Arc::new(probe));
		self
	}

	/// Validates every field and produces the candidate.
	///
	/// Fails on the first invalid field: domain, key, provider, priority, stack level.
	pub fn build(self) -> Result<Candidate, CandidateError> {
		check_identifier("domain", &self.domain)?;
		check_identifier("key", &self.key)?;
		check_provider(&self.provider)?;
		let priority = self
			.priority
			.map(|p| check_bounds("priority", i64::from(p), PRIORITY_BOUNDS))
			.transpose()?;
		let stack_level = self
			.stack_level
			.map(|s| check_bounds("stack_level", i64::from(s), STACK_LEVEL_BOUNDS))
			.transpose()?;

		Ok(Candidate {
			domain: self.domain,
			key: self.key,
			provider: self.provider,
			factory: self.factory,
			priority,
			stack_level,
			source: self.source,
			metadata: self.metadata,
			health: self.health,
			sequence: None,
		})
	}
}
