//! Thread-safe candidate store.
//!
//! # Role
//!
//! Holds every registered candidate grouped by domain then key, assigns registry
//! sequences, and keeps each slot's ranking current after every mutation.
//!
//! # Invariants
//!
//! - Sequences are assigned exactly once, strictly increasing, never reused.
//!   - Enforced in: [`CandidateRegistry::register`] (under the registry lock).
//!   - Tested by: `registry::tests::concurrent_registration_assigns_unique_sequences`
//! - A slot's cached ranking always reflects its current candidates and settings.
//!   - Enforced in: [`CandidateRegistry::register`], [`CandidateRegistry::set_selection`].
//!   - Tested by: `registry::tests::resolve_matches_explain`
//! - Values crossing the boundary are copies; callers never alias stored state.
//!   - Tested by: `registry::tests::stored_candidate_is_isolated_from_caller`

use std::cell::RefCell;

use indexmap::IndexMap;
use parking_lot::ReentrantMutex;
use rustc_hash::FxBuildHasher;

use crate::candidate::Candidate;
use crate::error::CandidateError;
use crate::explain::ResolutionExplanation;
use crate::ident::{check_identifier, check_provider};
use crate::precedence;
use crate::settings::RegistrySettings;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Candidates for one `(domain, key)` slot.
#[derive(Default)]
struct Slot {
	/// Registration order.
	candidates: Vec<Candidate>,
	/// Positions into `candidates`, winner first.
	ranking: Vec<usize>,
}

impl Slot {
	fn recompute(&mut self, settings: &RegistrySettings) {
		self.ranking = precedence::rank(&self.candidates, settings)
			.into_iter()
			.map(|(pos, _)| pos)
			.collect();
	}

	fn winner(&self) -> Option<&Candidate> {
		self.ranking.first().map(|&pos| &self.candidates[pos])
	}

	fn shadowed(&self) -> impl Iterator<Item = &Candidate> {
		self.ranking.iter().skip(1).map(|&pos| &self.candidates[pos])
	}
}

struct RegistryState {
	/// `domain -> key -> slot`, both levels in first-registration order.
	domains: FxIndexMap<String, FxIndexMap<String, Slot>>,
	next_sequence: u64,
	len: usize,
	settings: RegistrySettings,
}

impl RegistryState {
	fn slot(&self, domain: &str, key: &str) -> Option<&Slot> {
		self.domains.get(domain)?.get(key)
	}
}

/// Stores candidates and resolves one winner per `(domain, key)` slot.
///
/// Create one per composition root and pass it by reference; there is no global
/// instance. All operations are synchronous and bounded.
pub struct CandidateRegistry {
	state: ReentrantMutex<RefCell<RegistryState>>,
}

impl CandidateRegistry {
	pub fn new(settings: RegistrySettings) -> Self {
		Self {
			state: ReentrantMutex::new(RefCell::new(RegistryState {
				domains: FxIndexMap::default(),
				next_sequence: 1,
				len: 0,
				settings,
			})),
		}
	}

	/// Runs `f` with shared access to the state under the registry lock.
	fn read<R>(&self, f: impl FnOnce(&RegistryState) -> R) -> R {
		let guard = self.state.lock();
		let state = guard.borrow();
		f(&state)
	}

	/// Registers a validated candidate and returns the stored copy.
	///
	/// Any sequence on the incoming value is replaced with a freshly assigned one.
	pub fn register(&self, candidate: Candidate) -> Candidate {
		let guard = self.state.lock();
		let mut state = guard.borrow_mut();
		let RegistryState {
			domains,
			next_sequence,
			len,
			settings,
		} = &mut *state;

		let sequence = *next_sequence;
		*next_sequence += 1;
		*len += 1;

		let mut stored = candidate;
		stored.sequence = Some(sequence);
		let returned = stored.clone();

		let slot = domains
			.entry(stored.domain.clone())
			.or_default()
			.entry(stored.key.clone())
			.or_default();
		let previous = slot.winner().map(|c| c.provider.clone());
		slot.candidates.push(stored);
		slot.recompute(settings);

		tracing::debug!(
			domain = %returned.domain,
			key = %returned.key,
			provider = %returned.provider,
			sequence,
			"candidate registered"
		);
		log_winner_change(&returned.domain, &returned.key, previous, slot, settings);

		returned
	}

	/// Registers every candidate as one atomic batch, in iteration order.
	///
	/// The input is drained before the lock is taken, so the caller's iterator never runs
	/// under it. No reader observes a partially applied batch.
	pub fn register_many(&self, candidates: impl IntoIterator<Item = Candidate>) -> Vec<Candidate> {
		let candidates: Vec<Candidate> = candidates.into_iter().collect();
		let _batch = self.state.lock();
		candidates.into_iter().map(|c| self.register(c)).collect()
	}

	/// Returns the current winner for `domain`/`key`.
	pub fn resolve(&self, domain: &str, key: &str) -> Option<Candidate> {
		self.read(|state| state.slot(domain, key)?.winner().cloned())
	}

	/// Returns the candidate registered by `provider` for `domain`/`key`, bypassing ranking.
	///
	/// If the provider registered more than once, the best-ranked registration is returned.
	pub fn resolve_provider(&self, domain: &str, key: &str, provider: &str) -> Option<Candidate> {
		self.read(|state| {
			let slot = state.slot(domain, key)?;
			slot.ranking
				.iter()
				.map(|&pos| &slot.candidates[pos])
				.find(|c| c.provider == provider)
				.cloned()
		})
	}

	/// Returns the winner of every key under `domain`, in key first-registration order.
	pub fn list_active(&self, domain: &str) -> Vec<Candidate> {
		self.read(|state| {
			state
				.domains
				.get(domain)
				.map(|keys| keys.values().filter_map(|slot| slot.winner().cloned()).collect())
				.unwrap_or_default()
		})
	}

	/// Returns every non-winning candidate under `domain`.
	///
	/// Keys in first-registration order; within a key, in rank order.
	pub fn list_shadowed(&self, domain: &str) -> Vec<Candidate> {
		self.read(|state| {
			state
				.domains
				.get(domain)
				.map(|keys| keys.values().flat_map(Slot::shadowed).cloned().collect())
				.unwrap_or_default()
		})
	}

	/// Returns the full ranked breakdown for `domain`/`key`.
	///
	/// Recomputes the ranking from current state without mutating it. The selected entry is
	/// always the one [`Self::resolve`] returns.
	pub fn explain(&self, domain: &str, key: &str) -> ResolutionExplanation {
		self.read(|state| {
			let candidates = state
				.slot(domain, key)
				.map(|slot| slot.candidates.as_slice())
				.unwrap_or_default();
			ResolutionExplanation::build(domain, key, candidates, &state.settings)
		})
	}

	/// Returns all candidates for `domain`/`key` in registration order.
	pub fn candidates(&self, domain: &str, key: &str) -> Vec<Candidate> {
		self.read(|state| {
			state
				.slot(domain, key)
				.map(|slot| slot.candidates.clone())
				.unwrap_or_default()
		})
	}

	/// Returns registered domains in first-registration order.
	pub fn domains(&self) -> Vec<String> {
		self.read(|state| state.domains.keys().cloned().collect())
	}

	/// Total number of stored registrations.
	pub fn len(&self) -> usize {
		self.read(|state| state.len)
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns a copy of the current settings.
	pub fn settings(&self) -> RegistrySettings {
		self.read(|state| state.settings.clone())
	}

	/// Forces `provider` to win `domain`/`key` whenever it is registered there.
	pub fn set_selection(&self, domain: &str, key: &str, provider: &str) -> Result<(), CandidateError> {
		check_identifier("domain", domain)?;
		check_identifier("key", key)?;
		check_provider(provider)?;

		self.update_selection(domain, key, |settings| {
			settings.set_selection(domain, key, provider);
		});
		Ok(())
	}

	/// Removes the selection for `domain`/`key`, returning the provider it forced.
	pub fn clear_selection(&self, domain: &str, key: &str) -> Option<String> {
		let mut removed = None;
		self.update_selection(domain, key, |settings| {
			removed = settings.clear_selection(domain, key);
		});
		removed
	}

	fn update_selection(&self, domain: &str, key: &str, f: impl FnOnce(&mut RegistrySettings)) {
		let guard = self.state.lock();
		let mut state = guard.borrow_mut();
		let RegistryState {
			domains, settings, ..
		} = &mut *state;

		f(settings);
		if let Some(slot) = domains.get_mut(domain).and_then(|keys| keys.get_mut(key)) {
			let previous = slot.winner().map(|c| c.provider.clone());
			slot.recompute(settings);
			log_winner_change(domain, key, previous, slot, settings);
		}
	}
}

impl Default for CandidateRegistry {
	fn default() -> Self {
		Self::new(RegistrySettings::default())
	}
}

impl std::fmt::Debug for CandidateRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.read(|state| {
			f.debug_struct("CandidateRegistry")
				.field("domains", &state.domains.len())
				.field("len", &state.len)
				.field("next_sequence", &state.next_sequence)
				.finish()
		})
	}
}

fn log_winner_change(
	domain: &str,
	key: &str,
	previous: Option<String>,
	slot: &Slot,
	settings: &RegistrySettings,
) {
	if let Some(forced) = settings.selection(domain, key)
		&& !slot.candidates.iter().any(|c| c.provider == forced)
	{
		tracing::debug!(
			domain,
			key,
			forced,
			"selection override names an unregistered provider; ignored"
		);
	}

	let winner = slot.winner().map(|c| c.provider.as_str());
	if previous.as_deref() != winner {
		tracing::debug!(domain, key, ?previous, ?winner, "winner changed");
	}
}

#[cfg(test)]
mod tests;
