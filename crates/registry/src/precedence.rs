//! Rank scores and the precedence rules used to order a slot's candidates.
//!
//! # Role
//!
//! A [`RankScore`] captures every input that decides a candidate's position. Its derived
//! ordering is the total order: greater scores rank first.

use serde::Serialize;

use crate::candidate::Candidate;
use crate::settings::RegistrySettings;

/// Resolved ranking inputs for one candidate.
///
/// Field order is tier order, so the derived [`Ord`] compares:
/// 1. Selection override match (`true` wins)
/// 2. Priority (higher wins)
/// 3. Stack level (higher wins)
/// 4. Registration sequence (higher/later wins)
///
/// Sequences are registry-unique, so two scores from one registry never compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RankScore {
	pub override_match: bool,
	pub priority: i32,
	pub stack_level: i32,
	pub sequence: u64,
}

impl RankScore {
	/// Scores a stored candidate under `settings`.
	pub fn of(candidate: &Candidate, settings: &RegistrySettings) -> Self {
		let override_match = settings
			.selection(&candidate.domain, &candidate.key)
			.is_some_and(|forced| forced == candidate.provider);
		Self {
			override_match,
			priority: candidate.priority.unwrap_or(settings.default_priority),
			stack_level: candidate.stack_level.unwrap_or(0),
			sequence: candidate.sequence.unwrap_or(0),
		}
	}
}

/// Orders `candidates` by descending score, returning positions into the slice.
///
/// Winner first. The result depends only on the candidates' fields, never on iteration
/// order of any hashed container.
pub(crate) fn rank(candidates: &[Candidate], settings: &RegistrySettings) -> Vec<(usize, RankScore)> {
	let mut scored: Vec<(usize, RankScore)> = candidates
		.iter()
		.enumerate()
		.map(|(i, c)| (i, RankScore::of(c, settings)))
		.collect();
	scored.sort_unstable_by(|a, b| b.1.cmp(&a.1));
	scored
}
