//! Ranked, reasoned breakdown of one slot's resolution.
//!
//! # Role
//!
//! [`ResolutionExplanation`] is derived on demand from registry state and never stored.
//! [`ExplanationReport`] is its serializable form for printing or transport; this is the
//! only place resolution results are formatted.

use serde::Serialize;

use crate::candidate::Candidate;
use crate::precedence::{self, RankScore};
use crate::settings::RegistrySettings;

/// One candidate's position in an explanation.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
	pub candidate: Candidate,
	pub score: RankScore,
	pub selected: bool,
	pub reasons: Vec<String>,
}

/// Full ranked order for one `(domain, key)` slot, winner first.
#[derive(Debug, Clone)]
pub struct ResolutionExplanation {
	pub domain: String,
	pub key: String,
	pub ordered: Vec<RankedCandidate>,
}

impl ResolutionExplanation {
	pub(crate) fn build(
		domain: &str,
		key: &str,
		candidates: &[Candidate],
		settings: &RegistrySettings,
	) -> Self {
		let ranked = precedence::rank(candidates, settings);
		let forced = settings.selection(domain, key);
		let winner = ranked.first().map(|&(pos, score)| (&candidates[pos], score));
		let total = ranked.len();

		let ordered = ranked
			.iter()
			.enumerate()
			.map(|(place, &(pos, score))| {
				let candidate = &candidates[pos];
				let mut reasons = input_reasons(candidate, score, domain, key);
				match winner {
					Some((top, top_score)) if place > 0 => {
						reasons.push(format!(
							"shadowed by {} (decided by {})",
							top.provider,
							deciding_tier(&top_score, &score)
						));
					}
					_ => {
						reasons.push(format!("selected: ranked first of {total}"));
						if let Some(forced) = forced
							&& !score.override_match
						{
							reasons.push(format!(
								"selection override {domain}.{key}={forced} ignored: provider not registered"
							));
						}
					}
				}
				RankedCandidate {
					candidate: candidate.clone(),
					score,
					selected: place == 0,
					reasons,
				}
			})
			.collect();

		Self {
			domain: domain.to_string(),
			key: key.to_string(),
			ordered,
		}
	}

	/// The selected candidate, if the slot has any registrations.
	pub fn winner(&self) -> Option<&Candidate> {
		self.ordered
			.iter()
			.find(|entry| entry.selected)
			.map(|entry| &entry.candidate)
	}

	pub fn is_empty(&self) -> bool {
		self.ordered.is_empty()
	}

	/// Serializable view of this explanation.
	pub fn report(&self) -> ExplanationReport {
		ExplanationReport {
			domain: self.domain.clone(),
			key: self.key.clone(),
			candidates: self
				.ordered
				.iter()
				.map(|entry| ReportEntry {
					provider: entry.candidate.provider.clone(),
					priority: entry.score.priority,
					stack_level: entry.score.stack_level,
					sequence: entry.score.sequence,
					source: entry.candidate.source.to_string(),
					selected: entry.selected,
					reasons: entry.reasons.clone(),
				})
				.collect(),
			winner: self.winner().map(|c| c.provider.clone()),
		}
	}

	/// Pretty-printed JSON of [`Self::report`].
	pub fn to_json_pretty(&self) -> serde_json::Result<String> {
		serde_json::to_string_pretty(&self.report())
	}
}

fn input_reasons(candidate: &Candidate, score: RankScore, domain: &str, key: &str) -> Vec<String> {
	let mut reasons = Vec::with_capacity(5);
	if score.override_match {
		reasons.push(format!(
			"matched selection override {domain}.{key}={}",
			candidate.provider
		));
	}
	reasons.push(match candidate.priority {
		Some(_) => format!("priority {}", score.priority),
		None => format!("priority {} (registry default)", score.priority),
	});
	reasons.push(match candidate.stack_level {
		Some(_) => format!("stack level {}", score.stack_level),
		None => format!("stack level {} (unset)", score.stack_level),
	});
	reasons.push(format!("registration sequence {}", score.sequence));
	reasons
}

/// Names the first tier on which `winner` outranks `loser`.
fn deciding_tier(winner: &RankScore, loser: &RankScore) -> &'static str {
	if winner.override_match != loser.override_match {
		"selection override"
	} else if winner.priority != loser.priority {
		"priority"
	} else if winner.stack_level != loser.stack_level {
		"stack level"
	} else {
		"registration order"
	}
}

/// Serializable explanation: `{domain, key, candidates: [...], winner}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplanationReport {
	pub domain: String,
	pub key: String,
	pub candidates: Vec<ReportEntry>,
	pub winner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
	pub provider: String,
	pub priority: i32,
	pub stack_level: i32,
	pub sequence: u64,
	pub source: String,
	pub selected: bool,
	pub reasons: Vec<String>,
}

impl std::fmt::Display for ExplanationReport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.winner {
			Some(winner) => writeln!(f, "{}.{} -> {winner}", self.domain, self.key)?,
			None => return writeln!(f, "{}.{} -> (unregistered)", self.domain, self.key),
		}
		for entry in &self.candidates {
			let mark = if entry.selected { '*' } else { ' ' };
			writeln!(
				f,
				"{mark} {:<20} priority={:<5} stack={:<4} seq={:<6} source={}",
				entry.provider, entry.priority, entry.stack_level, entry.sequence, entry.source
			)?;
			for reason in &entry.reasons {
				writeln!(f, "      - {reason}")?;
			}
		}
		Ok(())
	}
}
