//! Candidate registry and provider resolution.
//!
//! # Purpose
//!
//! Many independent code paths can offer competing implementations ("candidates") for the
//! same capability slot, identified by a `(domain, key)` pair such as `("adapter", "cache")`.
//! The registry stores every offer and deterministically resolves exactly one winner per
//! slot, with an auditable explanation of why it won.
//!
//! # Mental Model
//!
//! 1. **Construction:** [`Candidate::builder`] validates identifiers and bounds. Nothing
//!    invalid can reach the registry.
//! 2. **Registration:** [`CandidateRegistry::register`] assigns a registry-wide sequence
//!    number, stores an owned copy, and recomputes the winner for that slot.
//! 3. **Consumption:** [`CandidateRegistry::resolve`] returns the winner (or an exact
//!    provider match); [`CandidateRegistry::explain`] returns the full ranked breakdown.
//! 4. **Bulk registration:** [`Resolver::register_from_pkg`] infers priorities from
//!    `KEYSTONE_STACK_ORDER` and path markers, then registers through the single path.
//!
//! # Precedence Contract
//!
//! 1. **Selection override:** a configured `domain -> key -> provider` match wins outright.
//! 2. **Priority:** higher wins; missing priority ranks as the registry default.
//! 3. **Stack level:** higher wins; missing stack level ranks as 0.
//! 4. **Registration sequence:** higher (later) wins.
//!
//! - Enforced in: [`RankScore`]
//! - Tested by: `registry::tests::ranking_matches_tier_order`
//!
//! # Key Types
//!
//! | Type | Role |
//! |------|------|
//! | [`Candidate`] | One validated implementation offer for a slot. |
//! | [`CandidateRegistry`] | Lock-protected store; recomputes winners on mutation. |
//! | [`ResolutionExplanation`] | Ranked, reasoned breakdown of one slot. |
//! | [`Resolver`] | Facade adding package-level bulk registration. |
//! | [`RegistrySettings`] | Selection overrides and default priority. |
//!
//! # Concurrency
//!
//! All state sits behind one reentrant mutex. Writes are linearized through it and every
//! read observes the state left by the last completed write. Factories and health probes
//! are stored, never invoked, so the lock is never held across caller code.

mod candidate;
mod error;
mod explain;
mod ident;
mod infer;
mod metadata;
mod precedence;
mod registry;
mod resolver;
mod settings;

pub use candidate::{
	Candidate, CandidateBuilder, CandidateSource, Factory, HealthProbe, InlineFactory,
	PRIORITY_BOUNDS, STACK_LEVEL_BOUNDS,
};
pub use error::{CandidateError, IdentifierIssue};
pub use explain::{ExplanationReport, RankedCandidate, ReportEntry, ResolutionExplanation};
pub use ident::{check_bounds, check_identifier};
pub use infer::{STACK_ORDER_ENV, StackOrder, infer_priority, infer_priority_with};
pub use metadata::{Metadata, MetadataValue};
pub use precedence::RankScore;
pub use registry::CandidateRegistry;
pub use resolver::Resolver;
pub use settings::RegistrySettings;
