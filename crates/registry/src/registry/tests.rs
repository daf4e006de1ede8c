use std::collections::HashSet;
use std::sync::{Arc, mpsc};
use std::time::Duration;

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::*;
use crate::candidate::{CandidateBuilder, Factory};
use crate::metadata::MetadataValue;

fn cand(domain: &str, key: &str, provider: &str) -> CandidateBuilder {
	Candidate::builder(domain, key, provider, Factory::deferred(format!("{domain}::{key}::{provider}")))
}

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn providers(candidates: &[Candidate]) -> Vec<&str> {
	candidates.iter().map(Candidate::provider).collect()
}

#[test]
fn empty_registry_resolves_nothing() {
	let registry = CandidateRegistry::default();
	assert!(registry.is_empty());
	assert!(registry.resolve("adapter", "cache").is_none());
	assert!(registry.resolve_provider("adapter", "cache", "redis").is_none());
	assert!(registry.list_active("adapter").is_empty());
	assert!(registry.list_shadowed("adapter").is_empty());
	let explanation = registry.explain("adapter", "cache");
	assert!(explanation.is_empty());
	assert!(explanation.winner().is_none());
}

#[test]
fn single_candidate_always_wins() {
	let registry = CandidateRegistry::default();
	registry.register(cand("adapter", "cache", "memory").priority(-500).build().unwrap());

	assert_eq!(registry.resolve("adapter", "cache").unwrap().provider(), "memory");
	assert!(registry.list_shadowed("adapter").is_empty());
}

#[test]
fn higher_priority_wins_and_loser_is_shadowed() {
	let registry = CandidateRegistry::default();
	registry.register(cand("adapter", "cache", "redis").priority(5).build().unwrap());
	registry.register(cand("adapter", "cache", "memcached").priority(10).build().unwrap());

	assert_eq!(registry.resolve("adapter", "cache").unwrap().provider(), "memcached");
	assert_eq!(providers(&registry.list_shadowed("adapter")), vec!["redis"]);
}

#[test]
fn selection_override_beats_priority() {
	let registry = CandidateRegistry::new(RegistrySettings::new().with_selection("adapter", "cache", "a"));
	registry.register(cand("adapter", "cache", "a").priority(1).build().unwrap());
	registry.register(cand("adapter", "cache", "b").priority(100).build().unwrap());

	assert_eq!(registry.resolve("adapter", "cache").unwrap().provider(), "a");
	assert_eq!(providers(&registry.list_shadowed("adapter")), vec!["b"]);
}

#[test]
fn override_for_missing_provider_is_ignored() {
	let registry = CandidateRegistry::new(RegistrySettings::new().with_selection("adapter", "cache", "ghost"));
	registry.register(cand("adapter", "cache", "a").priority(1).build().unwrap());
	registry.register(cand("adapter", "cache", "b").priority(100).build().unwrap());

	assert_eq!(registry.resolve("adapter", "cache").unwrap().provider(), "b");
}

#[test]
fn stack_level_breaks_priority_ties() {
	let registry = CandidateRegistry::default();
	registry.register(cand("service", "status", "high").stack_level(3).build().unwrap());
	registry.register(cand("service", "status", "low").stack_level(1).build().unwrap());

	assert_eq!(registry.resolve("service", "status").unwrap().provider(), "high");
}

#[test]
fn last_registered_wins_full_ties() {
	let registry = CandidateRegistry::default();
	registry.register(cand("service", "status", "first").priority(2).stack_level(1).build().unwrap());
	registry.register(cand("service", "status", "second").priority(2).stack_level(1).build().unwrap());

	assert_eq!(registry.resolve("service", "status").unwrap().provider(), "second");
}

#[test]
fn missing_priority_ranks_as_registry_default() {
	let registry = CandidateRegistry::new(RegistrySettings::new().with_default_priority(50));
	registry.register(cand("adapter", "queue", "explicit").priority(40).build().unwrap());
	registry.register(cand("adapter", "queue", "implicit").build().unwrap());
	assert_eq!(registry.resolve("adapter", "queue").unwrap().provider(), "implicit");

	let registry = CandidateRegistry::default();
	registry.register(cand("adapter", "queue", "implicit").build().unwrap());
	registry.register(cand("adapter", "queue", "negative").priority(-1).build().unwrap());
	assert_eq!(registry.resolve("adapter", "queue").unwrap().provider(), "implicit");
}

#[test]
fn missing_stack_level_ranks_as_zero() {
	let registry = CandidateRegistry::default();
	registry.register(cand("adapter", "queue", "unset").build().unwrap());
	registry.register(cand("adapter", "queue", "below").stack_level(-1).build().unwrap());
	assert_eq!(registry.resolve("adapter", "queue").unwrap().provider(), "unset");
}

#[test]
fn resolve_provider_bypasses_ranking() {
	let registry = CandidateRegistry::default();
	registry.register(cand("adapter", "cache", "redis").priority(5).build().unwrap());
	registry.register(cand("adapter", "cache", "memcached").priority(10).build().unwrap());

	let redis = registry.resolve_provider("adapter", "cache", "redis").unwrap();
	assert_eq!(redis.priority(), Some(5));
	assert!(registry.resolve_provider("adapter", "cache", "nope").is_none());
	assert!(registry.resolve_provider("adapter", "storage", "redis").is_none());
}

#[test]
fn resolve_provider_prefers_best_ranked_duplicate() {
	let registry = CandidateRegistry::default();
	registry.register(cand("adapter", "cache", "redis").priority(9).build().unwrap());
	registry.register(cand("adapter", "cache", "redis").priority(1).build().unwrap());

	assert_eq!(
		registry.resolve_provider("adapter", "cache", "redis").unwrap().priority(),
		Some(9)
	);
	assert_eq!(registry.list_shadowed("adapter").len(), 1);
}

#[test]
fn listings_follow_key_registration_order() {
	let registry = CandidateRegistry::default();
	registry.register(cand("adapter", "storage", "s3").build().unwrap());
	registry.register(cand("adapter", "cache", "redis").priority(1).build().unwrap());
	registry.register(cand("adapter", "cache", "memory").priority(2).build().unwrap());
	registry.register(cand("adapter", "cache", "disk").priority(0).build().unwrap());
	registry.register(cand("service", "status", "builtin").build().unwrap());

	assert_eq!(providers(&registry.list_active("adapter")), vec!["s3", "memory"]);
	assert_eq!(providers(&registry.list_shadowed("adapter")), vec!["redis", "disk"]);
	assert_eq!(providers(&registry.list_active("service")), vec!["builtin"]);
	assert_eq!(providers(&registry.candidates("adapter", "cache")), vec!["redis", "memory", "disk"]);
	assert_eq!(registry.domains(), vec!["adapter".to_string(), "service".to_string()]);
	assert_eq!(registry.len(), 5);
	assert!(registry.list_active("workflow").is_empty());
}

#[test]
fn sequences_are_assigned_and_increasing() {
	let registry = CandidateRegistry::default();
	let a = registry.register(cand("adapter", "cache", "a").build().unwrap());
	let b = registry.register(cand("service", "status", "b").build().unwrap());
	let c = registry.register(cand("adapter", "cache", "c").build().unwrap());

	let seqs: Vec<u64> = [&a, &b, &c].iter().map(|x| x.sequence().unwrap()).collect();
	assert!(seqs.windows(2).all(|w| w[0] < w[1]), "{seqs:?}");
}

#[test]
fn reregistering_a_returned_copy_gets_a_fresh_sequence() {
	let registry = CandidateRegistry::default();
	let stored = registry.register(cand("adapter", "cache", "a").build().unwrap());
	let again = registry.register(stored.clone());
	assert!(again.sequence() > stored.sequence());
	assert_eq!(registry.len(), 2);
}

#[test]
fn stored_candidate_is_isolated_from_caller() {
	let registry = CandidateRegistry::default();
	let mut original = cand("adapter", "cache", "redis").metadata("tier", "primary").build().unwrap();
	let mut returned = registry.register(original.clone());

	original.metadata_mut().insert("tier".into(), MetadataValue::from("mutated"));
	returned.metadata_mut().insert("extra".into(), MetadataValue::from(true));

	let resolved = registry.resolve("adapter", "cache").unwrap();
	assert_eq!(resolved.metadata().len(), 1);
	assert_eq!(resolved.metadata()["tier"].as_str(), Some("primary"));
}

#[test]
fn example_scenario_with_runtime_selection() {
	init_tracing();
	let registry = CandidateRegistry::default();
	registry.register(cand("adapter", "cache", "redis").priority(5).build().unwrap());
	registry.register(cand("adapter", "cache", "memcached").priority(10).build().unwrap());

	assert_eq!(registry.resolve("adapter", "cache").unwrap().provider(), "memcached");
	assert_eq!(providers(&registry.list_shadowed("adapter")), vec!["redis"]);

	registry.set_selection("adapter", "cache", "redis").unwrap();
	assert_eq!(registry.resolve("adapter", "cache").unwrap().provider(), "redis");
	assert_eq!(providers(&registry.list_shadowed("adapter")), vec!["memcached"]);
	assert_eq!(registry.settings().selection("adapter", "cache"), Some("redis"));

	assert_eq!(registry.clear_selection("adapter", "cache").as_deref(), Some("redis"));
	assert_eq!(registry.resolve("adapter", "cache").unwrap().provider(), "memcached");
	assert!(registry.settings().selections.is_empty());
}

#[test]
fn selection_set_before_registration_applies_later() {
	let registry = CandidateRegistry::default();
	registry.set_selection("adapter", "cache", "redis").unwrap();
	registry.register(cand("adapter", "cache", "redis").priority(1).build().unwrap());
	registry.register(cand("adapter", "cache", "memory").priority(99).build().unwrap());
	assert_eq!(registry.resolve("adapter", "cache").unwrap().provider(), "redis");
}

#[test]
fn set_selection_validates_identifiers() {
	let registry = CandidateRegistry::default();
	let err = registry.set_selection("adapter", "../cache", "redis").unwrap_err();
	assert_eq!(err.field(), "key");
	assert!(registry.settings().selections.is_empty());
}

#[test]
fn resolve_matches_explain() {
	let registry = CandidateRegistry::new(RegistrySettings::new().with_default_priority(3));
	registry.register(cand("event", "dispatch", "a").priority(3).stack_level(2).build().unwrap());
	registry.register(cand("event", "dispatch", "b").build().unwrap());
	registry.register(cand("event", "dispatch", "c").priority(3).stack_level(2).build().unwrap());

	let explanation = registry.explain("event", "dispatch");
	let winner = explanation.winner().unwrap();
	assert_eq!(winner.provider(), registry.resolve("event", "dispatch").unwrap().provider());
	assert_eq!(winner.provider(), "c");
	assert_eq!(explanation.ordered.iter().filter(|e| e.selected).count(), 1);

	let again = registry.explain("event", "dispatch");
	assert_eq!(explanation.report(), again.report());
}

#[test]
fn register_many_is_ordered_and_reentrant() {
	let registry = CandidateRegistry::default();
	let stored = registry.register_many([
		cand("task", "sync", "one").build().unwrap(),
		cand("task", "sync", "two").build().unwrap(),
	]);
	assert_eq!(providers(&stored), vec!["one", "two"]);
	assert!(stored[0].sequence() < stored[1].sequence());
	assert_eq!(registry.resolve("task", "sync").unwrap().provider(), "two");
}

#[test]
fn register_many_drains_input_before_locking() {
	let registry = Arc::new(CandidateRegistry::default());
	registry.register(cand("adapter", "cache", "seed").priority(1).build().unwrap());

	let mut seen_by_readers = Vec::new();
	let batch = ["a", "b"].into_iter().map(|provider| {
		let (tx, rx) = mpsc::channel();
		let reader = Arc::clone(&registry);
		std::thread::spawn(move || {
			let _ = tx.send(reader.resolve("adapter", "cache").map(|c| c.provider().to_string()));
		});
		seen_by_readers.push(rx.recv_timeout(Duration::from_secs(5)).ok());
		cand("adapter", "cache", provider).build().unwrap()
	});
	let stored = registry.register_many(batch);

	assert_eq!(seen_by_readers, vec![Some(Some("seed".to_string())); 2]);
	assert_eq!(providers(&stored), vec!["a", "b"]);
	assert_eq!(registry.resolve("adapter", "cache").unwrap().provider(), "seed");
}

#[test]
fn concurrent_registration_assigns_unique_sequences() {
	const THREADS: usize = 8;
	const PER_THREAD: usize = 64;
	init_tracing();

	let registry = CandidateRegistry::default();
	let sequences: Vec<u64> = std::thread::scope(|scope| {
		let handles: Vec<_> = (0..THREADS)
			.map(|t| {
				let registry = &registry;
				scope.spawn(move || {
					(0..PER_THREAD)
						.map(|m| {
							let c = cand(&format!("d{t}"), &format!("k{m}"), "p").build().unwrap();
							registry.register(c).sequence().unwrap()
						})
						.collect::<Vec<_>>()
				})
			})
			.collect();
		handles
			.into_iter()
			.flat_map(|h| h.join().unwrap())
			.collect()
	});

	let unique: HashSet<u64> = sequences.iter().copied().collect();
	assert_eq!(unique.len(), THREADS * PER_THREAD);
	assert_eq!(registry.len(), THREADS * PER_THREAD);
	assert_eq!(unique.iter().max().copied(), Some((THREADS * PER_THREAD) as u64));
	for t in 0..THREADS {
		assert_eq!(registry.list_active(&format!("d{t}")).len(), PER_THREAD);
	}
}

#[test]
fn concurrent_readers_see_consistent_winner() {
	let registry = CandidateRegistry::default();
	for i in 0..32 {
		registry.register(cand("adapter", "cache", &format!("p{i}")).priority(i % 4).build().unwrap());
	}
	let expected = registry.explain("adapter", "cache").report();

	std::thread::scope(|scope| {
		for _ in 0..4 {
			scope.spawn(|| {
				for _ in 0..16 {
					assert_eq!(registry.explain("adapter", "cache").report(), expected);
					assert_eq!(
						registry.resolve("adapter", "cache").unwrap().provider(),
						expected.winner.as_deref().unwrap()
					);
				}
			});
		}
	});
}

fn arb_slot() -> impl Strategy<Value = (Vec<(Option<i32>, Option<i32>)>, Option<usize>, i32)> {
	(
		prop::collection::vec((prop::option::of(-3..3i32), prop::option::of(-2..2i32)), 1..12),
		prop::option::of(0..16usize),
		-2..2i32,
	)
}

proptest! {
	#[test]
	fn ranking_matches_tier_order((inputs, forced, default_priority) in arb_slot()) {
		let mut settings = RegistrySettings::new().with_default_priority(default_priority);
		if let Some(i) = forced {
			settings.set_selection("adapter", "cache", format!("p{i}"));
		}
		let registry = CandidateRegistry::new(settings);

		let mut stored = Vec::new();
		for (i, (priority, stack)) in inputs.iter().enumerate() {
			let mut b = cand("adapter", "cache", &format!("p{i}"));
			if let Some(p) = priority {
				b = b.priority(*p);
			}
			if let Some(s) = stack {
				b = b.stack_level(*s);
			}
			stored.push(registry.register(b.build().unwrap()));
		}

		let expected = stored
			.iter()
			.max_by_key(|c| {
				(
					forced.is_some_and(|i| c.provider() == format!("p{i}")),
					c.priority().unwrap_or(default_priority),
					c.stack_level().unwrap_or(0),
					c.sequence().unwrap(),
				)
			})
			.unwrap();
		let winner = registry.resolve("adapter", "cache").unwrap();
		prop_assert_eq!(winner.provider(), expected.provider());

		let explanation = registry.explain("adapter", "cache");
		prop_assert_eq!(explanation.ordered.len(), inputs.len());
		prop_assert!(explanation.ordered.windows(2).all(|w| w[0].score > w[1].score));
		prop_assert_eq!(registry.list_shadowed("adapter").len(), inputs.len() - 1);
	}
}
