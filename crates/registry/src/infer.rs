//! Priority inference for candidates registered without an explicit priority.
//!
//! # Role
//!
//! Turns the `KEYSTONE_STACK_ORDER` environment hint and filesystem path markers into a
//! priority. Used only by [`crate::Resolver::register_from_pkg`].
//!
//! Order of evaluation:
//! 1. Package listed in the stack order: its explicit `:N`, else `10 * index`.
//! 2. Path contains a marker segment: marker base score minus depth below the marker.
//! 3. Otherwise 0.

use std::path::{Component, Path};

use crate::candidate::PRIORITY_BOUNDS;

/// Environment variable holding the stack order, e.g. `"core,vendor_x:50,app"`.
pub const STACK_ORDER_ENV: &str = "KEYSTONE_STACK_ORDER";

/// Recognized path segments and their base scores, highest first.
const PATH_MARKERS: &[(&str, i32)] = &[("vendor", 30), ("adapters", 20), ("services", 10)];

const INDEX_STEP: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
struct StackEntry {
	name: String,
	/// Zero-based position in the raw comma-separated list.
	index: usize,
	priority: Option<i32>,
}

/// Parsed stack order: package names with optional explicit priorities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StackOrder {
	entries: Vec<StackEntry>,
}

impl StackOrder {
	/// Parses a comma-separated list of `name` or `name:N` entries.
	///
	/// Positions count every comma-separated slot, blank ones included, so `"a,,b"` puts
	/// `b` at index 2. Blank and nameless entries are skipped. The `:N` suffix is only split
	/// off when it parses as an integer; otherwise the whole entry is the name. Out-of-range
	/// values are clamped.
	pub fn parse(raw: &str) -> Self {
		let mut entries = Vec::new();
		for (index, item) in raw.split(',').map(str::trim).enumerate() {
			if item.is_empty() {
				continue;
			}
			let (name, priority) = match split_explicit(item) {
				Some((name, priority)) => (name, Some(priority)),
				None => (item, None),
			};
			if name.is_empty() {
				tracing::warn!(entry = item, var = STACK_ORDER_ENV, "stack order entry has no name; skipped");
				continue;
			}
			entries.push(StackEntry {
				name: name.to_string(),
				index,
				priority,
			});
		}
		Self { entries }
	}

	/// Reads and parses [`STACK_ORDER_ENV`]. `None` when unset or not valid UTF-8.
	pub fn from_env() -> Option<Self> {
		std::env::var(STACK_ORDER_ENV).ok().map(|raw| Self::parse(&raw))
	}

	/// Priority for `name`: its explicit value, else `10 * index`.
	pub fn priority_for(&self, name: &str) -> Option<i32> {
		let entry = self.entries.iter().find(|e| e.name == name)?;
		Some(entry.priority.unwrap_or_else(|| {
			let index = i32::try_from(entry.index).unwrap_or(i32::MAX);
			clamp_priority(index.saturating_mul(INDEX_STEP))
		}))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}

/// Splits `name:N` when the tail is an integer, clamping it into the priority bounds.
fn split_explicit(item: &str) -> Option<(&str, i32)> {
	let (name, suffix) = item.rsplit_once(':')?;
	let value = suffix.trim().parse::<i64>().ok()?;
	let clamped = clamp_priority(value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32);
	if i64::from(clamped) != value {
		tracing::warn!(entry = item, value, clamped, "stack order priority clamped into bounds");
	}
	Some((name.trim(), clamped))
}

fn clamp_priority(value: i32) -> i32 {
	value.clamp(*PRIORITY_BOUNDS.start(), *PRIORITY_BOUNDS.end())
}

/// Infers a priority for `package_name` at `file_path`, reading [`STACK_ORDER_ENV`] once.
pub fn infer_priority(package_name: &str, file_path: &Path) -> i32 {
	infer_priority_with(StackOrder::from_env().as_ref(), package_name, file_path)
}

/// [`infer_priority`] with an explicit stack order instead of the environment.
pub fn infer_priority_with(order: Option<&StackOrder>, package_name: &str, file_path: &Path) -> i32 {
	if let Some(priority) = order.and_then(|o| o.priority_for(package_name)) {
		return priority;
	}
	marker_priority(file_path).unwrap_or(0)
}

fn marker_priority(path: &Path) -> Option<i32> {
	let segments: Vec<&std::ffi::OsStr> = path
		.components()
		.filter_map(|c| match c {
			Component::Normal(s) => Some(s),
			_ => None,
		})
		.collect();

	PATH_MARKERS.iter().find_map(|&(marker, base)| {
		let pos = segments.iter().position(|s| *s == marker)?;
		let depth = i32::try_from(segments.len() - pos - 1).unwrap_or(i32::MAX);
		Some(clamp_priority(base.saturating_sub(depth)))
	})
}
