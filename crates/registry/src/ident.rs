//! Validation boundary for candidate fields.
//!
//! # Role
//!
//! Every identifier and bounded integer passes through here before a [`crate::Candidate`]
//! exists. The registry trusts its input and never re-validates.

use std::ops::RangeInclusive;

use crate::error::{CandidateError, IdentifierIssue};

const IDENT_PATTERN: &str = "[A-Za-z0-9._-]+, no '..', no leading '/'";
const PROVIDER_PATTERN: &str = "non-empty, no whitespace or control characters";

/// Checks that `value` is a safe identifier for `field` (domain or key).
///
/// Accepts ASCII alphanumerics, `-`, `_` and `.`. Rejects empty strings, path-traversal
/// sequences, leading slashes and backslashes with a specific [`IdentifierIssue`].
pub fn check_identifier(field: &'static str, value: &str) -> Result<(), CandidateError> {
	identifier_issue(value).map_or(Ok(()), |issue| {
		Err(CandidateError::InvalidIdentifier {
			field,
			value: value.to_string(),
			issue,
			allowed: IDENT_PATTERN,
		})
	})
}

fn identifier_issue(value: &str) -> Option<IdentifierIssue> {
	if value.is_empty() {
		return Some(IdentifierIssue::Empty);
	}
	if value.starts_with('/') {
		return Some(IdentifierIssue::LeadingSlash);
	}
	if value.contains('\\') {
		return Some(IdentifierIssue::Backslash);
	}
	if value.contains("..") {
		return Some(IdentifierIssue::PathTraversal);
	}
	value
		.chars()
		.find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
		.map(IdentifierIssue::DisallowedChar)
}

/// Checks a provider name: non-empty, without whitespace or control characters.
pub(crate) fn check_provider(value: &str) -> Result<(), CandidateError> {
	let issue = if value.is_empty() {
		Some(IdentifierIssue::Empty)
	} else {
		value
			.chars()
			.find(|c| c.is_whitespace() || c.is_control())
			.map(IdentifierIssue::DisallowedChar)
	};
	issue.map_or(Ok(()), |issue| {
		Err(CandidateError::InvalidIdentifier {
			field: "provider",
			value: value.to_string(),
			issue,
			allowed: PROVIDER_PATTERN,
		})
	})
}

/// Checks that `value` lies within `bounds`, returning it narrowed to `i32`.
pub fn check_bounds(
	field: &'static str,
	value: i64,
	bounds: RangeInclusive<i32>,
) -> Result<i32, CandidateError> {
	let (min, max) = (*bounds.start(), *bounds.end());
	if value < i64::from(min) || value > i64::from(max) {
		return Err(CandidateError::OutOfBounds {
			field,
			value,
			min,
			max,
		});
	}
	// In range, so the narrowing cannot truncate.
	Ok(value as i32)
}
